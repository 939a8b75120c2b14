//! Protocol-facing info responder.
//!
//! Maps info flow outcomes onto catalogued result codes. Wire encoding of the
//! response belongs to the session layer.

use crate::flow::{FlowCapability, FlowError, InfoFlow};
use crate::handle::OpaqueHandle;
use crate::model::resource::ResourcePayload;
use crate::resolver::{ResolutionContext, ResourceResolver};
use crate::store::RevisionStore;
use chrono::{DateTime, Utc};

/// Result codes an info query can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    ObjectDoesNotExist,
    CommandFailed,
}

impl ResultCode {
    pub fn code(self) -> u16 {
        match self {
            Self::Success => 1000,
            Self::ObjectDoesNotExist => 2303,
            Self::CommandFailed => 2400,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Success => "Command completed successfully",
            Self::ObjectDoesNotExist => "Object does not exist",
            Self::CommandFailed => "Command failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResponse {
    Success {
        handle: OpaqueHandle,
        rendered: String,
        payload: ResourcePayload,
    },
    Failure {
        code: ResultCode,
        message: String,
    },
}

impl QueryResponse {
    pub fn result_code(&self) -> ResultCode {
        match self {
            Self::Success { .. } => ResultCode::Success,
            Self::Failure { code, .. } => *code,
        }
    }
}

/// Answers one protocol info command as of the session's `now`.
pub fn respond_to_info<C, S: RevisionStore + ?Sized>(
    capability: &FlowCapability<C>,
    resolver: ResourceResolver<'_, S>,
    command: &C,
    now: DateTime<Utc>,
) -> QueryResponse {
    let context = ResolutionContext::at(now);
    match InfoFlow::new(capability, resolver, now).run(command, &context) {
        Ok(response) => QueryResponse::Success {
            handle: response.handle,
            rendered: response.rendered,
            payload: response.payload,
        },
        Err(FlowError::ResourceDoesNotExist { kind, unique_id }) => QueryResponse::Failure {
            code: ResultCode::ObjectDoesNotExist,
            message: format!("The {kind} with given ID ({unique_id}) doesn't exist."),
        },
        Err(err) => QueryResponse::Failure {
            code: ResultCode::CommandFailed,
            message: err.to_string(),
        },
    }
}
