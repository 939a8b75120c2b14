//! Generic read-only info flow.
//!
//! # Responsibility
//! - Answer "show me object X" for any object kind through one flow type,
//!   configured by a per-kind `FlowCapability`.
//! - Turn resolver outcomes into a success response or a catalogued failure.
//!
//! # Invariants
//! - A flow is single-shot: `run` consumes it and keeps no state.
//! - `as_of` earlier than the flow's `now` is rejected before any store
//!   access.
//! - Absence is reported as `FlowError::ResourceDoesNotExist`, never as a
//!   store fault.

use crate::handle::{encode, OpaqueHandle};
use crate::model::object::{ObjectKey, ObjectKind};
use crate::model::resource::ResourcePayload;
use crate::resolver::{ResolutionContext, ResourceResolver};
use crate::store::{RevisionStore, StoreError};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

pub mod commands;

pub use commands::{
    resource_query_capability, ContactInfoCommand, DomainInfoCommand, HostInfoCommand,
    ResourceQuery, CONTACT_INFO, DOMAIN_INFO, HOST_INFO,
};

pub type FlowResult<T> = Result<T, FlowError>;

/// Failures of one info flow invocation.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The requested instant lies before the invocation instant.
    #[error("read timestamp {as_of} may not be in the past (now {now})")]
    InvalidTimestamp {
        as_of: DateTime<Utc>,
        now: DateTime<Utc>,
    },
    /// No live revision exists at the requested instant.
    #[error("{kind} '{unique_id}' does not exist or is deleted")]
    ResourceDoesNotExist { kind: ObjectKind, unique_id: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-kind configuration of the info flow, bound once per instantiation.
pub struct FlowCapability<C> {
    pub kind: ObjectKind,
    /// Pulls the object's unique id out of the query command.
    pub extract_id: fn(&C) -> &str,
    /// Renders the resolved payload into its projection.
    pub render: fn(&ResourcePayload) -> String,
}

impl<C> Clone for FlowCapability<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for FlowCapability<C> {}

/// Successful info flow outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoResponse {
    pub key: ObjectKey,
    pub handle: OpaqueHandle,
    pub payload: ResourcePayload,
    /// Projection produced by the capability's renderer.
    pub rendered: String,
}

/// One info query invocation.
pub struct InfoFlow<'c, 's, C, S: RevisionStore + ?Sized> {
    capability: &'c FlowCapability<C>,
    resolver: ResourceResolver<'s, S>,
    now: DateTime<Utc>,
    flow_id: Uuid,
}

impl<'c, 's, C, S: RevisionStore + ?Sized> InfoFlow<'c, 's, C, S> {
    /// Creates a flow invoked at `now`.
    pub fn new(
        capability: &'c FlowCapability<C>,
        resolver: ResourceResolver<'s, S>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            capability,
            resolver,
            now,
            flow_id: Uuid::new_v4(),
        }
    }

    /// Runs the query and consumes the flow.
    ///
    /// # Errors
    /// - `InvalidTimestamp` when `context.as_of` precedes the flow's `now`.
    /// - `ResourceDoesNotExist` when nothing live exists at `context.as_of`.
    /// - `Store` when the revision history cannot be read.
    pub fn run(self, command: &C, context: &ResolutionContext) -> FlowResult<InfoResponse> {
        let started_at = Instant::now();
        let kind = self.capability.kind;

        if context.as_of < self.now {
            warn!(
                "event=info_flow module=flow status=invalid_timestamp flow_id={} kind={} as_of={} now={}",
                self.flow_id,
                kind,
                context.as_of.to_rfc3339(),
                self.now.to_rfc3339()
            );
            return Err(FlowError::InvalidTimestamp {
                as_of: context.as_of,
                now: self.now,
            });
        }

        let key = ObjectKey::new(kind, (self.capability.extract_id)(command));
        let resolution = match self.resolver.resolve(&key, context.as_of) {
            Ok(resolution) => resolution,
            Err(err) => {
                warn!(
                    "event=info_flow module=flow status=error flow_id={} kind={} unique_id={} duration_ms={} error={}",
                    self.flow_id,
                    kind,
                    key.unique_id,
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        match resolution.into_payload() {
            Some(payload) => {
                info!(
                    "event=info_flow module=flow status=ok flow_id={} kind={} unique_id={} duration_ms={}",
                    self.flow_id,
                    kind,
                    key.unique_id,
                    started_at.elapsed().as_millis()
                );
                let rendered = (self.capability.render)(&payload);
                Ok(InfoResponse {
                    handle: encode(&key),
                    key,
                    payload,
                    rendered,
                })
            }
            None => {
                info!(
                    "event=info_flow module=flow status=not_found flow_id={} kind={} unique_id={} duration_ms={}",
                    self.flow_id,
                    kind,
                    key.unique_id,
                    started_at.elapsed().as_millis()
                );
                Err(FlowError::ResourceDoesNotExist {
                    kind,
                    unique_id: key.unique_id,
                })
            }
        }
    }
}
