//! Administrative lookup commands.
//!
//! # Responsibility
//! - Show registry objects by unique id or by previously emitted handle.
//! - Produce the exact text operators and scripts rely on.
//!
//! # Invariants
//! - Lookups go through the same `InfoFlow` as protocol queries.
//! - A read timestamp before `now` is rejected before any store access.
//! - Malformed handles are rejected before any store access.
//! - Absent objects are a normal output line, not an error.

use crate::flow::{resource_query_capability, FlowError, InfoFlow, ResourceQuery};
use crate::handle::{decode, HandleError};
use crate::model::object::{ObjectKey, ObjectKind};
use crate::render;
use crate::resolver::{ResolutionContext, ResourceResolver};
use crate::store::RevisionStore;
use chrono::{DateTime, Utc};
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Handle(#[from] HandleError),
}

pub type LookupResult<T> = Result<T, LookupError>;

/// Shows objects of one kind by unique id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupCommand {
    pub kind: ObjectKind,
    pub unique_ids: Vec<String>,
    /// Instant to read at; `None` reads at the invocation instant.
    pub read_timestamp: Option<DateTime<Utc>>,
    /// Inline referenced objects instead of showing their ids.
    pub expand: bool,
}

/// Shows objects addressed by opaque handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleLookupCommand {
    pub handles: Vec<String>,
    pub read_timestamp: Option<DateTime<Utc>>,
    pub expand: bool,
}

/// Runs `command` as of `now` and returns the text to print verbatim.
///
/// # Errors
/// - `FlowError::InvalidTimestamp` when `read_timestamp` precedes `now`.
/// - `FlowError::Store` when a revision history cannot be read.
pub fn lookup<S: RevisionStore + ?Sized>(
    store: &S,
    command: &LookupCommand,
    now: DateTime<Utc>,
) -> LookupResult<String> {
    let context = read_context(command.read_timestamp, now)?;
    let keys: Vec<ObjectKey> = command
        .unique_ids
        .iter()
        .map(|unique_id| ObjectKey::new(command.kind, unique_id.as_str()))
        .collect();
    describe_all(store, &keys, &context, command.expand, now)
}

/// Decodes every handle, then runs like [`lookup`].
///
/// # Errors
/// - `HandleError::Malformed` for the first handle that does not decode.
/// - Same flow errors as [`lookup`].
pub fn lookup_by_handle<S: RevisionStore + ?Sized>(
    store: &S,
    command: &HandleLookupCommand,
    now: DateTime<Utc>,
) -> LookupResult<String> {
    let context = read_context(command.read_timestamp, now)?;
    let keys = command
        .handles
        .iter()
        .map(|handle| decode(handle))
        .collect::<Result<Vec<_>, _>>()?;
    describe_all(store, &keys, &context, command.expand, now)
}

fn read_context(
    read_timestamp: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> LookupResult<ResolutionContext> {
    let as_of = read_timestamp.unwrap_or(now);
    if as_of < now {
        return Err(FlowError::InvalidTimestamp { as_of, now }.into());
    }
    Ok(ResolutionContext::at(as_of))
}

fn describe_all<S: RevisionStore + ?Sized>(
    store: &S,
    keys: &[ObjectKey],
    context: &ResolutionContext,
    expand: bool,
    now: DateTime<Utc>,
) -> LookupResult<String> {
    let resolver = ResourceResolver::new(store);
    let mut output = String::new();
    let mut found = 0_usize;
    for key in keys {
        let (text, exists) = describe(resolver, key, context, expand, now)?;
        output.push_str(&text);
        if exists {
            found += 1;
        }
    }

    info!(
        "event=admin_lookup module=admin status=ok requested={} found={} expand={} as_of={}",
        keys.len(),
        found,
        expand,
        context.as_of.to_rfc3339()
    );
    Ok(output)
}

fn describe<S: RevisionStore + ?Sized>(
    resolver: ResourceResolver<'_, S>,
    key: &ObjectKey,
    context: &ResolutionContext,
    expand: bool,
    now: DateTime<Utc>,
) -> LookupResult<(String, bool)> {
    let capability = resource_query_capability(key.kind);
    let query = ResourceQuery::new(key.unique_id.as_str());

    match InfoFlow::new(&capability, resolver, now).run(&query, context) {
        Ok(response) => {
            let body = if expand {
                render::hydrated(&response.payload, &resolver, context.as_of)
                    .map_err(FlowError::from)?
            } else {
                response.rendered
            };
            Ok((format!("{body}\n\nWebsafe key: {}\n", response.handle), true))
        }
        Err(FlowError::ResourceDoesNotExist { kind, unique_id }) => Ok((
            format!("{kind} '{unique_id}' does not exist or is deleted\n"),
            false,
        )),
        Err(err) => Err(err.into()),
    }
}
