//! Query commands and the capability instance bound to each.

use super::FlowCapability;
use crate::model::object::ObjectKind;
use crate::render;

/// Protocol `<host:info>` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfoCommand {
    pub host_name: String,
}

/// Protocol `<domain:info>` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainInfoCommand {
    pub domain_name: String,
}

/// Protocol `<contact:info>` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInfoCommand {
    pub contact_id: String,
}

/// Kind-agnostic query used by tooling that picks the kind at runtime.
///
/// Carries only the identifier; the kind comes from the capability the
/// query runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceQuery {
    pub unique_id: String,
}

impl ResourceQuery {
    pub fn new(unique_id: impl Into<String>) -> Self {
        Self {
            unique_id: unique_id.into(),
        }
    }
}

fn host_name(command: &HostInfoCommand) -> &str {
    &command.host_name
}

fn domain_name(command: &DomainInfoCommand) -> &str {
    &command.domain_name
}

fn contact_id(command: &ContactInfoCommand) -> &str {
    &command.contact_id
}

fn query_unique_id(query: &ResourceQuery) -> &str {
    &query.unique_id
}

pub static HOST_INFO: FlowCapability<HostInfoCommand> = FlowCapability {
    kind: ObjectKind::Host,
    extract_id: host_name,
    render: render::shallow,
};

pub static DOMAIN_INFO: FlowCapability<DomainInfoCommand> = FlowCapability {
    kind: ObjectKind::Domain,
    extract_id: domain_name,
    render: render::shallow,
};

pub static CONTACT_INFO: FlowCapability<ContactInfoCommand> = FlowCapability {
    kind: ObjectKind::Contact,
    extract_id: contact_id,
    render: render::shallow,
};

/// Capability that resolves `ResourceQuery` identifiers as objects of `kind`.
pub fn resource_query_capability(kind: ObjectKind) -> FlowCapability<ResourceQuery> {
    FlowCapability {
        kind,
        extract_id: query_unique_id,
        render: render::shallow,
    }
}
