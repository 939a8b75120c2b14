//! Point-in-time query core for registry objects.
//!
//! Resolves what a host, domain or contact looked like at an instant, and
//! serves protocol info queries and administrative lookups through one
//! generic flow so both surfaces always agree.

pub mod admin;
pub mod db;
pub mod flow;
pub mod handle;
pub mod logging;
pub mod model;
pub mod protocol;
pub mod render;
pub mod resolver;
pub mod store;

pub use admin::{lookup, lookup_by_handle, HandleLookupCommand, LookupCommand, LookupError};
pub use flow::{
    resource_query_capability, ContactInfoCommand, DomainInfoCommand, FlowCapability, FlowError,
    FlowResult, HostInfoCommand, InfoFlow, InfoResponse, ResourceQuery, CONTACT_INFO, DOMAIN_INFO,
    HOST_INFO,
};
pub use handle::{decode, encode, HandleError, OpaqueHandle};
pub use logging::{
    default_log_level, flush_logging, init_logging, logging_status, LogConfig, LoggingError,
};
pub use model::object::{ObjectKey, ObjectKind, UnknownObjectKind};
pub use model::resource::{
    ContactResource, ContactRole, DesignatedContact, DomainResource, HostResource,
    ResourcePayload,
};
pub use model::revision::{Revision, RevisionHistory, RevisionState};
pub use protocol::{respond_to_info, QueryResponse, ResultCode};
pub use resolver::{Resolution, ResolutionContext, ResourceResolver};
pub use store::{
    MemoryRevisionStore, RevisionStore, SqliteRevisionStore, StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
