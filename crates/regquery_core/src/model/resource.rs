//! Registry resource payloads.
//!
//! # Responsibility
//! - Define the per-kind state that one live revision carries.
//! - Expose the identity and back-references of each payload uniformly.
//!
//! # Invariants
//! - A payload's own key (`ResourcePayload::key`) must match the key it is
//!   stored under.
//! - References are plain keys; they are resolved at query time, never
//!   embedded.

use crate::model::object::{ObjectKey, ObjectKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name server host object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostResource {
    /// Fully qualified host name; the host's unique id.
    pub host_name: String,
    /// Glue addresses in textual form.
    #[serde(default)]
    pub inet_addresses: Vec<String>,
    /// Domain this host is subordinate to, when it is in-bailiwick.
    #[serde(default)]
    pub superordinate_domain: Option<String>,
    #[serde(default)]
    pub statuses: Vec<String>,
    /// Registrar currently sponsoring the object.
    pub sponsor_registrar: String,
}

impl HostResource {
    pub fn new(host_name: impl Into<String>, sponsor_registrar: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            inet_addresses: Vec::new(),
            superordinate_domain: None,
            statuses: Vec::new(),
            sponsor_registrar: sponsor_registrar.into(),
        }
    }
}

/// Role of a contact attached to a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactRole {
    Admin,
    Billing,
    Tech,
}

impl ContactRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Billing => "billing",
            Self::Tech => "tech",
        }
    }
}

/// Contact reference held by a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignatedContact {
    pub role: ContactRole,
    pub contact_id: String,
}

/// Registered domain object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainResource {
    /// Fully qualified domain name; the domain's unique id.
    pub domain_name: String,
    #[serde(default)]
    pub registrant: Option<String>,
    #[serde(default)]
    pub contacts: Vec<DesignatedContact>,
    /// Host names of delegated name servers.
    #[serde(default)]
    pub nameservers: Vec<String>,
    #[serde(default)]
    pub statuses: Vec<String>,
    pub sponsor_registrar: String,
    #[serde(default)]
    pub registration_expiration: Option<DateTime<Utc>>,
}

impl DomainResource {
    pub fn new(domain_name: impl Into<String>, sponsor_registrar: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            registrant: None,
            contacts: Vec::new(),
            nameservers: Vec::new(),
            statuses: Vec::new(),
            sponsor_registrar: sponsor_registrar.into(),
            registration_expiration: None,
        }
    }
}

/// Registrant or administrative contact object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResource {
    /// Registry-assigned contact id; the contact's unique id.
    pub contact_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub statuses: Vec<String>,
    pub sponsor_registrar: String,
}

impl ContactResource {
    pub fn new(contact_id: impl Into<String>, sponsor_registrar: impl Into<String>) -> Self {
        Self {
            contact_id: contact_id.into(),
            name: None,
            email: None,
            statuses: Vec::new(),
            sponsor_registrar: sponsor_registrar.into(),
        }
    }
}

/// State carried by one live revision of any registry object.
///
/// Serialized with an internal `kind` tag; that JSON is the persisted
/// payload format of the SQLite store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourcePayload {
    Host(HostResource),
    Domain(DomainResource),
    Contact(ContactResource),
}

impl ResourcePayload {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Host(_) => ObjectKind::Host,
            Self::Domain(_) => ObjectKind::Domain,
            Self::Contact(_) => ObjectKind::Contact,
        }
    }

    pub fn unique_id(&self) -> &str {
        match self {
            Self::Host(host) => &host.host_name,
            Self::Domain(domain) => &domain.domain_name,
            Self::Contact(contact) => &contact.contact_id,
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.kind(), self.unique_id())
    }

    /// Keys of other objects this payload points at, in rendering order.
    ///
    /// Duplicates are kept; a contact that is both registrant and admin is
    /// listed twice.
    pub fn references(&self) -> Vec<ObjectKey> {
        match self {
            Self::Host(host) => host
                .superordinate_domain
                .iter()
                .map(ObjectKey::domain)
                .collect(),
            Self::Domain(domain) => domain
                .registrant
                .iter()
                .map(ObjectKey::contact)
                .chain(
                    domain
                        .contacts
                        .iter()
                        .map(|contact| ObjectKey::contact(contact.contact_id.as_str())),
                )
                .chain(domain.nameservers.iter().map(ObjectKey::host))
                .collect(),
            Self::Contact(_) => Vec::new(),
        }
    }
}

impl From<HostResource> for ResourcePayload {
    fn from(value: HostResource) -> Self {
        Self::Host(value)
    }
}

impl From<DomainResource> for ResourcePayload {
    fn from(value: DomainResource) -> Self {
        Self::Domain(value)
    }
}

impl From<ContactResource> for ResourcePayload {
    fn from(value: ContactResource) -> Self {
        Self::Contact(value)
    }
}
