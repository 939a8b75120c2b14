//! Object identity.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Registry object kind.
///
/// Storage and handle encodings use [`ObjectKind::as_str`], so the string
/// values are part of the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Host,
    Domain,
    Contact,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 3] = [Self::Host, Self::Domain, Self::Contact];

    /// Stable lowercase name used in storage, handles and user output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Domain => "domain",
            Self::Contact => "contact",
        }
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown object kind `{0}`; expected host|domain|contact")]
pub struct UnknownObjectKind(pub String);

impl FromStr for ObjectKind {
    type Err = UnknownObjectKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "host" => Ok(Self::Host),
            "domain" => Ok(Self::Domain),
            "contact" => Ok(Self::Contact),
            other => Err(UnknownObjectKind(other.to_string())),
        }
    }
}

/// Identity of one versioned registry object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    pub kind: ObjectKind,
    /// Host name, domain name or contact id.
    pub unique_id: String,
}

impl ObjectKey {
    pub fn new(kind: ObjectKind, unique_id: impl Into<String>) -> Self {
        Self {
            kind,
            unique_id: unique_id.into(),
        }
    }

    pub fn host(host_name: impl Into<String>) -> Self {
        Self::new(ObjectKind::Host, host_name)
    }

    pub fn domain(domain_name: impl Into<String>) -> Self {
        Self::new(ObjectKind::Domain, domain_name)
    }

    pub fn contact(contact_id: impl Into<String>) -> Self {
        Self::new(ObjectKind::Contact, contact_id)
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.kind, self.unique_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{ObjectKey, ObjectKind, UnknownObjectKind};

    #[test]
    fn kind_names_parse_back() {
        for kind in ObjectKind::ALL {
            assert_eq!(kind.as_str().parse::<ObjectKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "Host".parse::<ObjectKind>().unwrap_err();
        assert_eq!(err, UnknownObjectKind("Host".to_string()));
    }

    #[test]
    fn key_display_quotes_identifier() {
        assert_eq!(
            ObjectKey::host("ns1.example.com").to_string(),
            "host 'ns1.example.com'"
        );
    }
}
