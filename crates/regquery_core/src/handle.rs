//! Opaque, storage-independent object handles ("websafe keys").
//!
//! # Responsibility
//! - Encode an `ObjectKey` into a URL-safe token external callers can keep.
//! - Decode such tokens back into keys, rejecting anything malformed.
//!
//! # Invariants
//! - `encode` is deterministic and injective per key.
//! - Handles carry no version data; they resolve against whatever instant
//!   the caller later queries at.
//! - Handles stay decodable indefinitely: the envelope is versioned and
//!   identifiers are never reused.

use crate::model::object::{ObjectKey, ObjectKind};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use std::fmt::{Display, Formatter};
use thiserror::Error;

const HANDLE_FORMAT_VERSION: u32 = 1;

pub type HandleResult<T> = Result<T, HandleError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("malformed handle: {0}")]
    Malformed(String),
}

/// Encoded reference to one registry object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpaqueHandle(String);

impl OpaqueHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decodes this handle back into the key it was encoded from.
    pub fn key(&self) -> HandleResult<ObjectKey> {
        decode(&self.0)
    }
}

impl Display for OpaqueHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    v: u32,
    kind: String,
    id: String,
}

/// Encodes `key` into its opaque handle.
pub fn encode(key: &ObjectKey) -> OpaqueHandle {
    let envelope = json!({
        "v": HANDLE_FORMAT_VERSION,
        "kind": key.kind.as_str(),
        "id": key.unique_id,
    });
    OpaqueHandle(URL_SAFE_NO_PAD.encode(envelope.to_string()))
}

/// Decodes an externally supplied handle.
///
/// # Errors
/// - `HandleError::Malformed` for bad base64, non-JSON content, unknown
///   envelope version or kind, or an empty identifier.
pub fn decode(handle: &str) -> HandleResult<ObjectKey> {
    let trimmed = handle.trim();
    if trimmed.is_empty() {
        return Err(HandleError::Malformed("handle is empty".to_string()));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|err| HandleError::Malformed(format!("not url-safe base64: {err}")))?;
    let envelope: Envelope = serde_json::from_slice(&bytes)
        .map_err(|err| HandleError::Malformed(format!("unreadable envelope: {err}")))?;

    if envelope.v != HANDLE_FORMAT_VERSION {
        return Err(HandleError::Malformed(format!(
            "unsupported handle version {}",
            envelope.v
        )));
    }
    let kind = envelope
        .kind
        .parse::<ObjectKind>()
        .map_err(|err| HandleError::Malformed(err.to_string()))?;
    if envelope.id.is_empty() {
        return Err(HandleError::Malformed("handle names no identifier".to_string()));
    }

    Ok(ObjectKey::new(kind, envelope.id))
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, HandleError};
    use crate::model::object::{ObjectKey, ObjectKind};
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    #[test]
    fn decode_reverses_encode_for_every_kind() {
        for kind in ObjectKind::ALL {
            let key = ObjectKey::new(kind, "ns1.example.com");
            assert_eq!(decode(encode(&key).as_str()).unwrap(), key);
        }
    }

    #[test]
    fn encode_is_deterministic_and_distinguishes_kinds() {
        let host = ObjectKey::host("example.com");
        let domain = ObjectKey::domain("example.com");
        assert_eq!(encode(&host), encode(&host));
        assert_ne!(encode(&host), encode(&domain));
    }

    #[test]
    fn handles_are_url_safe() {
        let handle = encode(&ObjectKey::contact("a/b+c?=d"));
        assert!(handle
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(handle.key().unwrap(), ObjectKey::contact("a/b+c?=d"));
    }

    #[test]
    fn identifiers_needing_json_escapes_survive_encoding() {
        for unique_id in ["quote\"inside", "back\\slash", "line\nbreak", "\u{1F600}"] {
            let key = ObjectKey::contact(unique_id);
            let handle = encode(&key);
            assert!(!handle.as_str().is_empty());
            assert_eq!(decode(handle.as_str()).unwrap(), key);
        }
    }

    #[test]
    fn rejects_non_base64_input() {
        let err = decode("not a handle!").unwrap_err();
        assert!(matches!(err, HandleError::Malformed(_)));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(decode("  "), Err(HandleError::Malformed(_))));
    }

    #[test]
    fn rejects_unknown_kind_and_version() {
        let unknown_kind = URL_SAFE_NO_PAD.encode(br#"{"v":1,"kind":"registrar","id":"x"}"#);
        assert!(matches!(decode(&unknown_kind), Err(HandleError::Malformed(_))));

        let future_version = URL_SAFE_NO_PAD.encode(br#"{"v":2,"kind":"host","id":"x"}"#);
        assert!(matches!(decode(&future_version), Err(HandleError::Malformed(_))));
    }

    #[test]
    fn rejects_empty_identifier() {
        let empty_id = URL_SAFE_NO_PAD.encode(br#"{"v":1,"kind":"host","id":""}"#);
        assert!(matches!(decode(&empty_id), Err(HandleError::Malformed(_))));
    }
}
