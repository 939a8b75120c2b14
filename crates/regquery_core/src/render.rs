//! Text projections of resolved resources.
//!
//! Rendering happens after resolution and never decides existence itself:
//! the hydrated form resolves every reference through the resolver at the
//! same instant as the object it belongs to.

use crate::model::object::ObjectKey;
use crate::model::resource::ResourcePayload;
use crate::resolver::ResourceResolver;
use crate::store::{RevisionStore, StoreResult};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;

const INDENT: &str = "    ";

enum FieldValue {
    Text(String),
    Optional(Option<String>),
    List(Vec<String>),
    Reference(Option<ObjectKey>),
    References(Vec<(Option<&'static str>, ObjectKey)>),
}

type ResolvedReferences = HashMap<ObjectKey, Option<ResourcePayload>>;

/// Renders `payload` with references shown as bare identifiers.
pub fn shallow(payload: &ResourcePayload) -> String {
    let mut out = String::new();
    write_object(&mut out, payload, 0, None);
    out
}

/// Renders `payload` with every reference replaced by the referenced
/// object's shallow projection as of `as_of`.
///
/// References that do not resolve at `as_of` are marked instead of omitted.
pub fn hydrated<S: RevisionStore + ?Sized>(
    payload: &ResourcePayload,
    resolver: &ResourceResolver<'_, S>,
    as_of: DateTime<Utc>,
) -> StoreResult<String> {
    let mut resolved = ResolvedReferences::new();
    for key in payload.references() {
        if resolved.contains_key(&key) {
            continue;
        }
        let target = resolver.resolve_payload(&key, as_of)?;
        resolved.insert(key, target);
    }

    let mut out = String::new();
    write_object(&mut out, payload, 0, Some(&resolved));
    Ok(out)
}

fn type_name(payload: &ResourcePayload) -> &'static str {
    match payload {
        ResourcePayload::Host(_) => "HostResource",
        ResourcePayload::Domain(_) => "DomainResource",
        ResourcePayload::Contact(_) => "ContactResource",
    }
}

fn fields(payload: &ResourcePayload) -> Vec<(&'static str, FieldValue)> {
    match payload {
        ResourcePayload::Host(host) => vec![
            ("host_name", FieldValue::Text(host.host_name.clone())),
            ("inet_addresses", FieldValue::List(host.inet_addresses.clone())),
            (
                "superordinate_domain",
                FieldValue::Reference(host.superordinate_domain.as_ref().map(ObjectKey::domain)),
            ),
            ("statuses", FieldValue::List(host.statuses.clone())),
            (
                "sponsor_registrar",
                FieldValue::Text(host.sponsor_registrar.clone()),
            ),
        ],
        ResourcePayload::Domain(domain) => vec![
            ("domain_name", FieldValue::Text(domain.domain_name.clone())),
            (
                "registrant",
                FieldValue::Reference(domain.registrant.as_ref().map(ObjectKey::contact)),
            ),
            (
                "contacts",
                FieldValue::References(
                    domain
                        .contacts
                        .iter()
                        .map(|contact| {
                            (
                                Some(contact.role.as_str()),
                                ObjectKey::contact(contact.contact_id.as_str()),
                            )
                        })
                        .collect(),
                ),
            ),
            (
                "nameservers",
                FieldValue::References(
                    domain
                        .nameservers
                        .iter()
                        .map(|host_name| (None, ObjectKey::host(host_name.as_str())))
                        .collect(),
                ),
            ),
            ("statuses", FieldValue::List(domain.statuses.clone())),
            (
                "sponsor_registrar",
                FieldValue::Text(domain.sponsor_registrar.clone()),
            ),
            (
                "registration_expiration",
                FieldValue::Optional(
                    domain
                        .registration_expiration
                        .map(|instant| instant.to_rfc3339_opts(SecondsFormat::Millis, true)),
                ),
            ),
        ],
        ResourcePayload::Contact(contact) => vec![
            ("contact_id", FieldValue::Text(contact.contact_id.clone())),
            ("name", FieldValue::Optional(contact.name.clone())),
            ("email", FieldValue::Optional(contact.email.clone())),
            ("statuses", FieldValue::List(contact.statuses.clone())),
            (
                "sponsor_registrar",
                FieldValue::Text(contact.sponsor_registrar.clone()),
            ),
        ],
    }
}

fn write_object(
    out: &mut String,
    payload: &ResourcePayload,
    depth: usize,
    resolved: Option<&ResolvedReferences>,
) {
    let field_indent = INDENT.repeat(depth + 1);
    out.push_str(type_name(payload));
    out.push_str(" {\n");
    for (name, value) in fields(payload) {
        out.push_str(&field_indent);
        out.push_str(name);
        out.push('=');
        write_value(out, value, depth + 1, resolved);
        out.push('\n');
    }
    out.push_str(&INDENT.repeat(depth));
    out.push('}');
}

fn write_value(
    out: &mut String,
    value: FieldValue,
    depth: usize,
    resolved: Option<&ResolvedReferences>,
) {
    match value {
        FieldValue::Text(text) => out.push_str(&text),
        FieldValue::Optional(text) => out.push_str(text.as_deref().unwrap_or("null")),
        FieldValue::List(items) => {
            out.push('[');
            out.push_str(&items.join(", "));
            out.push(']');
        }
        FieldValue::Reference(None) => out.push_str("null"),
        FieldValue::Reference(Some(key)) => write_reference(out, &key, depth, resolved),
        FieldValue::References(references) => match resolved {
            None => {
                let labels: Vec<String> = references
                    .iter()
                    .map(|(role, key)| match role {
                        Some(role) => format!("{role}:{}", key.unique_id),
                        None => key.unique_id.clone(),
                    })
                    .collect();
                out.push('[');
                out.push_str(&labels.join(", "));
                out.push(']');
            }
            Some(_) if references.is_empty() => out.push_str("[]"),
            Some(_) => {
                let item_indent = INDENT.repeat(depth + 1);
                out.push_str("[\n");
                for (role, key) in references {
                    out.push_str(&item_indent);
                    if let Some(role) = role {
                        out.push_str(role);
                        out.push_str(": ");
                    }
                    write_reference(out, &key, depth + 1, resolved);
                    out.push('\n');
                }
                out.push_str(&INDENT.repeat(depth));
                out.push(']');
            }
        },
    }
}

fn write_reference(
    out: &mut String,
    key: &ObjectKey,
    depth: usize,
    resolved: Option<&ResolvedReferences>,
) {
    match resolved.map(|resolved| resolved.get(key)) {
        None => out.push_str(&key.unique_id),
        Some(Some(Some(target))) => write_object(out, target, depth, None),
        Some(_) => {
            out.push_str(&key.unique_id);
            out.push_str(" (does not exist or is deleted)");
        }
    }
}
