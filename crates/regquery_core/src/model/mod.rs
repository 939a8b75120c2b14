//! Registry object model shared by the store, resolver and flows.
//!
//! # Responsibility
//! - Define object identity (`ObjectKind`, `ObjectKey`).
//! - Define the resource payloads that revisions carry.
//! - Define immutable revisions and per-object revision histories.
//!
//! # Invariants
//! - A key's `unique_id` is never reused for a different object.
//! - Deletion is a revision state (deletion marker), not row removal.

pub mod object;
pub mod resource;
pub mod revision;
