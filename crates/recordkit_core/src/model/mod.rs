//! Entity contract shared by services and gateways.
//!
//! # Responsibility
//! - Describe how a record type is identified and stored.
//! - Keep record types free of any storage-engine knowledge.
//!
//! # Invariants
//! - A record with `id() == None` has never been persisted.
//! - `validate()` runs before every insert or update; deletes skip it.

pub mod entity;
