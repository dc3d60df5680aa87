//! Entity trait and identity types.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Numeric identity assigned by the persistence gateway.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type RecordId = i64;

/// A record type managed through the generic CRUD service.
///
/// Records travel to the gateway as JSON objects, so every serialized field
/// name is also a property name usable in a `QueryFilter`.
pub trait Entity: Serialize + DeserializeOwned {
    /// Storage collection (table) name for this record type.
    const COLLECTION: &'static str;

    /// Returns the persisted identity, or `None` for a new record.
    fn id(&self) -> Option<RecordId>;

    /// Stores the identity allocated by the gateway on insert.
    fn set_id(&mut self, id: RecordId);

    /// Caller-level precondition check run before every insert or update.
    ///
    /// Returns a human-readable reason on rejection.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}
