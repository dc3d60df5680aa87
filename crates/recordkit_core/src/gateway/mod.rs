//! Persistence gateway contract.
//!
//! # Responsibility
//! - Define what a storage engine must provide to back a `DataSession`.
//! - Keep storage details (SQL, files, network) outside core.
//!
//! # Invariants
//! - A gateway is the process-wide session factory; it is shared by `Arc`
//!   and configured once, never through global state.
//! - A `GatewaySession` runs at most one transaction at a time.
//! - Work done inside a transaction is invisible to other sessions until
//!   `commit` succeeds.

use crate::config::SessionConfig;
use crate::filter::QueryFilter;
use crate::model::entity::RecordId;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;

pub use memory::{MemoryGateway, MemorySession, READ_ONLY_KEY};

/// Stored representation of one record: a JSON object.
pub type Document = Value;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Storage-level failure reported by a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Engine could not be reached or its state is unusable.
    Unavailable(String),
    /// A write violated a storage constraint (duplicate key, vanished row).
    Constraint(String),
    /// Session was opened read-only and a write was attempted.
    ReadOnly,
    /// Session handle was already closed.
    Closed,
    /// Transaction primitive called in the wrong engine state.
    TransactionState(&'static str),
    /// Stored or submitted document has an unusable shape.
    InvalidDocument(String),
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
            Self::Constraint(message) => write!(f, "constraint violation: {message}"),
            Self::ReadOnly => write!(f, "session is read-only"),
            Self::Closed => write!(f, "gateway session is closed"),
            Self::TransactionState(message) => write!(f, "transaction state error: {message}"),
            Self::InvalidDocument(message) => write!(f, "invalid document: {message}"),
        }
    }
}

impl Error for GatewayError {}

/// Filter plus ordering submitted to [`GatewaySession::query`].
#[derive(Debug, Clone, Copy)]
pub struct RecordQuery<'a> {
    pub filter: &'a QueryFilter,
    /// Property to sort by; `None` keeps identity order.
    pub order_by: Option<&'a str>,
    pub ascending: bool,
}

/// Session factory for one storage engine.
pub trait PersistenceGateway {
    type Session: GatewaySession;

    /// Opens a session handle using gateway-specific settings.
    fn open_session(&self, config: &SessionConfig) -> GatewayResult<Self::Session>;
}

/// One engine session: transaction primitives plus record operations.
///
/// Record operations outside a transaction apply immediately.
pub trait GatewaySession {
    fn begin(&mut self) -> GatewayResult<()>;
    fn commit(&mut self) -> GatewayResult<()>;
    fn rollback(&mut self) -> GatewayResult<()>;
    /// Releases the handle; later calls fail with `GatewayError::Closed`.
    fn close(&mut self) -> GatewayResult<()>;

    /// Reserves a fresh identity in `collection`.
    fn allocate_id(&mut self, collection: &str) -> GatewayResult<RecordId>;
    /// Stores a new document; fails with `Constraint` if `id` is taken.
    fn insert(&mut self, collection: &str, id: RecordId, document: Document)
        -> GatewayResult<()>;
    /// Replaces a document; returns `false` when no row has `id`.
    fn update(&mut self, collection: &str, id: RecordId, document: Document)
        -> GatewayResult<bool>;
    /// Removes a document; returns `false` when no row has `id`.
    fn delete(&mut self, collection: &str, id: RecordId) -> GatewayResult<bool>;
    fn find(&self, collection: &str, id: RecordId) -> GatewayResult<Option<Document>>;
    /// Returns matching documents, ordered as requested.
    fn query(&self, collection: &str, query: &RecordQuery<'_>) -> GatewayResult<Vec<Document>>;
}
