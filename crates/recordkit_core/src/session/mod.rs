//! Transactional data sessions.
//!
//! # Responsibility
//! - Bracket persistence work in units of work with commit/rollback.
//! - Enforce the session lifecycle state machine.
//! - Define the error taxonomy shared by sessions and services.
//!
//! # Invariants
//! - At most one transaction is open per session.
//! - `commit` and `rollback` always leave the session `Ready`, even on failure.
//! - Failures are never swallowed: cleanup (rollback) happens as a side effect
//!   of propagation.
//!
//! # See also
//! - `crate::service` for the CRUD contract built on top of this module.

use crate::gateway::GatewayError;
use crate::model::entity::RecordId;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod data_session;
mod operation;

pub use data_session::{DataSession, SessionId, SessionState};
pub use operation::TransactionOperation;

pub type DataResult<T> = Result<T, DataError>;

/// Failure raised by sessions and CRUD services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// Caller input violated a precondition; never retried.
    Validation(String),
    /// Requested record has no persisted row.
    NotFound {
        collection: &'static str,
        id: Option<RecordId>,
    },
    /// Gateway could not complete the operation.
    Persistence(GatewayError),
    /// Session used outside its legal lifecycle state.
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
}

impl Display for DataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::NotFound {
                collection,
                id: Some(id),
            } => write!(f, "record {id} not found in `{collection}`"),
            Self::NotFound {
                collection,
                id: None,
            } => write!(f, "record without identity not found in `{collection}`"),
            Self::Persistence(err) => write!(f, "{err}"),
            Self::InvalidState { operation, state } => {
                write!(f, "cannot {operation} while session is {state}")
            }
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GatewayError> for DataError {
    fn from(value: GatewayError) -> Self {
        Self::Persistence(value)
    }
}
