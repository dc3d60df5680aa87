//! CRUD use-case services.
//!
//! # Responsibility
//! - Define the generic create/update/delete/get/list contract.
//! - Provide `EntityService`, the serde-backed implementation over a
//!   `DataSession`.
//!
//! # Invariants
//! - Every operation runs inside a unit of work; failures roll it back
//!   before propagating.
//! - `get_records_list` returns an empty vector, never an error, when
//!   nothing matches.

pub mod data_service;

pub use data_service::{EntityService, GeneralDataService};
