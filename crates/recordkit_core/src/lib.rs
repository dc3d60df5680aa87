//! Core building blocks for record-management applications.
//! Query predicates, transactional sessions, CRUD services and table binding
//! live here; storage engines plug in through the gateway traits.

pub mod config;
pub mod filter;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod service;
pub mod session;
pub mod table;

pub use crate::config::{AppConfig, AppConfigError, AppConfigResult, SessionConfig};
pub use filter::{FilterError, FilterOperator, FilterResult, FilterSet, QueryFilter};
pub use gateway::{
    Document, GatewayError, GatewayResult, GatewaySession, MemoryGateway, PersistenceGateway,
    RecordQuery,
};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LogSettings,
};
pub use model::entity::{Entity, RecordId};
pub use service::{EntityService, GeneralDataService};
pub use session::{
    DataError, DataResult, DataSession, SessionId, SessionState, TransactionOperation,
};
pub use table::{
    AccessorTable, CellAlignment, CellValue, ColumnDescriptor, ColumnType, TableError, TableEvent,
    TableModel, TableResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
