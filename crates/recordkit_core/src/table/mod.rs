//! Dynamic table binding for record lists.
//!
//! # Responsibility
//! - Adapt a list of records to a grid widget (rows, columns, cells).
//! - Resolve name-bound columns against an explicit accessor table.
//! - Notify listeners about resets, insertions and deletions.
//!
//! # Invariants
//! - Column order is registration order and is the display order.
//! - Row notifications always carry the exact affected index range.
//! - An unresolvable column is a `Misconfiguration` error, never a
//!   placeholder value.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod column;
mod model;

pub use column::{Accessor, AccessorTable, CellAlignment, CellValue, ColumnDescriptor, ColumnType};
pub use model::TableModel;

pub type TableResult<T> = Result<T, TableError>;

/// Change notification delivered to table listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEvent {
    /// Whole data set replaced or cleared.
    DataChanged,
    /// Rows `first..=last` were inserted.
    RowsInserted { first: usize, last: usize },
    /// Rows `first..=last` were deleted.
    RowsDeleted { first: usize, last: usize },
}

/// Table binding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Column cannot be resolved against the record type.
    Misconfiguration(String),
    RowOutOfBounds { index: usize, row_count: usize },
    ColumnOutOfBounds { index: usize, column_count: usize },
}

impl Display for TableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Misconfiguration(message) => write!(f, "table misconfigured: {message}"),
            Self::RowOutOfBounds { index, row_count } => {
                write!(f, "row {index} out of bounds (rows: {row_count})")
            }
            Self::ColumnOutOfBounds {
                index,
                column_count,
            } => write!(f, "column {index} out of bounds (columns: {column_count})"),
        }
    }
}

impl Error for TableError {}
