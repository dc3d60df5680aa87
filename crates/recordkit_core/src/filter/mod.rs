//! Storage-independent query predicates.
//!
//! # Responsibility
//! - Build immutable predicate trees through named factory functions.
//! - Evaluate predicates against JSON documents for in-process gateways.
//! - Keep editable filter collections keyed by filter slot.
//!
//! # Invariants
//! - Leaf filters are equal (and hash equal) iff property and operator match;
//!   the value never takes part in identity.
//! - `and([])` is always true and `or([])` is always false.
//! - Filters are never mutated after construction.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod eval;
mod filter_set;
mod query_filter;

pub use eval::{compare_documents, resolve_property};
pub use filter_set::FilterSet;
pub use query_filter::{FilterOperator, QueryFilter, DEFAULT_FILTER_LABEL};

pub type FilterResult<T> = Result<T, FilterError>;

/// Rejected filter construction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Property path is empty or not a dotted identifier path.
    InvalidProperty(String),
    /// `AND`/`OR` cannot be used to build a leaf.
    CompositeOperator(FilterOperator),
    /// Operand does not have the shape required by the operator.
    InvalidOperand {
        operator: FilterOperator,
        reason: &'static str,
    },
}

impl Display for FilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProperty(property) => {
                write!(f, "invalid filter property `{property}`")
            }
            Self::CompositeOperator(operator) => {
                write!(f, "operator {operator} builds composite filters only")
            }
            Self::InvalidOperand { operator, reason } => {
                write!(f, "invalid operand for {operator}: {reason}")
            }
        }
    }
}

impl Error for FilterError {}
