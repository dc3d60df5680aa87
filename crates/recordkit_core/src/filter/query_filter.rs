//! Filter node model and factory functions.

use super::{FilterError, FilterResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Label shown for filters that were never given a display name.
pub const DEFAULT_FILTER_LABEL: &str = "genericFilter";

static PROPERTY_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("valid property path regex")
});

/// Comparison or combination performed by a filter node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// Property equals value.
    Eq,
    /// Property differs from value.
    Neq,
    /// Case-insensitive "contains" on text properties.
    Like,
    /// Property greater than value.
    Gt,
    /// Property greater than or equal to value.
    Ge,
    /// Property lower than value.
    Lt,
    /// Property lower than or equal to value.
    Le,
    /// Property greater than another property of the same record.
    GtProperty,
    /// Property lower than another property of the same record.
    LtProperty,
    /// Property equals any element of a value list.
    In,
    /// Property is null or absent.
    IsNull,
    /// Property is present and not null.
    NotNull,
    /// Conjunction of child filters.
    And,
    /// Disjunction of child filters.
    Or,
}

impl FilterOperator {
    /// Returns whether this operator combines child filters.
    pub fn is_composite(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Returns whether a leaf with this operator carries a right-hand value.
    pub fn takes_value(self) -> bool {
        !matches!(self, Self::IsNull | Self::NotNull | Self::And | Self::Or)
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "<>",
            Self::Like => "LIKE",
            Self::Gt | Self::GtProperty => ">",
            Self::Ge => ">=",
            Self::Lt | Self::LtProperty => "<",
            Self::Le => "<=",
            Self::In => "IN",
            Self::IsNull => "IS NULL",
            Self::NotNull => "IS NOT NULL",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl Display for FilterOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Eq => "EQ",
            Self::Neq => "NEQ",
            Self::Like => "LIKE",
            Self::Gt => "GT",
            Self::Ge => "GE",
            Self::Lt => "LT",
            Self::Le => "LE",
            Self::GtProperty => "GT_PROPERTY",
            Self::LtProperty => "LT_PROPERTY",
            Self::In => "IN",
            Self::IsNull => "IS_NULL",
            Self::NotNull => "NOT_NULL",
            Self::And => "AND",
            Self::Or => "OR",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub(super) enum FilterNode {
    Leaf {
        property: String,
        operator: FilterOperator,
        value: Value,
    },
    Composite {
        operator: FilterOperator,
        children: Vec<QueryFilter>,
    },
}

/// Immutable search predicate over one record type.
///
/// A leaf filter is identified by its `(property, operator)` slot: two
/// leaves compare equal and hash identically regardless of their values, so
/// a UI control can own one slot and swap its value by building a new
/// filter (see [`super::FilterSet`]). Composite filters compare by operator
/// and children.
#[derive(Debug, Clone)]
pub struct QueryFilter {
    pub(super) node: FilterNode,
    label: Option<String>,
}

impl QueryFilter {
    /// Builds a leaf filter from dynamic input.
    ///
    /// # Errors
    /// - `InvalidProperty` when `property` is not a dotted identifier path.
    /// - `CompositeOperator` for `AND`/`OR`.
    /// - `InvalidOperand` when `IN` is not given an array, or a property
    ///   comparison is not given a property path.
    pub fn try_leaf(
        property: impl Into<String>,
        operator: FilterOperator,
        value: Value,
    ) -> FilterResult<Self> {
        let property = property.into();
        if !is_valid_property(&property) {
            return Err(FilterError::InvalidProperty(property));
        }
        if operator.is_composite() {
            return Err(FilterError::CompositeOperator(operator));
        }

        let value = match operator {
            FilterOperator::In if !value.is_array() => {
                return Err(FilterError::InvalidOperand {
                    operator,
                    reason: "expected an array of candidate values",
                });
            }
            FilterOperator::GtProperty | FilterOperator::LtProperty => match value.as_str() {
                Some(other) if is_valid_property(other) => value,
                _ => {
                    return Err(FilterError::InvalidOperand {
                        operator,
                        reason: "expected the name of another property",
                    });
                }
            },
            FilterOperator::IsNull | FilterOperator::NotNull => Value::Null,
            _ => value,
        };

        Ok(Self {
            node: FilterNode::Leaf {
                property,
                operator,
                value,
            },
            label: None,
        })
    }

    /// Property equals `value`.
    pub fn equal(property: &str, value: impl Into<Value>) -> Self {
        Self::leaf(property, FilterOperator::Eq, value.into())
    }

    /// Property differs from `value`.
    pub fn not_equal(property: &str, value: impl Into<Value>) -> Self {
        Self::leaf(property, FilterOperator::Neq, value.into())
    }

    /// Property contains `text`, ignoring case.
    pub fn like(property: &str, text: impl Into<String>) -> Self {
        Self::leaf(property, FilterOperator::Like, Value::String(text.into()))
    }

    /// Property greater than `value`.
    pub fn greater(property: &str, value: impl Into<Value>) -> Self {
        Self::leaf(property, FilterOperator::Gt, value.into())
    }

    /// Property greater than or equal to `value`.
    pub fn greater_equal(property: &str, value: impl Into<Value>) -> Self {
        Self::leaf(property, FilterOperator::Ge, value.into())
    }

    /// Property lower than `value`.
    pub fn less(property: &str, value: impl Into<Value>) -> Self {
        Self::leaf(property, FilterOperator::Lt, value.into())
    }

    /// Property lower than or equal to `value`.
    pub fn less_equal(property: &str, value: impl Into<Value>) -> Self {
        Self::leaf(property, FilterOperator::Le, value.into())
    }

    /// `property > other_property` on the same record.
    pub fn greater_than_property(property: &str, other_property: &str) -> Self {
        Self::leaf(
            property,
            FilterOperator::GtProperty,
            Value::String(other_property.to_string()),
        )
    }

    /// `property < other_property` on the same record.
    pub fn less_than_property(property: &str, other_property: &str) -> Self {
        Self::leaf(
            property,
            FilterOperator::LtProperty,
            Value::String(other_property.to_string()),
        )
    }

    /// Property equals any of `values`.
    pub fn in_values<I, V>(property: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
        Self::leaf(property, FilterOperator::In, Value::Array(values))
    }

    /// Property is null or absent.
    pub fn is_null(property: &str) -> Self {
        Self::leaf(property, FilterOperator::IsNull, Value::Null)
    }

    /// Property is present and not null.
    pub fn not_null(property: &str) -> Self {
        Self::leaf(property, FilterOperator::NotNull, Value::Null)
    }

    /// Conjunction of `filters`; an empty conjunction is always true.
    pub fn and(filters: impl IntoIterator<Item = QueryFilter>) -> Self {
        Self::composite(FilterOperator::And, filters)
    }

    /// Disjunction of `filters`; an empty disjunction is always false.
    pub fn or(filters: impl IntoIterator<Item = QueryFilter>) -> Self {
        Self::composite(FilterOperator::Or, filters)
    }

    /// Returns this filter with a display label attached.
    ///
    /// Labels are presentation only and never affect equality.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Filtered property; `None` for composite filters.
    pub fn property(&self) -> Option<&str> {
        match &self.node {
            FilterNode::Leaf { property, .. } => Some(property.as_str()),
            FilterNode::Composite { .. } => None,
        }
    }

    pub fn operator(&self) -> FilterOperator {
        match &self.node {
            FilterNode::Leaf { operator, .. } | FilterNode::Composite { operator, .. } => *operator,
        }
    }

    /// Right-hand value; `None` for null checks and composite filters.
    pub fn value(&self) -> Option<&Value> {
        match &self.node {
            FilterNode::Leaf {
                operator, value, ..
            } if operator.takes_value() => Some(value),
            _ => None,
        }
    }

    /// Child filters of a composite; empty for leaves.
    pub fn children(&self) -> &[QueryFilter] {
        match &self.node {
            FilterNode::Composite { children, .. } => children,
            FilterNode::Leaf { .. } => &[],
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.node, FilterNode::Composite { .. })
    }

    /// Display label, falling back to [`DEFAULT_FILTER_LABEL`].
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(DEFAULT_FILTER_LABEL)
    }

    /// Returns whether `self` occupies the given `(property, operator)` slot.
    pub fn occupies(&self, property: &str, operator: FilterOperator) -> bool {
        matches!(
            &self.node,
            FilterNode::Leaf { property: own, operator: own_op, .. }
                if own == property && *own_op == operator
        )
    }

    fn leaf(property: &str, operator: FilterOperator, value: Value) -> Self {
        match Self::try_leaf(property, operator, value) {
            Ok(filter) => filter,
            // Factory input is code, not user data.
            Err(err) => panic!("invalid query filter: {err}"),
        }
    }

    fn composite(operator: FilterOperator, filters: impl IntoIterator<Item = QueryFilter>) -> Self {
        Self {
            node: FilterNode::Composite {
                operator,
                children: filters.into_iter().collect(),
            },
            label: None,
        }
    }
}

impl PartialEq for QueryFilter {
    fn eq(&self, other: &Self) -> bool {
        match (&self.node, &other.node) {
            (
                FilterNode::Leaf {
                    property, operator, ..
                },
                FilterNode::Leaf {
                    property: other_property,
                    operator: other_operator,
                    ..
                },
            ) => property == other_property && operator == other_operator,
            (
                FilterNode::Composite { operator, children },
                FilterNode::Composite {
                    operator: other_operator,
                    children: other_children,
                },
            ) => operator == other_operator && children == other_children,
            _ => false,
        }
    }
}

impl Eq for QueryFilter {}

impl Hash for QueryFilter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.node {
            FilterNode::Leaf {
                property, operator, ..
            } => {
                0u8.hash(state);
                property.hash(state);
                operator.hash(state);
            }
            FilterNode::Composite { operator, children } => {
                1u8.hash(state);
                operator.hash(state);
                children.hash(state);
            }
        }
    }
}

impl Display for QueryFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(label) = &self.label {
            return f.write_str(label);
        }
        match &self.node {
            FilterNode::Leaf {
                property,
                operator,
                value,
            } => match operator {
                FilterOperator::IsNull | FilterOperator::NotNull => {
                    write!(f, "{property} {}", operator.symbol())
                }
                FilterOperator::GtProperty | FilterOperator::LtProperty => {
                    let other = value.as_str().unwrap_or_default();
                    write!(f, "{property} {} {other}", operator.symbol())
                }
                _ => write!(f, "{property} {} {value}", operator.symbol()),
            },
            FilterNode::Composite { operator, children } if children.is_empty() => {
                f.write_str(if *operator == FilterOperator::And {
                    "TRUE"
                } else {
                    "FALSE"
                })
            }
            FilterNode::Composite { operator, children } => {
                f.write_str("(")?;
                for (index, child) in children.iter().enumerate() {
                    if index > 0 {
                        write!(f, " {} ", operator.symbol())?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn is_valid_property(property: &str) -> bool {
    PROPERTY_PATH_RE.is_match(property)
}

#[cfg(test)]
mod tests {
    use super::{FilterOperator, QueryFilter};
    use crate::filter::FilterError;
    use serde_json::json;

    #[test]
    fn factories_record_property_operator_and_value() {
        let filter = QueryFilter::greater_equal("amount", 100);
        assert_eq!(filter.property(), Some("amount"));
        assert_eq!(filter.operator(), FilterOperator::Ge);
        assert_eq!(filter.value(), Some(&json!(100)));
        assert!(!filter.is_composite());
    }

    #[test]
    fn null_checks_expose_no_value() {
        let filter = QueryFilter::is_null("closed_at");
        assert_eq!(filter.value(), None);
        assert_eq!(filter.to_string(), "closed_at IS NULL");
    }

    #[test]
    fn try_leaf_rejects_bad_input() {
        assert!(matches!(
            QueryFilter::try_leaf("", FilterOperator::Eq, json!(1)),
            Err(FilterError::InvalidProperty(_))
        ));
        assert!(matches!(
            QueryFilter::try_leaf("a..b", FilterOperator::Eq, json!(1)),
            Err(FilterError::InvalidProperty(_))
        ));
        assert!(matches!(
            QueryFilter::try_leaf("status", FilterOperator::And, json!(1)),
            Err(FilterError::CompositeOperator(FilterOperator::And))
        ));
        assert!(matches!(
            QueryFilter::try_leaf("status", FilterOperator::In, json!("OPEN")),
            Err(FilterError::InvalidOperand { .. })
        ));
        assert!(matches!(
            QueryFilter::try_leaf("start", FilterOperator::LtProperty, json!(5)),
            Err(FilterError::InvalidOperand { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "invalid query filter")]
    fn factory_with_empty_property_fails_fast() {
        let _ = QueryFilter::equal("", "x");
    }

    #[test]
    fn display_renders_expression_or_label() {
        let filter = QueryFilter::and([
            QueryFilter::equal("status", "OPEN"),
            QueryFilter::less_than_property("start", "end"),
        ]);
        assert_eq!(filter.to_string(), "(status = \"OPEN\" AND start < end)");
        assert_eq!(QueryFilter::or([]).to_string(), "FALSE");

        let labelled = QueryFilter::like("customer.name", "acme").with_label("Customer");
        assert_eq!(labelled.to_string(), "Customer");
        assert_eq!(QueryFilter::like("name", "x").label(), "genericFilter");
    }
}
