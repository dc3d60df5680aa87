//! Predicate evaluation over JSON documents.
//!
//! Null handling follows SQL: a comparison against a missing or null
//! property never matches; only `IS_NULL` selects such rows.

use super::query_filter::{FilterNode, FilterOperator, QueryFilter};
use serde_json::Value;
use std::cmp::Ordering;

static NULL: Value = Value::Null;

impl QueryFilter {
    /// Returns whether `document` satisfies this filter.
    pub fn matches(&self, document: &Value) -> bool {
        match &self.node {
            FilterNode::Composite { operator, children } => match operator {
                FilterOperator::Or => children.iter().any(|child| child.matches(document)),
                _ => children.iter().all(|child| child.matches(document)),
            },
            FilterNode::Leaf {
                property,
                operator,
                value,
            } => {
                let actual = resolve_property(document, property).filter(|v| !v.is_null());
                match_leaf(document, actual, *operator, value)
            }
        }
    }
}

/// Resolves a dotted property path inside a JSON document.
pub fn resolve_property<'a>(document: &'a Value, property: &str) -> Option<&'a Value> {
    property
        .split('.')
        .try_fold(document, |current, segment| current.get(segment))
}

/// Total order of two documents by one property, used for result ordering.
///
/// Missing values sort first, then booleans, numbers, strings, and any other
/// JSON shape.
pub fn compare_documents(left: &Value, right: &Value, property: &str) -> Ordering {
    let left = resolve_property(left, property).unwrap_or(&NULL);
    let right = resolve_property(right, property).unwrap_or(&NULL);
    let by_rank = type_rank(left).cmp(&type_rank(right));
    if by_rank != Ordering::Equal {
        return by_rank;
    }
    compare_values(left, right).unwrap_or(Ordering::Equal)
}

fn match_leaf(
    document: &Value,
    actual: Option<&Value>,
    operator: FilterOperator,
    expected: &Value,
) -> bool {
    match operator {
        FilterOperator::IsNull => actual.is_none(),
        FilterOperator::NotNull => actual.is_some(),
        FilterOperator::Eq => actual.is_some_and(|a| values_equal(a, expected)),
        FilterOperator::Neq => {
            actual.is_some_and(|a| !expected.is_null() && !values_equal(a, expected))
        }
        FilterOperator::Like => match (actual, expected) {
            (Some(Value::String(text)), Value::String(needle)) => {
                text.to_lowercase().contains(&needle.to_lowercase())
            }
            _ => false,
        },
        FilterOperator::Gt => ordered(actual, Some(expected), Ordering::is_gt),
        FilterOperator::Ge => ordered(actual, Some(expected), Ordering::is_ge),
        FilterOperator::Lt => ordered(actual, Some(expected), Ordering::is_lt),
        FilterOperator::Le => ordered(actual, Some(expected), Ordering::is_le),
        FilterOperator::GtProperty | FilterOperator::LtProperty => {
            let other = expected
                .as_str()
                .and_then(|name| resolve_property(document, name));
            let test: fn(Ordering) -> bool = if operator == FilterOperator::GtProperty {
                Ordering::is_gt
            } else {
                Ordering::is_lt
            };
            ordered(actual, other, test)
        }
        FilterOperator::In => match (actual, expected) {
            (Some(a), Value::Array(candidates)) => {
                candidates.iter().any(|candidate| values_equal(a, candidate))
            }
            _ => false,
        },
        // Composite operators never reach leaf evaluation.
        FilterOperator::And | FilterOperator::Or => false,
    }
}

fn ordered(left: Option<&Value>, right: Option<&Value>, test: fn(Ordering) -> bool) -> bool {
    match (left, right) {
        (Some(left), Some(right)) => compare_values(left, right).is_some_and(test),
        _ => false,
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => {
            compare_values(left, right) == Some(Ordering::Equal)
        }
        _ => left == right,
    }
}

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => Some(l.cmp(&r)),
            _ => l.as_f64()?.partial_cmp(&r.as_f64()?),
        },
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) | Value::Object(_) => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::{compare_documents, resolve_property};
    use crate::filter::QueryFilter;
    use serde_json::json;
    use std::cmp::Ordering;

    #[test]
    fn resolves_nested_paths() {
        let doc = json!({ "customer": { "name": "Acme" } });
        assert_eq!(
            resolve_property(&doc, "customer.name"),
            Some(&json!("Acme"))
        );
        assert_eq!(resolve_property(&doc, "customer.city"), None);
    }

    #[test]
    fn numbers_compare_across_representations() {
        let doc = json!({ "amount": 100 });
        assert!(QueryFilter::equal("amount", 100.0).matches(&doc));
        assert!(QueryFilter::greater("amount", 99.5).matches(&doc));
        assert!(!QueryFilter::less("amount", 100).matches(&doc));
    }

    #[test]
    fn like_is_case_insensitive_contains() {
        let doc = json!({ "title": "Quarterly Report" });
        assert!(QueryFilter::like("title", "REPORT").matches(&doc));
        assert!(!QueryFilter::like("title", "invoice").matches(&doc));
    }

    #[test]
    fn null_and_missing_properties_only_match_null_checks() {
        let doc = json!({ "closed_at": null });
        assert!(QueryFilter::is_null("closed_at").matches(&doc));
        assert!(QueryFilter::is_null("never_set").matches(&doc));
        assert!(!QueryFilter::not_null("closed_at").matches(&doc));
        assert!(!QueryFilter::equal("closed_at", "x").matches(&doc));
        assert!(!QueryFilter::not_equal("closed_at", "x").matches(&doc));
        assert!(!QueryFilter::greater("closed_at", 1).matches(&doc));
    }

    #[test]
    fn property_comparisons_read_both_sides_from_the_record() {
        let doc = json!({ "start": 10, "end": 20 });
        assert!(QueryFilter::less_than_property("start", "end").matches(&doc));
        assert!(QueryFilter::greater_than_property("end", "start").matches(&doc));
        assert!(!QueryFilter::greater_than_property("start", "missing").matches(&doc));
    }

    #[test]
    fn in_matches_any_candidate() {
        let doc = json!({ "status": "HOLD" });
        assert!(QueryFilter::in_values("status", ["OPEN", "HOLD"]).matches(&doc));
        assert!(!QueryFilter::in_values("status", Vec::<String>::new()).matches(&doc));
    }

    #[test]
    fn empty_and_is_true_and_empty_or_is_false() {
        let doc = json!({});
        assert!(QueryFilter::and([]).matches(&doc));
        assert!(!QueryFilter::or([]).matches(&doc));
    }

    #[test]
    fn ordering_puts_missing_values_first() {
        let low = json!({ "amount": 5 });
        let none = json!({});
        assert_eq!(compare_documents(&none, &low, "amount"), Ordering::Less);
        assert_eq!(compare_documents(&low, &low, "amount"), Ordering::Equal);
    }
}
