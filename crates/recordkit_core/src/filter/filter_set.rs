//! Editable collection of filters keyed by slot.

use super::query_filter::{FilterOperator, QueryFilter};

/// Ordered filter collection where each `(property, operator)` slot appears
/// at most once.
///
/// Search forms keep one `FilterSet`; every control owns one slot and
/// replaces its filter when the user edits the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    filters: Vec<QueryFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `filter`, replacing the filter in the same slot if present.
    ///
    /// A replaced filter keeps its position. Returns the replaced filter.
    pub fn upsert(&mut self, filter: QueryFilter) -> Option<QueryFilter> {
        match self.filters.iter().position(|existing| *existing == filter) {
            Some(index) => Some(std::mem::replace(&mut self.filters[index], filter)),
            None => {
                self.filters.push(filter);
                None
            }
        }
    }

    /// Removes the filter occupying the same slot as `filter`.
    pub fn remove(&mut self, filter: &QueryFilter) -> Option<QueryFilter> {
        let index = self.filters.iter().position(|existing| existing == filter)?;
        Some(self.filters.remove(index))
    }

    /// Returns the filter occupying the `(property, operator)` slot.
    pub fn get(&self, property: &str, operator: FilterOperator) -> Option<&QueryFilter> {
        self.filters
            .iter()
            .find(|filter| filter.occupies(property, operator))
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryFilter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    /// Folds the set into one conjunction; an empty set matches everything.
    pub fn to_filter(&self) -> QueryFilter {
        QueryFilter::and(self.filters.iter().cloned())
    }
}

impl FromIterator<QueryFilter> for FilterSet {
    fn from_iter<I: IntoIterator<Item = QueryFilter>>(iter: I) -> Self {
        let mut set = Self::new();
        for filter in iter {
            set.upsert(filter);
        }
        set
    }
}
