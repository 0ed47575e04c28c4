//! Data types produced by the aggregation pipeline.

use indexmap::IndexMap;
use serde::Serialize;

use crate::records::Field;

/// Category key to summed or counted integer.
///
/// Keys keep first-seen order for display, but equality ignores order: two
/// views are equal when they map the same keys to the same values. Totals
/// saturate at `u64::MAX` instead of overflowing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AggregateView(IndexMap<String, u64>);

impl AggregateView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str, amount: u64) {
        match self.0.get_mut(key) {
            Some(total) => *total = total.saturating_add(amount),
            None => {
                self.0.insert(key.to_string(), amount);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all values, saturating.
    pub fn total(&self) -> u64 {
        self.0.values().fold(0, |acc, v| acc.saturating_add(*v))
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Keys in ascending lexical order. Chronological for `YYYY-MM` and
    /// `YYYY` bucket keys.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        keys
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for AggregateView {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut view = AggregateView::new();
        for (k, v) in iter {
            view.add(&k.into(), v);
        }
        view
    }
}

/// Outer key to a sparse inner [`AggregateView`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NestedView(IndexMap<String, AggregateView>);

impl NestedView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, outer: &str, inner: &str, amount: u64) {
        if !self.0.contains_key(outer) {
            self.0.insert(outer.to_string(), AggregateView::new());
        }
        if let Some(view) = self.0.get_mut(outer) {
            view.add(inner, amount);
        }
    }

    pub fn get(&self, outer: &str) -> Option<&AggregateView> {
        self.0.get(outer)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AggregateView)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Distinct inner keys across all outer entries, first-seen order.
    pub fn inner_keys(&self) -> Vec<&str> {
        let mut seen = indexmap::IndexSet::new();
        for view in self.0.values() {
            for key in view.keys() {
                seen.insert(key);
            }
        }
        seen.into_iter().collect()
    }
}

/// Scoped presentation state passed in by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    /// Field used for the location views and the inner key of
    /// `activity_by_location`.
    pub location_field: Field,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            location_field: Field::LocalAuthority,
        }
    }
}

impl DashboardOptions {
    /// Options for an uploaded batch. Local authority only exists after
    /// enrichment, so without it the location views use the free-text
    /// location instead.
    pub fn for_upload(location_field: Field, enriched: bool) -> Self {
        let location_field = match location_field {
            Field::LocalAuthority if !enriched => Field::Location,
            field => field,
        };
        Self { location_field }
    }
}

/// Every named view computed from one batch of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub activity: AggregateView,
    pub location: AggregateView,
    pub type_of_insight: AggregateView,
    pub age_range: AggregateView,
    pub local_authority_count: AggregateView,
    pub people_by_local_authority: AggregateView,
    pub activity_by_location: NestedView,
    pub date_by_month: AggregateView,
    pub date_by_year: AggregateView,
    pub record_count: usize,
}

impl Dashboard {
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}
