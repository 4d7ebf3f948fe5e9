//! The set of metric identifiers an agent has opted into.
//!
//! A `Selection` is an immutable value: every toggle returns a new selection
//! and leaves the receiver untouched, so a reader holding one never observes
//! a half-applied change.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::catalog::{MetricCatalog, metric_id};

/// Ordered set of metric identifiers (`"{category}:{metric}"`).
///
/// Serialized as a plain JSON array. Duplicates in incoming data are
/// collapsed to their first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
#[schema(value_type = Vec<String>)]
pub struct Selection(Vec<String>);

impl From<Vec<String>> for Selection {
    fn from(ids: Vec<String>) -> Self {
        let mut deduped: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if !deduped.contains(&id) {
                deduped.push(id);
            }
        }
        Self(deduped)
    }
}

impl From<Selection> for Vec<String> {
    fn from(selection: Selection) -> Self {
        selection.0
    }
}

impl FromIterator<String> for Selection {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the raw identifier is selected.
    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|selected| selected == id)
    }

    /// Whether `category:metric` is selected.
    pub fn has(&self, category_key: &str, metric_key: &str) -> bool {
        self.contains(&metric_id(category_key, metric_key))
    }

    /// Add or remove a single metric. Adding a present metric and removing
    /// an absent one both return an equal selection.
    pub fn toggle_one(&self, category_key: &str, metric_key: &str, enabled: bool) -> Selection {
        self.toggle_id(&metric_id(category_key, metric_key), enabled)
    }

    /// `toggle_one` keyed by a full identifier.
    pub fn toggle_id(&self, id: &str, enabled: bool) -> Selection {
        let mut next = self.0.clone();
        if enabled {
            if !self.contains(id) {
                next.push(id.to_string());
            }
        } else {
            next.retain(|selected| selected != id);
        }
        Selection(next)
    }

    /// Apply the same add/remove to every metric of a category.
    /// An unknown category leaves the selection unchanged.
    pub fn toggle_category(
        &self,
        catalog: &MetricCatalog,
        category_key: &str,
        enabled: bool,
    ) -> Selection {
        let Some(category) = catalog.category(category_key) else {
            return self.clone();
        };

        category
            .metric_ids()
            .fold(self.clone(), |acc, id| acc.toggle_id(&id, enabled))
    }

    fn enabled_in_category(
        &self,
        catalog: &MetricCatalog,
        category_key: &str,
    ) -> Option<(usize, usize)> {
        let category = catalog.category(category_key)?;
        let enabled = category
            .metric_ids()
            .filter(|id| self.contains(id))
            .count();
        Some((enabled, category.metrics.len()))
    }

    /// True iff every metric of the category is selected.
    /// Unknown categories are never fully enabled.
    pub fn is_category_fully_enabled(&self, catalog: &MetricCatalog, category_key: &str) -> bool {
        self.enabled_in_category(catalog, category_key)
            .is_some_and(|(enabled, total)| enabled == total)
    }

    /// True iff some, but not all, metrics of the category are selected.
    pub fn is_category_partially_enabled(
        &self,
        catalog: &MetricCatalog,
        category_key: &str,
    ) -> bool {
        self.enabled_in_category(catalog, category_key)
            .is_some_and(|(enabled, total)| enabled > 0 && enabled < total)
    }
}
