use std::collections::HashSet;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::CatalogError;
use crate::selection::Selection;

/// Separator between category key and metric key in a metric identifier.
pub const METRIC_ID_SEPARATOR: char = ':';

/// One assessable metric inside a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MetricDefinition {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A named group of metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MetricCategory {
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub metrics: Vec<MetricDefinition>,
}

impl MetricCategory {
    /// Metric identifiers of this category, in metric order.
    pub fn metric_ids(&self) -> impl Iterator<Item = String> + '_ {
        self.metrics.iter().map(|m| metric_id(&self.key, &m.key))
    }
}

/// Build the canonical `"{category}:{metric}"` identifier.
pub fn metric_id(category_key: &str, metric_key: &str) -> String {
    format!("{category_key}{METRIC_ID_SEPARATOR}{metric_key}")
}

/// Split an identifier into `(category, metric)`.
/// Returns `None` when the separator is missing.
pub fn split_metric_id(id: &str) -> Option<(&str, &str)> {
    id.split_once(METRIC_ID_SEPARATOR)
}

/// Ordered, immutable set of metric categories.
///
/// Stored selections reference metrics by identifier string, so removing a
/// key from a catalog orphans those selections. Orphaned identifiers are
/// never an error; catalog-driven iteration simply never visits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MetricCatalog {
    categories: Vec<MetricCategory>,
}

impl MetricCatalog {
    /// Build a catalog, rejecting empty, duplicate or separator-bearing keys.
    pub fn new(categories: Vec<MetricCategory>) -> Result<Self, CatalogError> {
        let mut seen_categories = HashSet::new();
        for category in &categories {
            if category.key.is_empty() {
                return Err(CatalogError::EmptyCategoryKey);
            }
            if category.key.contains(METRIC_ID_SEPARATOR) {
                return Err(CatalogError::SeparatorInKey(category.key.clone()));
            }
            if !seen_categories.insert(category.key.as_str()) {
                return Err(CatalogError::DuplicateCategory(category.key.clone()));
            }

            let mut seen_metrics = HashSet::new();
            for metric in &category.metrics {
                if metric.key.is_empty() {
                    return Err(CatalogError::EmptyMetricKey {
                        category: category.key.clone(),
                    });
                }
                if metric.key.contains(METRIC_ID_SEPARATOR) {
                    return Err(CatalogError::SeparatorInKey(metric.key.clone()));
                }
                if !seen_metrics.insert(metric.key.as_str()) {
                    return Err(CatalogError::DuplicateMetric {
                        category: category.key.clone(),
                        metric: metric.key.clone(),
                    });
                }
            }
        }

        Ok(Self { categories })
    }

    /// Parse a catalog from a JSON array of categories.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let categories: Vec<MetricCategory> =
            serde_json::from_str(raw).map_err(|e| CatalogError::Json(e.to_string()))?;
        Self::new(categories)
    }

    /// The catalog shipped with the dashboard.
    pub fn builtin() -> &'static MetricCatalog {
        &BUILTIN
    }

    pub fn categories(&self) -> &[MetricCategory] {
        &self.categories
    }

    pub fn category(&self, key: &str) -> Option<&MetricCategory> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn metric(&self, category_key: &str, metric_key: &str) -> Option<&MetricDefinition> {
        self.category(category_key)?
            .metrics
            .iter()
            .find(|m| m.key == metric_key)
    }

    /// Whether `id` names a metric of this catalog.
    pub fn contains(&self, id: &str) -> bool {
        split_metric_id(id).is_some_and(|(c, m)| self.metric(c, m).is_some())
    }

    /// Every metric identifier, in category order then metric order.
    pub fn all_metric_keys(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(MetricCategory::metric_ids)
            .collect()
    }

    pub fn metric_count(&self) -> usize {
        self.categories.iter().map(|c| c.metrics.len()).sum()
    }

    /// Selection for a newly created agent: every metric enabled.
    pub fn default_selection(&self) -> Selection {
        Selection::from(self.all_metric_keys())
    }
}

type BuiltinCategory = (
    &'static str,
    &'static str,
    &'static str,
    &'static [(&'static str, &'static str, &'static str)],
);

const BUILTIN_CATEGORIES: &[BuiltinCategory] = &[
    (
        "resilience",
        "Resilience",
        "Measures the agent's ability to handle errors and maintain performance",
        &[
            (
                "error_fallbacks",
                "Error Fallbacks",
                "Ability to handle and recover from errors",
            ),
            ("latency", "Latency", "Response time performance"),
            ("failure_rate", "Failure Rate", "Frequency of task failures"),
            (
                "availability",
                "Availability",
                "System uptime and accessibility",
            ),
        ],
    ),
    (
        "hallucination_control",
        "Hallucination Control",
        "Measures the agent's accuracy and truthfulness",
        &[
            (
                "hallucination_of_expected_outcomes",
                "Hallucination of Expected Outcomes",
                "Accuracy of predicted outcomes",
            ),
            (
                "factual_hallucination",
                "Factual Hallucination",
                "Accuracy of factual information",
            ),
            (
                "context_switch_hallucination",
                "Context Switch Hallucination",
                "Consistency during context changes",
            ),
            (
                "severity_of_hallucination",
                "Severity of Hallucination",
                "Impact level of inaccuracies",
            ),
        ],
    ),
    (
        "transparency",
        "Transparency",
        "Measures the agent's openness and explainability",
        &[
            (
                "operational_transparency",
                "Operational Transparency",
                "Visibility into agent operations",
            ),
            ("bias", "Bias", "Fairness and neutrality in outputs"),
            (
                "version_control",
                "Version Control",
                "Tracking of model and system versions",
            ),
            (
                "interpretability",
                "Interpretability (Model Transparency)",
                "Ability to explain decisions",
            ),
            (
                "traceability",
                "Traceability",
                "Ability to trace actions and decisions",
            ),
        ],
    ),
    (
        "accountability",
        "Accountability",
        "Measures the agent's adherence to guidelines and responsibility",
        &[
            (
                "guideline_adherence",
                "Guideline Adherence",
                "Compliance with established guidelines",
            ),
            ("hitl_coverage", "HITL Coverage", "Human-in-the-loop oversight"),
            ("privacy", "Privacy", "Protection of sensitive information"),
        ],
    ),
];

static BUILTIN: LazyLock<MetricCatalog> = LazyLock::new(|| MetricCatalog {
    categories: BUILTIN_CATEGORIES
        .iter()
        .map(|(key, name, description, metrics)| MetricCategory {
            key: (*key).to_string(),
            name: (*name).to_string(),
            description: Some((*description).to_string()),
            metrics: metrics
                .iter()
                .map(|(key, label, description)| MetricDefinition {
                    key: (*key).to_string(),
                    label: (*label).to_string(),
                    description: Some((*description).to_string()),
                })
                .collect(),
        })
        .collect(),
});

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{MetricCatalog, MetricCategory, MetricDefinition, metric_id, split_metric_id};
    use crate::error::CatalogError;

    fn category(key: &str, metrics: &[&str]) -> MetricCategory {
        MetricCategory {
            key: key.to_string(),
            name: key.to_string(),
            description: None,
            metrics: metrics
                .iter()
                .map(|m| MetricDefinition {
                    key: m.to_string(),
                    label: m.to_string(),
                    description: None,
                })
                .collect(),
        }
    }

    #[test]
    fn builtin_catalog_passes_validation() {
        let builtin = MetricCatalog::builtin();
        let rebuilt = MetricCatalog::new(builtin.categories().to_vec());
        assert_eq!(rebuilt.as_ref(), Ok(builtin));
        assert_eq!(builtin.categories().len(), 4);
        assert_eq!(builtin.metric_count(), 16);
    }

    #[test]
    fn all_metric_keys_lists_every_metric_exactly_once_in_order() {
        let catalog = MetricCatalog::builtin();
        let keys = catalog.all_metric_keys();

        assert_eq!(keys.len(), catalog.metric_count());
        let unique: HashSet<&String> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());

        for category in catalog.categories() {
            for metric in &category.metrics {
                let id = metric_id(&category.key, &metric.key);
                assert_eq!(keys.iter().filter(|k| **k == id).count(), 1);
            }
        }

        assert_eq!(keys.first().map(String::as_str), Some("resilience:error_fallbacks"));
        assert_eq!(keys.last().map(String::as_str), Some("accountability:privacy"));
    }

    #[test]
    fn default_selection_equals_all_metric_keys() {
        let catalog = MetricCatalog::new(vec![
            category("alpha", &["one", "two"]),
            category("beta", &["three"]),
        ])
        .unwrap();

        let selection = catalog.default_selection();
        assert_eq!(selection.as_slice(), catalog.all_metric_keys().as_slice());
        assert_eq!(
            selection.as_slice(),
            &["alpha:one", "alpha:two", "beta:three"]
        );
    }

    #[test]
    fn lookup_finds_metrics_and_ignores_orphans() {
        let catalog = MetricCatalog::builtin();
        assert_eq!(
            catalog.metric("resilience", "latency").map(|m| m.label.as_str()),
            Some("Latency")
        );
        assert!(catalog.contains("transparency:bias"));
        assert!(!catalog.contains("transparency:removed_metric"));
        assert!(!catalog.contains("no-separator"));
        assert!(catalog.category("unknown").is_none());
    }

    #[test]
    fn split_metric_id_uses_first_separator() {
        assert_eq!(split_metric_id("a:b"), Some(("a", "b")));
        assert_eq!(split_metric_id("a:b:c"), Some(("a", "b:c")));
        assert_eq!(split_metric_id("ab"), None);
    }

    #[test]
    fn new_rejects_duplicate_and_malformed_keys() {
        assert_eq!(
            MetricCatalog::new(vec![category("a", &["x"]), category("a", &["y"])]),
            Err(CatalogError::DuplicateCategory("a".to_string()))
        );
        assert_eq!(
            MetricCatalog::new(vec![category("a", &["x", "x"])]),
            Err(CatalogError::DuplicateMetric {
                category: "a".to_string(),
                metric: "x".to_string()
            })
        );
        assert_eq!(
            MetricCatalog::new(vec![category("a:b", &["x"])]),
            Err(CatalogError::SeparatorInKey("a:b".to_string()))
        );
        assert_eq!(
            MetricCatalog::new(vec![category("", &["x"])]),
            Err(CatalogError::EmptyCategoryKey)
        );
    }

    #[test]
    fn from_json_str_parses_optional_descriptions() {
        let catalog = MetricCatalog::from_json_str(
            r#"[{"key":"ops","name":"Ops","metrics":[{"key":"uptime","label":"Uptime"}]}]"#,
        )
        .unwrap();
        assert_eq!(catalog.all_metric_keys(), vec!["ops:uptime".to_string()]);
        assert!(catalog.categories()[0].description.is_none());

        assert!(matches!(
            MetricCatalog::from_json_str("{"),
            Err(CatalogError::Json(_))
        ));
    }
}
