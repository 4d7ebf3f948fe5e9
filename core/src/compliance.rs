use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::action::ACTION_NONE;
use crate::catalog::metric_id;
use crate::selection::Selection;

pub const STATUS_PASS: &str = "PASS";
pub const STATUS_FAIL: &str = "FAIL";
pub const STATUS_NOT_SELECTED: &str = "NOT_SELECTED";
pub const STATUS_NOT_ASSESSED: &str = "NOT_ASSESSED";

/// Verdict for one metric as reported by the workflow backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ComplianceStatus {
    /// Metric identifier, `"{category}:{metric}"`
    pub metric: String,
    /// `PASS`, `FAIL` or any other backend-defined value
    pub status: String,
    /// `NONE`, `NOTIFY`, `STOP` or any other backend-defined code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_required: Option<String>,
}

/// A backend status list after dropping the entries that could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusList {
    pub entries: Vec<ComplianceStatus>,
    /// Entries that were not a `{metric, status}` record
    pub skipped: usize,
}

impl StatusList {
    /// Decode entry by entry so one malformed record cannot hide the rest.
    ///
    /// `null` is an empty list; any other non-array counts as one skipped
    /// entry.
    pub fn from_value(value: serde_json::Value) -> Self {
        let items = match value {
            serde_json::Value::Null => return Self::default(),
            serde_json::Value::Array(items) => items,
            _ => {
                return Self {
                    entries: Vec::new(),
                    skipped: 1,
                };
            }
        };

        let mut list = Self::default();
        for item in items {
            match serde_json::from_value::<ComplianceStatus>(item) {
                Ok(entry) => list.entries.push(entry),
                Err(_) => list.skipped += 1,
            }
        }
        list
    }
}

/// Display state of one metric.
///
/// Backend vocabulary outside `PASS`/`FAIL` is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MetricStatus {
    NotSelected,
    NotAssessed,
    Pass,
    Fail,
    Other(String),
}

impl MetricStatus {
    /// Interpret a raw backend status. Only `PASS` and `FAIL` are known.
    pub fn from_backend(raw: &str) -> Self {
        match raw {
            STATUS_PASS => Self::Pass,
            STATUS_FAIL => Self::Fail,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::NotSelected => STATUS_NOT_SELECTED,
            Self::NotAssessed => STATUS_NOT_ASSESSED,
            Self::Pass => STATUS_PASS,
            Self::Fail => STATUS_FAIL,
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for MetricStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            STATUS_NOT_SELECTED => Self::NotSelected,
            STATUS_NOT_ASSESSED => Self::NotAssessed,
            _ => Self::from_backend(&raw),
        }
    }
}

impl From<MetricStatus> for String {
    fn from(status: MetricStatus) -> Self {
        match status {
            MetricStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived, never-persisted display record for one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResolvedMetricView {
    #[schema(value_type = String, example = "FAIL")]
    pub status: MetricStatus,
    pub label: String,
    pub action_required: Option<String>,
}

impl ResolvedMetricView {
    fn not_selected() -> Self {
        Self {
            status: MetricStatus::NotSelected,
            label: "Not Selected".to_string(),
            action_required: None,
        }
    }

    fn not_assessed() -> Self {
        Self {
            status: MetricStatus::NotAssessed,
            label: "Not Assessed".to_string(),
            action_required: None,
        }
    }
}

/// Resolve the display state of `category:metric`.
///
/// Reads exactly the `selection` and `statuses` it is handed; callers that
/// refresh the status list concurrently must pass one snapshot per call.
pub fn resolve(
    selection: &Selection,
    statuses: &[ComplianceStatus],
    category_key: &str,
    metric_key: &str,
) -> ResolvedMetricView {
    let id = metric_id(category_key, metric_key);

    // Withdrawn selection masks any stale verdict.
    if !selection.contains(&id) {
        return ResolvedMetricView::not_selected();
    }

    let Some(entry) = statuses.iter().find(|s| s.metric == id) else {
        return ResolvedMetricView::not_assessed();
    };

    let action_required = entry
        .action_required
        .as_deref()
        .filter(|code| !code.is_empty() && *code != ACTION_NONE)
        .map(str::to_string);

    ResolvedMetricView {
        status: MetricStatus::from_backend(&entry.status),
        label: entry.status.clone(),
        action_required,
    }
}
