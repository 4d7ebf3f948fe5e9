use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::action::{ActionMessage, Severity, classify};
use crate::catalog::{MetricCatalog, metric_id};
use crate::compliance::{ComplianceStatus, MetricStatus, ResolvedMetricView, resolve};
use crate::selection::Selection;

/// Resolved state of one catalog metric, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MetricReport {
    pub metric: String,
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub view: ResolvedMetricView,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryReport {
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub metrics: Vec<MetricReport>,
}

/// Per-category compliance overview of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ComplianceReport {
    pub categories: Vec<CategoryReport>,
    pub summary: ReportSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportSummary {
    pub passed: usize,
    pub failed: usize,
    pub not_assessed: usize,
    pub not_selected: usize,
    pub other: usize,
    pub critical_actions: usize,
    pub warning_actions: usize,
}

impl ReportSummary {
    fn record(&mut self, report: &MetricReport) {
        match report.view.status {
            MetricStatus::Pass => self.passed += 1,
            MetricStatus::Fail => self.failed += 1,
            MetricStatus::NotAssessed => self.not_assessed += 1,
            MetricStatus::NotSelected => self.not_selected += 1,
            MetricStatus::Other(_) => self.other += 1,
        }
        match report.action.as_ref().map(|a| a.severity) {
            Some(Severity::Critical) => self.critical_actions += 1,
            Some(Severity::Warning) => self.warning_actions += 1,
            None => {}
        }
    }
}

/// Resolve every catalog metric against one selection snapshot and one
/// status snapshot. Selected identifiers missing from the catalog are not
/// visited.
pub fn build_report(
    catalog: &MetricCatalog,
    selection: &Selection,
    statuses: &[ComplianceStatus],
) -> ComplianceReport {
    let mut summary = ReportSummary::default();

    let categories = catalog
        .categories()
        .iter()
        .map(|category| {
            let metrics = category
                .metrics
                .iter()
                .map(|metric| {
                    let view = resolve(selection, statuses, &category.key, &metric.key);
                    let action = classify(view.action_required.as_deref());
                    let report = MetricReport {
                        metric: metric_id(&category.key, &metric.key),
                        key: metric.key.clone(),
                        label: metric.label.clone(),
                        description: metric.description.clone(),
                        view,
                        action,
                    };
                    summary.record(&report);
                    report
                })
                .collect();

            CategoryReport {
                key: category.key.clone(),
                name: category.name.clone(),
                description: category.description.clone(),
                metrics,
            }
        })
        .collect();

    ComplianceReport {
        categories,
        summary,
    }
}
