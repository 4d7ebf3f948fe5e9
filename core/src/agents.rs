use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::catalog::MetricCatalog;
use crate::selection::Selection;

/// One workflow execution reference attached to an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Execution {
    pub id: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RealTimeClass {
    #[serde(rename = "Real Time")]
    RealTime,
    #[serde(rename = "Near Real Time")]
    NearRealTime,
    #[default]
    #[serde(rename = "Not Real Time")]
    NotRealTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ActionType {
    #[serde(rename = "Live Chatbot")]
    LiveChatbot,
    #[default]
    #[serde(rename = "Decision Support")]
    DecisionSupport,
    #[serde(rename = "Guidance / Instruction")]
    GuidanceInstruction,
    #[serde(rename = "Predictions / Scoring")]
    PredictionsScoring,
    #[serde(rename = "Execution / Automation")]
    ExecutionAutomation,
    #[serde(rename = "Personalised Profiling")]
    PersonalisedProfiling,
}

/// An AI agent record as stored by the workflow backend.
///
/// Classification fields are optional because records created before they
/// existed do not carry them. Apart from `agent_id`, a field the backend
/// sends with the wrong shape reads as its default, and unknown
/// classification values read as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Agent {
    pub agent_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub status: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub workflow_id: String,
    #[serde(default, deserialize_with = "lossy_vec")]
    pub executions: Vec<Execution>,
    #[serde(default, deserialize_with = "lossy_selection")]
    pub metrics: Selection,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub impact_level: Option<ImpactLevel>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub real_time_class: Option<RealTimeClass>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub action_type: Option<ActionType>,
    #[serde(default, deserialize_with = "lenient")]
    pub llm_calls: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub api_calls: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub error_points_identified: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub error_points_implemented: u64,
}

/// The part of an agent record compliance resolution reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AgentSelection {
    #[serde(default, deserialize_with = "lenient")]
    pub agent_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lossy_selection")]
    pub metrics: Selection,
}

impl AgentSelection {
    /// Never fails: anything that is not an agent object selects nothing.
    pub fn from_value(value: &serde_json::Value) -> Self {
        Self::deserialize(value).unwrap_or_default()
    }
}

/// `null` or a value of the wrong shape reads as `T::default()`.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default())
}

/// Keeps the array entries that decode as `T` and drops the rest.
fn lossy_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lossy_selection<'de, D>(deserializer: D) -> Result<Selection, D::Error>
where
    D: Deserializer<'de>,
{
    lossy_vec::<D, String>(deserializer).map(Selection::from)
}

/// Enabled versus available metrics, as shown in agent lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MetricsCount {
    pub enabled: usize,
    pub total: usize,
}

impl Agent {
    pub fn metrics_count(&self, catalog: &MetricCatalog) -> MetricsCount {
        MetricsCount {
            enabled: self.metrics.len(),
            total: catalog.metric_count(),
        }
    }
}

/// Payload for creating an agent. The id is assigned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreateAgentInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub status: bool,
    #[serde(default)]
    pub workflow_id: String,
    #[serde(default)]
    pub executions: Vec<Execution>,
    #[serde(default)]
    pub metrics: Selection,
    #[serde(default)]
    pub impact_level: ImpactLevel,
    #[serde(default)]
    pub real_time_class: RealTimeClass,
    #[serde(default)]
    pub action_type: ActionType,
    #[serde(default)]
    pub llm_calls: u64,
    #[serde(default)]
    pub api_calls: u64,
    #[serde(default)]
    pub error_points_identified: u64,
    #[serde(default)]
    pub error_points_implemented: u64,
}

fn default_true() -> bool {
    true
}

impl CreateAgentInput {
    /// A new, active agent with every catalog metric enabled.
    pub fn new(name: impl Into<String>, catalog: &MetricCatalog) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            status: true,
            workflow_id: String::new(),
            executions: Vec::new(),
            metrics: catalog.default_selection(),
            impact_level: ImpactLevel::default(),
            real_time_class: RealTimeClass::default(),
            action_type: ActionType::default(),
            llm_calls: 0,
            api_calls: 0,
            error_points_identified: 0,
            error_points_implemented: 0,
        }
    }

    /// Returns the offending field name when the input is unusable.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name");
        }
        Ok(())
    }

    pub fn into_agent(self, agent_id: String) -> Agent {
        Agent {
            agent_id,
            name: self.name,
            description: self.description,
            status: self.status,
            workflow_id: self.workflow_id,
            executions: self.executions,
            metrics: self.metrics,
            impact_level: Some(self.impact_level),
            real_time_class: Some(self.real_time_class),
            action_type: Some(self.action_type),
            llm_calls: self.llm_calls,
            api_calls: self.api_calls,
            error_points_identified: self.error_points_identified,
            error_points_implemented: self.error_points_implemented,
        }
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdateAgentInput {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executions: Option<Vec<Execution>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Selection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_level: Option<ImpactLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_time_class: Option<RealTimeClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<ActionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_calls: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_calls: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_points_identified: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_points_implemented: Option<u64>,
}

impl UpdateAgentInput {
    pub fn apply_to(self, agent: &mut Agent) {
        if let Some(name) = self.name {
            agent.name = name;
        }
        if let Some(description) = self.description {
            agent.description = description;
        }
        if let Some(status) = self.status {
            agent.status = status;
        }
        if let Some(workflow_id) = self.workflow_id {
            agent.workflow_id = workflow_id;
        }
        if let Some(executions) = self.executions {
            agent.executions = executions;
        }
        if let Some(metrics) = self.metrics {
            agent.metrics = metrics;
        }
        if self.impact_level.is_some() {
            agent.impact_level = self.impact_level;
        }
        if self.real_time_class.is_some() {
            agent.real_time_class = self.real_time_class;
        }
        if self.action_type.is_some() {
            agent.action_type = self.action_type;
        }
        if let Some(llm_calls) = self.llm_calls {
            agent.llm_calls = llm_calls;
        }
        if let Some(api_calls) = self.api_calls {
            agent.api_calls = api_calls;
        }
        if let Some(identified) = self.error_points_identified {
            agent.error_points_identified = identified;
        }
        if let Some(implemented) = self.error_points_implemented {
            agent.error_points_implemented = implemented;
        }
    }
}

/// Agent ids are `agent_` + unix milliseconds.
pub fn generate_agent_id(now: DateTime<Utc>) -> String {
    format!("agent_{}", now.timestamp_millis())
}

/// Execution ids are `exec_` + unix milliseconds.
pub fn generate_execution_id(now: DateTime<Utc>) -> String {
    format!("exec_{}", now.timestamp_millis())
}
