use agentdash_core::agents::{
    ActionType, Agent, CreateAgentInput, Execution, ImpactLevel, RealTimeClass, UpdateAgentInput,
    generate_execution_id,
};
use agentdash_core::catalog::{MetricCatalog, split_metric_id};
use agentdash_core::selection::Selection;
use clap::{Args, Subcommand};
use serde_json::json;

use crate::commands::metrics::catalog_for;
use crate::store::AgentStore;
use crate::util::{Failure, print_json};

#[derive(Subcommand)]
pub enum AgentCommands {
    /// List agents with enabled/total metric counts
    List,
    /// Show one agent record
    Get {
        /// Agent id
        id: String,
    },
    /// Create an agent. Every catalog metric starts enabled.
    Create(CreateArgs),
    /// Update fields of an agent. Toggles apply to its current selection.
    Update(UpdateArgs),
    /// Delete an agent
    Delete {
        /// Agent id
        id: String,
    },
}

/// Metric selection toggles. Category toggles apply before single metrics.
#[derive(Args, Default, Clone)]
pub struct SelectionArgs {
    /// Enable a metric (repeatable: category:metric)
    #[arg(long = "enable", value_name = "CATEGORY:METRIC")]
    pub enable: Vec<String>,
    /// Disable a metric (repeatable: category:metric)
    #[arg(long = "disable", value_name = "CATEGORY:METRIC")]
    pub disable: Vec<String>,
    /// Enable every metric of a category (repeatable)
    #[arg(long = "enable-category", value_name = "CATEGORY")]
    pub enable_category: Vec<String>,
    /// Disable every metric of a category (repeatable)
    #[arg(long = "disable-category", value_name = "CATEGORY")]
    pub disable_category: Vec<String>,
}

impl SelectionArgs {
    pub fn is_empty(&self) -> bool {
        self.enable.is_empty()
            && self.disable.is_empty()
            && self.enable_category.is_empty()
            && self.disable_category.is_empty()
    }

    /// Apply the toggles to `selection`.
    ///
    /// Enabling requires a catalog metric. Disabling accepts any well-formed
    /// identifier so orphans left by catalog revisions can be cleared.
    pub fn apply(&self, catalog: &MetricCatalog, selection: Selection) -> Result<Selection, String> {
        let mut selection = selection;

        for (keys, enabled) in [(&self.enable_category, true), (&self.disable_category, false)] {
            for key in keys {
                if catalog.category(key).is_none() {
                    return Err(format!("Unknown metric category `{key}`"));
                }
                selection = selection.toggle_category(catalog, key, enabled);
            }
        }

        for id in &self.enable {
            let Some((category, metric)) = split_metric_id(id) else {
                return Err(format!("Metric `{id}` must be written as category:metric"));
            };
            if catalog.metric(category, metric).is_none() {
                return Err(format!("Unknown metric `{id}`"));
            }
            selection = selection.toggle_one(category, metric, true);
        }

        for id in &self.disable {
            if split_metric_id(id).is_none() {
                return Err(format!("Metric `{id}` must be written as category:metric"));
            }
            selection = selection.toggle_id(id, false);
        }

        Ok(selection)
    }
}

/// Parse a classification value by its wire name, e.g. `high` or `Near Real Time`.
fn parse_wire<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| format!("unknown value `{raw}`"))
}

/// Parse `value[=label]` execution references, assigning fresh ids.
fn parse_executions(raw: &[String]) -> Result<Vec<Execution>, String> {
    let now = chrono::Utc::now();
    raw.iter()
        .enumerate()
        .map(|(i, item)| {
            let (value, label) = match item.split_once('=') {
                Some((value, label)) => (value.trim(), Some(label.trim().to_string())),
                None => (item.trim(), None),
            };
            if value.is_empty() {
                return Err(format!("Execution `{item}` has an empty value"));
            }
            Ok(Execution {
                id: generate_execution_id(now + chrono::Duration::milliseconds(i as i64)),
                value: value.to_string(),
                label: label.filter(|l| !l.is_empty()),
            })
        })
        .collect()
}

#[derive(Args)]
pub struct AgentFieldArgs {
    /// Free-text description
    #[arg(long)]
    pub description: Option<String>,
    /// Workflow id in the automation backend
    #[arg(long)]
    pub workflow_id: Option<String>,
    /// Impact level: low, medium or high
    #[arg(long, value_parser = parse_wire::<ImpactLevel>)]
    pub impact_level: Option<ImpactLevel>,
    /// Real-time class: "Real Time", "Near Real Time" or "Not Real Time"
    #[arg(long, value_parser = parse_wire::<RealTimeClass>)]
    pub real_time_class: Option<RealTimeClass>,
    /// Action type, e.g. "Decision Support" or "Execution / Automation"
    #[arg(long, value_parser = parse_wire::<ActionType>)]
    pub action_type: Option<ActionType>,
    #[arg(long)]
    pub llm_calls: Option<u64>,
    #[arg(long)]
    pub api_calls: Option<u64>,
    #[arg(long)]
    pub error_points_identified: Option<u64>,
    #[arg(long)]
    pub error_points_implemented: Option<u64>,
    /// Execution reference (repeatable: value[=label]). Replaces the list on update.
    #[arg(long = "execution", value_name = "VALUE[=LABEL]")]
    pub executions: Vec<String>,
    #[command(flatten)]
    pub selection: SelectionArgs,
}

#[derive(Args)]
pub struct CreateArgs {
    /// Agent name
    #[arg(long)]
    pub name: String,
    /// Explicit agent id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,
    /// Create the agent switched off
    #[arg(long)]
    pub inactive: bool,
    #[command(flatten)]
    pub fields: AgentFieldArgs,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Agent id
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    /// Switch the agent on
    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,
    /// Switch the agent off
    #[arg(long)]
    pub inactive: bool,
    #[command(flatten)]
    pub fields: AgentFieldArgs,
}

pub async fn run(store: &AgentStore, command: AgentCommands) -> i32 {
    let result = match command {
        AgentCommands::List => list(store).await,
        AgentCommands::Get { id } => store.get(&id).await.map(|agent| json!(agent)),
        AgentCommands::Create(args) => create(store, args).await,
        AgentCommands::Update(args) => update(store, args).await,
        AgentCommands::Delete { id } => store.delete(&id).await,
    };

    match result {
        Ok(value) => {
            print_json(&value);
            0
        }
        Err(failure) => failure.report(),
    }
}

fn list_row(agent: &Agent, catalog: &MetricCatalog) -> serde_json::Value {
    json!({
        "agent_id": agent.agent_id,
        "name": agent.name,
        "status": if agent.status { "active" } else { "inactive" },
        "impact_level": agent.impact_level,
        "metrics": agent.metrics_count(catalog),
    })
}

async fn list(store: &AgentStore) -> Result<serde_json::Value, Failure> {
    let catalog = catalog_for(store).await?;
    let agents = store.list().await?;
    let rows: Vec<_> = agents.iter().map(|a| list_row(a, &catalog)).collect();
    Ok(json!(rows))
}

fn build_create_input(
    args: CreateArgs,
    catalog: &MetricCatalog,
) -> Result<(Option<String>, CreateAgentInput), String> {
    let fields = args.fields;
    let mut input = CreateAgentInput::new(args.name, catalog);
    input.status = !args.inactive;
    input.description = fields.description.unwrap_or_default();
    input.workflow_id = fields.workflow_id.unwrap_or_default();
    input.executions = parse_executions(&fields.executions)?;
    input.metrics = fields.selection.apply(catalog, input.metrics)?;
    if let Some(level) = fields.impact_level {
        input.impact_level = level;
    }
    if let Some(class) = fields.real_time_class {
        input.real_time_class = class;
    }
    if let Some(action_type) = fields.action_type {
        input.action_type = action_type;
    }
    input.llm_calls = fields.llm_calls.unwrap_or_default();
    input.api_calls = fields.api_calls.unwrap_or_default();
    input.error_points_identified = fields.error_points_identified.unwrap_or_default();
    input.error_points_implemented = fields.error_points_implemented.unwrap_or_default();

    input.validate().map_err(|field| format!("{field} must not be empty"))?;
    Ok((args.id, input))
}

async fn create(store: &AgentStore, args: CreateArgs) -> Result<serde_json::Value, Failure> {
    let catalog = catalog_for(store).await?;
    let (agent_id, input) = build_create_input(args, &catalog).map_err(Failure::usage)?;
    store.create(agent_id, input).await
}

/// Everything in `args` except selection toggles, which need the current record.
fn build_update(args: &UpdateArgs) -> Result<UpdateAgentInput, String> {
    let fields = &args.fields;
    let status = match (args.active, args.inactive) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let executions = if fields.executions.is_empty() {
        None
    } else {
        Some(parse_executions(&fields.executions)?)
    };

    Ok(UpdateAgentInput {
        agent_id: args.id.clone(),
        name: args.name.clone(),
        description: fields.description.clone(),
        status,
        workflow_id: fields.workflow_id.clone(),
        executions,
        metrics: None,
        impact_level: fields.impact_level,
        real_time_class: fields.real_time_class,
        action_type: fields.action_type,
        llm_calls: fields.llm_calls,
        api_calls: fields.api_calls,
        error_points_identified: fields.error_points_identified,
        error_points_implemented: fields.error_points_implemented,
    })
}

async fn update(store: &AgentStore, args: UpdateArgs) -> Result<serde_json::Value, Failure> {
    let mut update = build_update(&args).map_err(Failure::usage)?;

    if !args.fields.selection.is_empty() {
        let catalog = catalog_for(store).await?;
        let current = store.get(&args.id).await?;
        let metrics = args
            .fields
            .selection
            .apply(&catalog, current.metrics)
            .map_err(Failure::usage)?;
        update.metrics = Some(metrics);
    }

    let unchanged = UpdateAgentInput {
        agent_id: update.agent_id.clone(),
        ..Default::default()
    };
    if update == unchanged {
        return Err(Failure::usage("Nothing to update. Pass at least one field flag."));
    }

    store.update(update).await
}

#[cfg(test)]
mod tests {
    use agentdash_core::agents::{ImpactLevel, RealTimeClass};
    use agentdash_core::catalog::MetricCatalog;
    use agentdash_core::selection::Selection;
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: AgentCommands,
    }

    fn parse(args: &[&str]) -> AgentCommands {
        TestCli::try_parse_from(std::iter::once("agents").chain(args.iter().copied()))
            .expect("arguments should parse")
            .command
    }

    #[test]
    fn category_toggles_apply_before_single_metrics() {
        let catalog = MetricCatalog::builtin();
        let toggles = SelectionArgs {
            disable_category: vec!["resilience".to_string()],
            enable: vec!["resilience:latency".to_string()],
            ..Default::default()
        };
        let selection = toggles
            .apply(catalog, catalog.default_selection())
            .expect("toggles should apply");
        assert!(selection.has("resilience", "latency"));
        assert!(selection.is_category_partially_enabled(catalog, "resilience"));
        assert!(selection.is_category_fully_enabled(catalog, "transparency"));
    }

    #[test]
    fn enabling_unknown_metric_is_rejected_but_disabling_orphan_is_allowed() {
        let catalog = MetricCatalog::builtin();
        let enable = SelectionArgs {
            enable: vec!["resilience:teleport".to_string()],
            ..Default::default()
        };
        assert!(enable.apply(catalog, Selection::empty()).is_err());

        let orphaned = Selection::from(vec!["legacy:old_metric".to_string()]);
        let disable = SelectionArgs {
            disable: vec!["legacy:old_metric".to_string()],
            ..Default::default()
        };
        assert!(disable.apply(catalog, orphaned).expect("apply").is_empty());
    }

    #[test]
    fn malformed_identifiers_and_unknown_categories_are_rejected() {
        let catalog = MetricCatalog::builtin();
        let bad_id = SelectionArgs {
            disable: vec!["latency".to_string()],
            ..Default::default()
        };
        assert!(bad_id.apply(catalog, Selection::empty()).is_err());

        let bad_category = SelectionArgs {
            enable_category: vec!["astrology".to_string()],
            ..Default::default()
        };
        assert!(bad_category.apply(catalog, Selection::empty()).is_err());
    }

    #[test]
    fn executions_parse_value_and_optional_label() {
        let executions = parse_executions(&[
            "run-17=Nightly batch".to_string(),
            "run-18".to_string(),
        ])
        .expect("executions should parse");
        assert_eq!(executions[0].value, "run-17");
        assert_eq!(executions[0].label.as_deref(), Some("Nightly batch"));
        assert_eq!(executions[1].label, None);
        assert!(executions[0].id.starts_with("exec_"));
        assert_ne!(executions[0].id, executions[1].id);

        assert!(parse_executions(&["=label".to_string()]).is_err());
    }

    #[test]
    fn create_flags_build_full_input() {
        let AgentCommands::Create(args) = parse(&[
            "create",
            "--name",
            "Claims triage",
            "--inactive",
            "--impact-level",
            "high",
            "--real-time-class",
            "Near Real Time",
            "--llm-calls",
            "4",
            "--disable-category",
            "accountability",
        ]) else {
            panic!("expected create");
        };
        let catalog = MetricCatalog::builtin();
        let (id, input) = build_create_input(args, catalog).expect("input should build");
        assert_eq!(id, None);
        assert!(!input.status);
        assert_eq!(input.impact_level, ImpactLevel::High);
        assert_eq!(input.real_time_class, RealTimeClass::NearRealTime);
        assert_eq!(input.llm_calls, 4);
        assert_eq!(input.metrics.len(), catalog.metric_count() - 4);
        assert!(!input.metrics.has("accountability", "privacy"));
    }

    #[test]
    fn unknown_classification_value_fails_to_parse() {
        let result = TestCli::try_parse_from([
            "agents",
            "create",
            "--name",
            "x",
            "--impact-level",
            "extreme",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn update_sends_only_given_fields() {
        let AgentCommands::Update(args) =
            parse(&["update", "agent_1", "--active", "--description", "Reviewed"])
        else {
            panic!("expected update");
        };
        let update = build_update(&args).expect("update should build");
        assert_eq!(update.agent_id, "agent_1");
        assert_eq!(update.status, Some(true));
        assert_eq!(update.description.as_deref(), Some("Reviewed"));
        assert_eq!(update.name, None);
        assert_eq!(update.metrics, None);
    }

    #[tokio::test]
    async fn update_without_fields_is_a_usage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AgentStore::Local(crate::store::LocalStore::new(dir.path().join("a.json")));
        let AgentCommands::Update(args) = parse(&["update", "agent_1"]) else {
            panic!("expected update");
        };
        let failure = update(&store, args).await.unwrap_err();
        assert_eq!(failure.code, 4);
    }

    #[tokio::test]
    async fn local_update_toggles_current_selection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AgentStore::Local(crate::store::LocalStore::new(dir.path().join("a.json")));
        let AgentCommands::Create(args) = parse(&[
            "create",
            "--id",
            "agent_1",
            "--name",
            "Bot",
            "--disable-category",
            "resilience",
        ]) else {
            panic!("expected create");
        };
        create(&store, args).await.expect("create");

        let AgentCommands::Update(args) =
            parse(&["update", "agent_1", "--enable", "resilience:latency"])
        else {
            panic!("expected update");
        };
        let updated = update(&store, args).await.expect("update");
        let metrics: Vec<String> =
            serde_json::from_value(updated["metrics"].clone()).expect("metrics array");
        assert!(metrics.contains(&"resilience:latency".to_string()));
        assert!(!metrics.contains(&"resilience:error_fallbacks".to_string()));
        assert_eq!(metrics.len(), 13);
    }
}
