use std::sync::Arc;
use std::time::Duration;

use agentdash_core::agents::Agent;
use agentdash_core::catalog::MetricCatalog;
use agentdash_core::compliance::ComplianceStatus;
use agentdash_core::report::build_report;
use serde_json::json;

use crate::commands::metrics::catalog_for;
use crate::poll::StatusPoller;
use crate::store::AgentStore;
use crate::util::{Failure, print_json};

/// One render pass: a single selection snapshot against a single status snapshot.
fn render(
    agent: &Agent,
    catalog: &MetricCatalog,
    statuses: &[ComplianceStatus],
) -> serde_json::Value {
    let report = build_report(catalog, &agent.metrics, statuses);
    if report.summary.critical_actions > 0 {
        tracing::warn!(
            agent_id = %agent.agent_id,
            critical_actions = report.summary.critical_actions,
            "agent has metrics requiring it to be stopped"
        );
    }
    json!({
        "agent_id": agent.agent_id,
        "name": agent.name,
        "report": report,
        "generated_at": chrono::Utc::now(),
    })
}

pub async fn run(store: &AgentStore, agent_id: &str, watch: bool, interval: Duration) -> i32 {
    match show(store, agent_id, watch, interval).await {
        Ok(()) => 0,
        Err(failure) => failure.report(),
    }
}

async fn show(
    store: &AgentStore,
    agent_id: &str,
    watch: bool,
    interval: Duration,
) -> Result<(), Failure> {
    if interval.is_zero() {
        return Err(Failure::usage("--interval-secs must be at least 1"));
    }

    let catalog = catalog_for(store).await?;
    let agent = store.get(agent_id).await?;

    if !watch {
        let statuses = store.statuses(agent_id).await?;
        print_json(&render(&agent, &catalog, &statuses));
        return Ok(());
    }

    let fetch_store = Arc::new(store.clone());
    let fetch_id = agent_id.to_string();
    let mut poller = StatusPoller::start(interval, move || {
        let store = fetch_store.clone();
        let agent_id = fetch_id.clone();
        async move {
            store
                .statuses(&agent_id)
                .await
                .map_err(|failure| failure.body.to_string())
        }
    });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            snapshot = poller.next() => match snapshot {
                // One JSON document per line so the stream can be piped.
                Some(statuses) => println!("{}", render(&agent, &catalog, &statuses)),
                None => break,
            },
            _ = &mut ctrl_c => break,
        }
    }
    Ok(())
}
