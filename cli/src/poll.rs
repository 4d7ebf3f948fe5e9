use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use agentdash_core::compliance::ComplianceStatus;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

pub type Snapshot = Arc<Vec<ComplianceStatus>>;

/// Periodically refreshes an agent's status list in the background.
///
/// Each successful fetch replaces the published snapshot wholesale. A failed
/// fetch is logged and the previous snapshot stays current. Dropping the
/// poller stops the background task.
pub struct StatusPoller {
    snapshots: watch::Receiver<Option<Snapshot>>,
    task: JoinHandle<()>,
}

impl StatusPoller {
    /// Start polling. The first fetch happens immediately.
    pub fn start<F, Fut>(interval: Duration, mut fetch: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<ComplianceStatus>, String>> + Send + 'static,
    {
        let (tx, snapshots) = watch::channel(None);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match fetch().await {
                    Ok(statuses) => {
                        tracing::debug!(entries = statuses.len(), "status snapshot refreshed");
                        if tx.send(Some(Arc::new(statuses))).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "status refresh failed, keeping previous snapshot");
                    }
                }
            }
        });
        Self { snapshots, task }
    }

    /// The most recent snapshot, if any fetch has succeeded yet.
    pub fn latest(&self) -> Option<Snapshot> {
        self.snapshots.borrow().clone()
    }

    /// Wait for the next snapshot. `None` once the poller has stopped.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.snapshots.changed().await.ok()?;
        self.snapshots.borrow_and_update().clone()
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}
