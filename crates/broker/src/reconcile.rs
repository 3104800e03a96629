//! Background deployment reconciliation.
//!
//! Once a deployment is created its job is handed to a detached
//! reconciler task that polls the provider until the deployment settles,
//! the poll budget runs out, or the job is cancelled. The reconciler is
//! the job's sole writer from that point; direct status refreshes go
//! through the same mapping and stay safe because terminal jobs ignore
//! further patches at the store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use slipway_job::{JobPatch, JobStatus};
use slipway_provider::{DeploymentProvider, DeploymentStatus};
use slipway_store::JobStore;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Error recorded when the poll budget elapses first.
pub const TIMEOUT_ERROR: &str = "deployment timed out before reaching a terminal state";

struct ReconcilerEntry {
    task_id: u64,
    cancel: CancellationToken,
    done: CancellationToken,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<String, ReconcilerEntry>,
    next_task_id: u64,
}

/// Tracks one reconciler task per job id.
///
/// Each entry holds the task's cancellation token and a completion
/// latch. Tasks remove their own entry after the final store write, so
/// an absent entry always means reconciliation has already finished.
#[derive(Clone, Default)]
pub struct ReconcilerRegistry {
    inner: Arc<Mutex<RegistryState>>,
}

impl ReconcilerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a detached reconciler for `job_id` watching `deployment_id`.
    pub async fn spawn<S, P>(
        &self,
        store: Arc<S>,
        provider: Arc<P>,
        job_id: String,
        deployment_id: String,
        poll_interval: Duration,
        poll_budget: Duration,
    ) where
        S: JobStore + 'static,
        P: DeploymentProvider + 'static,
    {
        let (task_id, cancel) = self.register(&job_id).await;
        let registry = self.clone();
        tokio::spawn(async move {
            run_reconciler(
                &*store,
                &*provider,
                &job_id,
                &deployment_id,
                poll_interval,
                poll_budget,
                cancel,
            )
            .await;
            registry.finish(&job_id, task_id).await;
        });
    }

    /// Cancels the reconciler for `job_id`, if one is running.
    pub async fn cancel(&self, job_id: &str) {
        let state = self.inner.lock().await;
        if let Some(entry) = state.entries.get(job_id) {
            entry.cancel.cancel();
        }
    }

    /// Waits until the reconciler for `job_id` has made its final store
    /// write. Returns immediately when none is tracked.
    pub async fn await_completion(&self, job_id: &str) {
        let done = {
            let state = self.inner.lock().await;
            match state.entries.get(job_id) {
                Some(entry) => entry.done.clone(),
                None => return,
            }
        };
        done.cancelled().await;
    }

    /// Number of reconcilers currently tracked.
    pub async fn active_count(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    async fn register(&self, job_id: &str) -> (u64, CancellationToken) {
        let mut state = self.inner.lock().await;
        if let Some(old) = state.entries.remove(job_id) {
            // A job only gets one deployment, so a live entry here is a
            // leftover. Stop it and release anyone awaiting it.
            old.cancel.cancel();
            old.done.cancel();
            debug!(job = %job_id, "replaced existing reconciler");
        }
        let task_id = state.next_task_id;
        state.next_task_id += 1;
        let cancel = CancellationToken::new();
        let done = CancellationToken::new();
        state.entries.insert(
            job_id.to_string(),
            ReconcilerEntry {
                task_id,
                cancel: cancel.clone(),
                done,
            },
        );
        (task_id, cancel)
    }

    /// Removes the entry and fires its completion latch. The task id
    /// check keeps a stopped task from tearing down a replacement.
    async fn finish(&self, job_id: &str, task_id: u64) {
        let mut state = self.inner.lock().await;
        let owns_entry = state
            .entries
            .get(job_id)
            .is_some_and(|entry| entry.task_id == task_id);
        if owns_entry && let Some(entry) = state.entries.remove(job_id) {
            entry.done.cancel();
        }
    }
}

async fn run_reconciler<S, P>(
    store: &S,
    provider: &P,
    job_id: &str,
    deployment_id: &str,
    poll_interval: Duration,
    poll_budget: Duration,
    cancel: CancellationToken,
) where
    S: JobStore,
    P: DeploymentProvider,
{
    let mut poll = tokio::time::interval(poll_interval);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let budget = tokio::time::sleep(poll_budget);
    tokio::pin!(budget);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(job = %job_id, "reconciler cancelled");
                break;
            }
            _ = &mut budget => {
                warn!(job = %job_id, deployment = %deployment_id, "poll budget elapsed, failing job");
                write_patch(store, job_id, JobPatch::failed(TIMEOUT_ERROR)).await;
                break;
            }
            _ = poll.tick() => {
                match provider.deployment_status(deployment_id).await {
                    Ok(status) => {
                        let terminal = status.state.is_terminal();
                        apply_status(store, job_id, &status).await;
                        if terminal {
                            info!(
                                job = %job_id,
                                deployment = %deployment_id,
                                state = ?status.state,
                                "deployment settled"
                            );
                            break;
                        }
                    }
                    Err(e) => {
                        // Transient: the next tick retries, the budget
                        // bounds how long that can go on.
                        debug!(job = %job_id, error = %e, "status poll failed, will retry");
                    }
                }
            }
        }
    }
}

/// Translates a provider status into a job patch and applies it.
///
/// A queued deployment maps to no change at all; the job stays in
/// `deploying` until the provider reports build activity.
pub(crate) async fn apply_status<S: JobStore>(store: &S, job_id: &str, status: &DeploymentStatus) {
    let Some(next) = status.state.as_job_status() else {
        return;
    };
    let patch = match next {
        JobStatus::Ready => JobPatch {
            status: Some(JobStatus::Ready),
            url: status.url.clone(),
            ..JobPatch::default()
        },
        JobStatus::Failed => JobPatch::failed(
            status
                .error_message
                .clone()
                .unwrap_or_else(|| "deployment failed".to_string()),
        ),
        other => JobPatch::with_status(other),
    };
    write_patch(store, job_id, patch).await;
}

async fn write_patch<S: JobStore>(store: &S, job_id: &str, patch: JobPatch) {
    match store.update(job_id, patch).await {
        Ok(Some(_)) => {}
        Ok(None) => debug!(job = %job_id, "job vanished before reconciliation finished"),
        Err(e) => warn!(job = %job_id, error = %e, "failed to record deployment state"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn awaiting_an_untracked_job_returns_immediately() {
        let registry = ReconcilerRegistry::new();
        registry.await_completion("job-x").await;
        assert_eq!(registry.active_count().await, 0);
    }

    #[tokio::test]
    async fn cancelling_an_untracked_job_is_a_no_op() {
        let registry = ReconcilerRegistry::new();
        registry.cancel("job-x").await;
    }

    #[tokio::test]
    async fn finish_releases_awaiters_and_removes_the_entry() {
        let registry = ReconcilerRegistry::new();
        let (task_id, _cancel) = registry.register("job-1").await;
        assert_eq!(registry.active_count().await, 1);

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.await_completion("job-1").await })
        };

        registry.finish("job-1", task_id).await;
        waiter.await.unwrap();
        assert_eq!(registry.active_count().await, 0);
    }

    #[tokio::test]
    async fn a_stale_task_cannot_tear_down_its_replacement() {
        let registry = ReconcilerRegistry::new();
        let (stale_id, stale_cancel) = registry.register("job-1").await;
        let (_fresh_id, fresh_cancel) = registry.register("job-1").await;

        assert!(stale_cancel.is_cancelled());
        assert!(!fresh_cancel.is_cancelled());

        registry.finish("job-1", stale_id).await;
        assert_eq!(registry.active_count().await, 1);
    }
}
