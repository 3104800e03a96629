//! In-memory job store.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use slipway_job::{JobPatch, JobStatus, NewJob, PublishJob};
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::{JobStore, StoreFuture};

/// Process-local [`JobStore`] backed by a `HashMap`.
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryJobStore {
    jobs: Arc<RwLock<HashMap<String, PublishJob>>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

/// Merges `patch` into `job` in place, refreshing `updatedAt`.
///
/// Terminal records are frozen and a status change the state machine
/// forbids rejects the whole patch; both leave the record untouched.
/// Writing the current status again is an idempotent no-op, not a
/// transition. Deployment identifiers are first-write-wins. `updatedAt`
/// never decreases.
fn apply_patch(job: &mut PublishJob, patch: JobPatch) {
    if job.status.is_terminal() {
        return;
    }
    if let Some(next) = patch.status
        && next != job.status
        && !job.status.can_transition_to(next)
    {
        warn!(job = %job.id, from = %job.status, to = %next, "rejected status transition");
        return;
    }

    if let Some(status) = patch.status {
        job.status = status;
    }
    if let Some(bundle_path) = patch.bundle_path {
        job.bundle_path = Some(bundle_path);
    }
    if let Some(deployment_id) = patch.deployment_id
        && job.deployment_id.is_none()
    {
        job.deployment_id = Some(deployment_id);
    }
    if let Some(project_id) = patch.deployment_project_id
        && job.deployment_project_id.is_none()
    {
        job.deployment_project_id = Some(project_id);
    }
    if let Some(url) = patch.url {
        job.url = Some(url);
    }
    if let Some(error) = patch.error {
        job.error = Some(error);
    }

    job.updated_at = job.updated_at.max(Utc::now());
}

impl JobStore for MemoryJobStore {
    fn create(&self, new_job: NewJob) -> StoreFuture<'_, PublishJob> {
        Box::pin(async move {
            let now = Utc::now();
            let job = PublishJob {
                id: Uuid::new_v4().to_string(),
                status: JobStatus::Queued,
                app_id: new_job.app_id,
                app_name: new_job.app_name,
                profile_id: new_job.profile_id,
                bundle_hash: new_job.bundle_hash,
                bundle_size: new_job.bundle_size,
                bundle_path: None,
                deployment_id: None,
                deployment_project_id: None,
                url: None,
                error: None,
                created_at: now,
                updated_at: now,
            };
            self.jobs.write().await.insert(job.id.clone(), job.clone());
            Ok(job)
        })
    }

    fn get<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Option<PublishJob>> {
        Box::pin(async move { Ok(self.jobs.read().await.get(id).cloned()) })
    }

    fn update<'a>(
        &'a self,
        id: &'a str,
        patch: JobPatch,
    ) -> StoreFuture<'a, Option<PublishJob>> {
        Box::pin(async move {
            let mut jobs = self.jobs.write().await;
            let Some(job) = jobs.get_mut(id) else {
                return Ok(None);
            };
            apply_patch(job, patch);
            Ok(Some(job.clone()))
        })
    }

    fn purge_created_before(&self, cutoff: DateTime<Utc>) -> StoreFuture<'_, usize> {
        Box::pin(async move {
            let mut jobs = self.jobs.write().await;
            let before = jobs.len();
            jobs.retain(|_, job| !(job.status.is_terminal() && job.created_at < cutoff));
            Ok(before - jobs.len())
        })
    }
}
