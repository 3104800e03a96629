//! Publish job orchestration.
//!
//! [`Broker`] owns the whole pipeline for one process: job creation,
//! the upload-to-deployment flow, status queries, cancellation and
//! retention. It is constructed once at startup and shared by the
//! transport layer; all collaborators (store, provider, reconcilers,
//! admission gates) hang off the instance.

use std::sync::Arc;

use slipway_bundle::{self as bundle, ExtractedBundle};
use slipway_job::{CreateJobRequest, JobPatch, JobStatus, NewJob, PublishJob, StatusReport};
use slipway_provider::{DeployFile, DeploymentProvider, project_name_for};
use slipway_store::JobStore;
use tracing::{debug, info, warn};

use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::gate::{AuthGate, RateLimiter};
use crate::reconcile::{ReconcilerRegistry, apply_status};

/// Outcome of a cancel request.
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    /// The job was cancelled; the updated record is returned.
    Cancelled(PublishJob),
    /// The job had already settled; nothing changed.
    AlreadyTerminal(JobStatus),
}

/// Publish broker.
pub struct Broker<S, P> {
    store: Arc<S>,
    provider: Arc<P>,
    config: BrokerConfig,
    reconcilers: ReconcilerRegistry,
    rate_limiter: RateLimiter,
    auth: AuthGate,
}

impl<S, P> Broker<S, P>
where
    S: JobStore + 'static,
    P: DeploymentProvider + 'static,
{
    pub fn new(store: S, provider: P, config: BrokerConfig) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit.clone());
        let auth = AuthGate::new(config.auth_token.clone());
        Self {
            store: Arc::new(store),
            provider: Arc::new(provider),
            config,
            reconcilers: ReconcilerRegistry::new(),
            rate_limiter,
            auth,
        }
    }

    /// Admission gate, checked by the transport before job operations.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Token gate, checked by the transport before job operations.
    pub fn auth_gate(&self) -> &AuthGate {
        &self.auth
    }

    /// Background reconciler handles, for cancellation and for tests that
    /// need to await a deployment settling.
    pub fn reconcilers(&self) -> &ReconcilerRegistry {
        &self.reconcilers
    }

    /// Creates a `queued` job from a publish request.
    pub async fn create_job(&self, req: CreateJobRequest) -> Result<PublishJob, BrokerError> {
        if req.app_id.trim().is_empty() {
            return Err(BrokerError::InvalidRequest("appId must not be empty".into()));
        }
        if req.bundle_hash.trim().is_empty() {
            return Err(BrokerError::InvalidRequest(
                "bundleHash must not be empty".into(),
            ));
        }

        let job = self.store.create(NewJob::from(req)).await?;
        info!(job = %job.id, app = %job.app_id, "publish job created");
        Ok(job)
    }

    /// Runs the upload pipeline: size check, extraction, spooling, then
    /// deployment creation (or the degraded shortcut when no provider is
    /// configured).
    ///
    /// Returns once the deployment exists; reconciliation continues in
    /// the background. Pipeline failures mark the job `failed` and
    /// surface the same error to the caller.
    pub async fn upload_bundle(
        &self,
        job_id: &str,
        archive: Vec<u8>,
    ) -> Result<PublishJob, BrokerError> {
        let job = self.require_job(job_id).await?;
        if job.status != JobStatus::Queued {
            return Err(BrokerError::InvalidTransition {
                id: job.id,
                status: job.status,
                expected: JobStatus::Queued,
            });
        }

        let archive: Arc<[u8]> = Arc::from(archive);
        self.update(job_id, JobPatch::with_status(JobStatus::Uploading))
            .await?;

        if let Err(e) = bundle::validate_size(archive.len() as u64) {
            return self.fail_job(job_id, e).await;
        }

        self.update(job_id, JobPatch::with_status(JobStatus::Packaging))
            .await?;

        let extracted = match self.extract_archive(&archive).await {
            Ok(extracted) => extracted,
            Err(e) => return self.fail_job(job_id, e).await,
        };

        if extracted.content_hash != job.bundle_hash {
            // Declared hashes are advisory; a mismatch is logged but the
            // publish goes ahead with the bytes we actually received.
            warn!(
                job = %job_id,
                declared = %job.bundle_hash,
                actual = %extracted.content_hash,
                "bundle hash mismatch"
            );
        }

        self.spool_archive(job_id, &archive).await;

        let project_name = project_name_for(&job.app_id, &extracted.content_hash);
        if !self.provider.is_configured() {
            return self.finish_degraded(job_id, &project_name).await;
        }

        self.deploy(job_id, &project_name, extracted).await
    }

    /// Returns the job's current progress, refreshing from the provider
    /// first when a deployment is still in flight.
    pub async fn job_status(&self, job_id: &str) -> Result<StatusReport, BrokerError> {
        let mut job = self.require_job(job_id).await?;

        if !job.status.is_terminal()
            && self.provider.is_configured()
            && let Some(deployment_id) = job.deployment_id.clone()
        {
            match self.provider.deployment_status(&deployment_id).await {
                Ok(status) => {
                    apply_status(&*self.store, job_id, &status).await;
                    job = self.require_job(job_id).await?;
                }
                Err(e) => {
                    debug!(job = %job_id, error = %e, "status refresh failed, serving stored state");
                }
            }
        }

        Ok(StatusReport::from(&job))
    }

    /// Cancels a job: best-effort remote cancellation first, then the
    /// local terminal write. Settled jobs are left untouched.
    pub async fn cancel_job(&self, job_id: &str) -> Result<CancelOutcome, BrokerError> {
        let job = self.require_job(job_id).await?;
        if job.status.is_terminal() {
            debug!(job = %job_id, status = %job.status, "cancel ignored, job already settled");
            return Ok(CancelOutcome::AlreadyTerminal(job.status));
        }

        if self.provider.is_configured()
            && let Some(deployment_id) = job.deployment_id.as_deref()
        {
            match self.provider.cancel_deployment(deployment_id).await {
                Ok(true) => {
                    debug!(job = %job_id, deployment = %deployment_id, "remote deployment cancelled");
                }
                Ok(false) => {
                    warn!(job = %job_id, deployment = %deployment_id, "provider declined to cancel");
                }
                Err(e) => {
                    warn!(
                        job = %job_id,
                        deployment = %deployment_id,
                        error = %e,
                        "remote cancel failed, cancelling locally anyway"
                    );
                }
            }
        }

        self.reconcilers.cancel(job_id).await;

        let job = self
            .update(job_id, JobPatch::with_status(JobStatus::Cancelled))
            .await?;
        if job.status != JobStatus::Cancelled {
            // A reconciler write settled the job between our check and the
            // cancel write; the store kept the earlier terminal state.
            return Ok(CancelOutcome::AlreadyTerminal(job.status));
        }
        info!(job = %job_id, "publish job cancelled");
        Ok(CancelOutcome::Cancelled(job))
    }

    /// Removes settled jobs older than `age`. Returns how many went.
    pub async fn purge_jobs_older_than(
        &self,
        age: chrono::Duration,
    ) -> Result<usize, BrokerError> {
        let cutoff = chrono::Utc::now() - age;
        let removed = self.store.purge_created_before(cutoff).await?;
        if removed > 0 {
            info!(removed, "purged settled publish jobs");
        }
        Ok(removed)
    }

    async fn require_job(&self, job_id: &str) -> Result<PublishJob, BrokerError> {
        self.store
            .get(job_id)
            .await?
            .ok_or_else(|| BrokerError::UnknownJob(job_id.to_string()))
    }

    /// Store update that treats an unknown id as a client error.
    async fn update(&self, job_id: &str, patch: JobPatch) -> Result<PublishJob, BrokerError> {
        self.store
            .update(job_id, patch)
            .await?
            .ok_or_else(|| BrokerError::UnknownJob(job_id.to_string()))
    }

    /// Marks the job `failed` with the error's text, then surfaces the
    /// same error to the caller.
    async fn fail_job(
        &self,
        job_id: &str,
        error: impl Into<BrokerError>,
    ) -> Result<PublishJob, BrokerError> {
        let error = error.into();
        self.update(job_id, JobPatch::failed(error.to_string()))
            .await?;
        Err(error)
    }

    /// Extraction is CPU bound, so it runs on the blocking pool.
    async fn extract_archive(&self, archive: &Arc<[u8]>) -> Result<ExtractedBundle, BrokerError> {
        let bytes = Arc::clone(archive);
        tokio::task::spawn_blocking(move || bundle::extract(&bytes))
            .await
            .map_err(|e| BrokerError::Internal(format!("extraction task failed: {e}")))?
            .map_err(BrokerError::from)
    }

    /// Writes the raw archive under the spool directory and records its
    /// path on the job. Failures are logged, never fatal.
    async fn spool_archive(&self, job_id: &str, archive: &Arc<[u8]>) {
        let Some(dir) = self.config.spool_dir.clone() else {
            return;
        };
        let path = dir.join(format!("{job_id}.zip"));
        let bytes = Arc::clone(archive);
        let write_path = path.clone();
        let written = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            std::fs::create_dir_all(&dir)?;
            std::fs::write(&write_path, bytes.as_ref())
        })
        .await;

        match written {
            Ok(Ok(())) => {
                debug!(job = %job_id, path = %path.display(), "archive spooled");
                let patch = JobPatch {
                    bundle_path: Some(path.display().to_string()),
                    ..JobPatch::default()
                };
                if let Err(e) = self.store.update(job_id, patch).await {
                    warn!(job = %job_id, error = %e, "failed to record spool path");
                }
            }
            Ok(Err(e)) => warn!(job = %job_id, error = %e, "archive spooling failed"),
            Err(e) => warn!(job = %job_id, error = %e, "archive spooling task failed"),
        }
    }

    /// No provider configured: the publish completes locally behind a
    /// synthetic URL so clients still see the full lifecycle.
    async fn finish_degraded(
        &self,
        job_id: &str,
        project_name: &str,
    ) -> Result<PublishJob, BrokerError> {
        let url = format!("https://{project_name}.app.invalid");
        info!(job = %job_id, url = %url, "no provider configured, completing locally");
        let job = self
            .update(
                job_id,
                JobPatch {
                    status: Some(JobStatus::Ready),
                    url: Some(url),
                    ..JobPatch::default()
                },
            )
            .await?;
        Ok(job)
    }

    async fn deploy(
        &self,
        job_id: &str,
        project_name: &str,
        extracted: ExtractedBundle,
    ) -> Result<PublishJob, BrokerError> {
        self.update(job_id, JobPatch::with_status(JobStatus::Building))
            .await?;

        let files: Vec<DeployFile> = extracted
            .files
            .into_iter()
            .map(|f| DeployFile {
                path: f.path,
                content: f.content,
                binary: f.is_binary,
            })
            .collect();

        self.update(job_id, JobPatch::with_status(JobStatus::Deploying))
            .await?;

        let created = match self.provider.create_deployment(project_name, &files).await {
            Ok(created) => created,
            Err(e) => return self.fail_job(job_id, e).await,
        };
        info!(
            job = %job_id,
            deployment = %created.deployment_id,
            project = %project_name,
            "deployment created"
        );

        let job = self
            .update(
                job_id,
                JobPatch {
                    deployment_id: Some(created.deployment_id.clone()),
                    deployment_project_id: created.project_id.clone(),
                    ..JobPatch::default()
                },
            )
            .await?;

        self.reconcilers
            .spawn(
                Arc::clone(&self.store),
                Arc::clone(&self.provider),
                job_id.to_string(),
                created.deployment_id,
                self.config.poll_interval,
                self.config.poll_budget,
            )
            .await;

        Ok(job)
    }
}
