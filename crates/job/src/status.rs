//! Job lifecycle states and the transition rules between them.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a publish job.
///
/// Declared in forward progress order. `Ready`, `Failed` and `Cancelled`
/// are terminal: once reached, the job record is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Packaging,
    Uploading,
    Building,
    Deploying,
    Ready,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Returns `true` for `ready`, `failed` and `cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Ready | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Fixed progress percentage reported for this status.
    pub fn progress(self) -> u8 {
        match self {
            JobStatus::Queued => 5,
            JobStatus::Packaging => 15,
            JobStatus::Uploading => 35,
            JobStatus::Building => 60,
            JobStatus::Deploying => 85,
            JobStatus::Ready => 100,
            JobStatus::Failed | JobStatus::Cancelled => 0,
        }
    }

    /// Fixed human-readable description reported for this status.
    pub fn message(self) -> &'static str {
        match self {
            JobStatus::Queued => "Waiting to start",
            JobStatus::Packaging => "Packaging application files",
            JobStatus::Uploading => "Receiving bundle upload",
            JobStatus::Building => "Building on the hosting provider",
            JobStatus::Deploying => "Deploying to the hosting provider",
            JobStatus::Ready => "Deployment is live",
            JobStatus::Failed => "Publish failed",
            JobStatus::Cancelled => "Publish cancelled",
        }
    }

    /// Lowercase name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Packaging => "packaging",
            JobStatus::Uploading => "uploading",
            JobStatus::Building => "building",
            JobStatus::Deploying => "deploying",
            JobStatus::Ready => "ready",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Returns `true` if the state machine permits moving to `next`.
    ///
    /// Every non-terminal status may move to `failed` or `cancelled`.
    /// The remaining edges are the pipeline sequence plus the
    /// deployment-driven adjustments (`deploying → building` when the
    /// provider reports an active build, and the degraded-mode
    /// `packaging → ready` shortcut).
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(next, JobStatus::Failed | JobStatus::Cancelled) {
            return true;
        }
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Uploading)
                | (JobStatus::Uploading, JobStatus::Packaging)
                | (JobStatus::Packaging, JobStatus::Building)
                | (JobStatus::Packaging, JobStatus::Ready)
                | (JobStatus::Building, JobStatus::Deploying)
                | (JobStatus::Building, JobStatus::Ready)
                | (JobStatus::Deploying, JobStatus::Building)
                | (JobStatus::Deploying, JobStatus::Ready)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
