//! Job record and request/response wire types.
//!
//! All wire types serialize with camelCase field names. Optional fields are
//! omitted from JSON when unset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::JobStatus;

/// One publish attempt, tracked from creation to a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishJob {
    /// Unique identifier, assigned at creation and never reused.
    pub id: String,
    pub status: JobStatus,
    /// Application this publish belongs to.
    pub app_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    /// Content hash declared by the client when the job was created.
    pub bundle_hash: String,
    /// Bundle size in bytes declared by the client when the job was created.
    pub bundle_size: u64,
    /// Where the raw archive was spooled, when spooling is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_path: Option<String>,
    /// Remote deployment handle, set once and never changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_project_id: Option<String>,
    /// Live URL, present only when the job is `ready`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Failure description, present only when the job is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client request to start a publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub app_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    pub bundle_hash: String,
    pub bundle_size: u64,
}

/// Fields the store needs to create a job record.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub app_id: String,
    pub app_name: Option<String>,
    pub profile_id: Option<String>,
    pub bundle_hash: String,
    pub bundle_size: u64,
}

impl From<CreateJobRequest> for NewJob {
    fn from(req: CreateJobRequest) -> Self {
        Self {
            app_id: req.app_id,
            app_name: req.app_name,
            profile_id: req.profile_id,
            bundle_hash: req.bundle_hash,
            bundle_size: req.bundle_size,
        }
    }
}

/// Partial update applied to a job record.
///
/// `None` fields are left unchanged by the store.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub bundle_path: Option<String>,
    pub deployment_id: Option<String>,
    pub deployment_project_id: Option<String>,
    pub url: Option<String>,
    pub error: Option<String>,
}

impl JobPatch {
    /// Patch that only moves the status.
    pub fn with_status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Patch that moves the status to `failed` with a description.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Point-in-time view of a job returned by status queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub id: String,
    pub app_id: String,
    pub status: JobStatus,
    /// Fixed percentage for `status`.
    pub progress: u8,
    /// Fixed human-readable text for `status`.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PublishJob> for StatusReport {
    fn from(job: &PublishJob) -> Self {
        Self {
            id: job.id.clone(),
            app_id: job.app_id.clone(),
            status: job.status,
            progress: job.status.progress(),
            message: job.status.message().to_string(),
            deployment_id: job.deployment_id.clone(),
            url: job.url.clone(),
            error: job.error.clone(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> PublishJob {
        let now = Utc::now();
        PublishJob {
            id: "job-1".into(),
            status: JobStatus::Queued,
            app_id: "demo-app".into(),
            app_name: Some("Demo".into()),
            profile_id: None,
            bundle_hash: "abc123".into(),
            bundle_size: 1024,
            bundle_path: None,
            deployment_id: None,
            deployment_project_id: None,
            url: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn job_serializes_camel_case() {
        let json = serde_json::to_value(sample_job()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("appId"));
        assert!(obj.contains_key("bundleHash"));
        assert!(obj.contains_key("bundleSize"));
        assert!(obj.contains_key("createdAt"));
        assert_eq!(json["status"], "queued");
    }

    #[test]
    fn unset_optionals_are_omitted() {
        let json = serde_json::to_value(sample_job()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("url"));
        assert!(!obj.contains_key("error"));
        assert!(!obj.contains_key("deploymentId"));
        assert!(!obj.contains_key("profileId"));
        assert!(obj.contains_key("appName"));
    }

    #[test]
    fn job_roundtrips_through_json() {
        let job = sample_job();
        let json = serde_json::to_string(&job).unwrap();
        let back: PublishJob = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn create_request_converts_to_new_job() {
        let req = CreateJobRequest {
            app_id: "123".into(),
            app_name: None,
            profile_id: Some("p-1".into()),
            bundle_hash: "abc".into(),
            bundle_size: 2048,
        };
        let new_job = NewJob::from(req);
        assert_eq!(new_job.app_id, "123");
        assert_eq!(new_job.profile_id.as_deref(), Some("p-1"));
        assert_eq!(new_job.bundle_size, 2048);
    }

    #[test]
    fn patch_helpers() {
        let patch = JobPatch::with_status(JobStatus::Building);
        assert_eq!(patch.status, Some(JobStatus::Building));
        assert!(patch.error.is_none());

        let patch = JobPatch::failed("build failed");
        assert_eq!(patch.status, Some(JobStatus::Failed));
        assert_eq!(patch.error.as_deref(), Some("build failed"));
    }

    #[test]
    fn report_carries_progress_and_message() {
        let mut job = sample_job();
        job.status = JobStatus::Deploying;
        let report = StatusReport::from(&job);
        assert_eq!(report.progress, 85);
        assert_eq!(report.message, JobStatus::Deploying.message());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "deploying");
        assert_eq!(json["progress"], 85);
    }
}
