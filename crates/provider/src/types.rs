//! Provider-side deployment types and the mapping into broker statuses.

use serde::{Deserialize, Serialize};
use slipway_job::JobStatus;

/// Deployment readiness state in the provider's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProviderState {
    Queued,
    Building,
    Ready,
    Error,
    Canceled,
}

impl ProviderState {
    /// Returns `true` for states the deployment never leaves.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProviderState::Ready | ProviderState::Error | ProviderState::Canceled
        )
    }

    /// Broker status corresponding to this provider state.
    ///
    /// `QUEUED` maps to `None`: the local status stays `deploying` while
    /// the provider has not started building.
    pub fn as_job_status(self) -> Option<JobStatus> {
        match self {
            ProviderState::Queued => None,
            ProviderState::Building => Some(JobStatus::Building),
            ProviderState::Ready => Some(JobStatus::Ready),
            ProviderState::Error => Some(JobStatus::Failed),
            ProviderState::Canceled => Some(JobStatus::Cancelled),
        }
    }
}

/// One file in a deployment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployFile {
    /// Path relative to the deployment root.
    pub path: String,
    /// UTF-8 text, or base64 when `binary` is set.
    pub content: String,
    #[serde(default)]
    pub binary: bool,
}

/// Result of creating a deployment.
#[derive(Debug, Clone)]
pub struct CreatedDeployment {
    pub deployment_id: String,
    pub project_id: Option<String>,
    pub url: Option<String>,
    pub state: ProviderState,
}

/// Point-in-time deployment state reported by the provider.
#[derive(Debug, Clone)]
pub struct DeploymentStatus {
    pub state: ProviderState,
    pub url: Option<String>,
    pub error_message: Option<String>,
}

/// Derives the provider project name for `(app_id, content_hash)`.
///
/// The app id is slugged (lowercase alphanumerics, other runs collapse to
/// one hyphen) and the first 8 hex characters of the content hash are
/// appended, so republishing identical content to the same app lands on a
/// consistently-named project.
pub fn project_name_for(app_id: &str, content_hash: &str) -> String {
    let mut slug = String::with_capacity(app_id.len());
    for c in app_id.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    let prefix: String = content_hash.chars().take(8).collect();
    if slug.is_empty() {
        format!("app-{prefix}")
    } else {
        format!("{slug}-{prefix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_mapping_table() {
        assert_eq!(ProviderState::Queued.as_job_status(), None);
        assert_eq!(
            ProviderState::Building.as_job_status(),
            Some(JobStatus::Building)
        );
        assert_eq!(ProviderState::Ready.as_job_status(), Some(JobStatus::Ready));
        assert_eq!(ProviderState::Error.as_job_status(), Some(JobStatus::Failed));
        assert_eq!(
            ProviderState::Canceled.as_job_status(),
            Some(JobStatus::Cancelled)
        );
    }

    #[test]
    fn terminal_provider_states() {
        assert!(ProviderState::Ready.is_terminal());
        assert!(ProviderState::Error.is_terminal());
        assert!(ProviderState::Canceled.is_terminal());
        assert!(!ProviderState::Queued.is_terminal());
        assert!(!ProviderState::Building.is_terminal());
    }

    #[test]
    fn states_serialize_uppercase() {
        assert_eq!(
            serde_json::to_value(ProviderState::Ready).unwrap(),
            serde_json::json!("READY")
        );
        let state: ProviderState = serde_json::from_str("\"CANCELED\"").unwrap();
        assert_eq!(state, ProviderState::Canceled);
    }

    #[test]
    fn project_name_is_slug_plus_hash_prefix() {
        assert_eq!(project_name_for("123", "abcdef1234567890"), "123-abcdef12");
        assert_eq!(project_name_for("My App!", "ffff0000aaaa"), "my-app-ffff0000");
    }

    #[test]
    fn project_name_is_deterministic() {
        let a = project_name_for("demo", "0123456789abcdef");
        let b = project_name_for("demo", "0123456789abcdef");
        assert_eq!(a, b);
    }

    #[test]
    fn project_name_handles_degenerate_inputs() {
        assert_eq!(project_name_for("!!!", "abcdef1234"), "app-abcdef12");
        assert_eq!(project_name_for("demo", "ab"), "demo-ab");
        assert_eq!(project_name_for("a  b", "0000000011"), "a-b-00000000");
    }
}
