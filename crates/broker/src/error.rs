//! Broker error types.

use slipway_bundle::BundleError;
use slipway_job::JobStatus;
use slipway_provider::ProviderError;
use slipway_store::StoreError;

/// Errors surfaced by broker operations.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no such job: {0}")]
    UnknownJob(String),

    #[error("job {id} is {status}, expected {expected}")]
    InvalidTransition {
        id: String,
        status: JobStatus,
        expected: JobStatus,
    },

    #[error("bundle rejected: {0}")]
    Bundle(#[from] BundleError),

    #[error("deployment failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BrokerError {
    /// Whether the caller, rather than the service, is at fault.
    /// Transports use this to pick a 4xx over a 5xx.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BrokerError::InvalidRequest(_)
                | BrokerError::UnknownJob(_)
                | BrokerError::InvalidTransition { .. }
                | BrokerError::Bundle(_)
        )
    }
}
