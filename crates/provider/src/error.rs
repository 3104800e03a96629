//! Provider error types.

/// Errors from the deployment provider.
///
/// Create-deployment failures are fatal for the job; status-poll failures
/// are transient and retried by the reconciliation loop. Any text captured
/// from the provider is scrubbed of secrets before it is stored here.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider not configured")]
    NotConfigured,

    #[error("provider request failed: {0}")]
    Http(String),

    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("provider response malformed: {0}")]
    Malformed(String),
}
