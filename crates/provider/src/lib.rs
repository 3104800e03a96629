//! Deployment provider contract and hosting API client.
//!
//! The orchestrator drives deployments through the [`DeploymentProvider`]
//! trait: create a deployment from a flat file list, poll its state, and
//! best-effort cancel it. [`HostingClient`] implements the trait against
//! the provider's REST API; tests substitute scripted mocks.

use std::future::Future;
use std::pin::Pin;

pub mod client;
pub mod error;
pub mod scrub;
pub mod types;

pub use client::{HostingClient, HostingConfig};
pub use error::ProviderError;
pub use scrub::scrub_secrets;
pub use types::{CreatedDeployment, DeployFile, DeploymentStatus, ProviderState, project_name_for};

/// Boxed future returned by [`DeploymentProvider`] methods.
pub type ProviderFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// Abstract deployment provider.
///
/// Keeping the orchestrator behind this trait decouples it from the HTTP
/// transport and makes the deploy pipeline testable with mocks.
pub trait DeploymentProvider: Send + Sync {
    /// Creates a deployment for `project_name` from a flat file list and
    /// returns the provider's handle plus its initial state.
    fn create_deployment<'a>(
        &'a self,
        project_name: &'a str,
        files: &'a [DeployFile],
    ) -> ProviderFuture<'a, CreatedDeployment>;

    /// Fetches the current state of a deployment.
    fn deployment_status<'a>(
        &'a self,
        deployment_id: &'a str,
    ) -> ProviderFuture<'a, DeploymentStatus>;

    /// Best-effort cancellation; `true` when the provider accepted it.
    fn cancel_deployment<'a>(&'a self, deployment_id: &'a str) -> ProviderFuture<'a, bool>;

    /// Whether credentials are configured. When `false` the broker runs in
    /// degraded mode and never calls the other methods.
    fn is_configured(&self) -> bool;
}
