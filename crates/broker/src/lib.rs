//! Publish job lifecycle broker.
//!
//! Wires the other crates into one orchestrator: [`Broker`] runs the
//! upload-to-deployment pipeline against a [`slipway_store::JobStore`]
//! and a [`slipway_provider::DeploymentProvider`], hands in-flight
//! deployments to background reconcilers, and fronts everything with
//! rate-limit and token gates.

pub mod broker;
pub mod config;
pub mod error;
pub mod gate;
pub mod reconcile;

pub use broker::{Broker, CancelOutcome};
pub use config::{BrokerConfig, DEFAULT_POLL_BUDGET, DEFAULT_POLL_INTERVAL, RateLimitConfig};
pub use error::BrokerError;
pub use gate::{Admission, AuthFailure, AuthGate, AuthOutcome, RateLimiter};
pub use reconcile::{ReconcilerRegistry, TIMEOUT_ERROR};
