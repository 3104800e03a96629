//! Broker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Interval between deployment status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Wall-clock budget for reconciling a single deployment.
pub const DEFAULT_POLL_BUDGET: Duration = Duration::from_secs(5 * 60);

/// Settings for the publish broker.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// How often a deployment's status is polled while it is in flight.
    pub poll_interval: Duration,
    /// How long a deployment may stay non-terminal before the job is
    /// failed with a timeout error.
    pub poll_budget: Duration,
    /// Directory for raw uploaded archives. `None` disables spooling.
    pub spool_dir: Option<PathBuf>,
    /// Shared secret publishing clients must present. `None` means no
    /// token is configured and authenticated requests are rejected.
    pub auth_token: Option<String>,
    /// Per-identity request admission settings.
    pub rate_limit: RateLimitConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_budget: DEFAULT_POLL_BUDGET,
            spool_dir: None,
            auth_token: None,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Fixed-window rate limiting settings.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests admitted per identity per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = BrokerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.poll_budget, Duration::from_secs(300));
        assert!(config.spool_dir.is_none());
        assert!(config.auth_token.is_none());
        assert_eq!(config.rate_limit.max_requests, 60);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
    }
}
