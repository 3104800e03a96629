//! Request admission gates: rate limiting and token auth.
//!
//! Both gates are owned by the broker instance and checked by the
//! transport layer before any job operation runs. Neither touches
//! global state.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::config::RateLimitConfig;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// Over the limit; retry once this many seconds have passed.
    Limited { retry_after_secs: u64 },
}

struct Window {
    started_at: Instant,
    count: u32,
}

/// Fixed-window request counter, one window per client identity.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Counts a request for `identity` against its current window.
    pub fn admit(&self, identity: &str) -> Admission {
        self.admit_at(identity, Instant::now())
    }

    /// Same as [`admit`](Self::admit) with an explicit clock, so tests
    /// can drive window expiry deterministically.
    pub fn admit_at(&self, identity: &str, now: Instant) -> Admission {
        let mut windows = self.windows.lock().unwrap();
        let window = windows.entry(identity.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(window.started_at);
        if elapsed >= self.config.window {
            window.started_at = now;
            window.count = 0;
        }

        if window.count >= self.config.max_requests {
            let remaining = self
                .config
                .window
                .saturating_sub(now.saturating_duration_since(window.started_at));
            return Admission::Limited {
                retry_after_secs: remaining.as_secs().max(1),
            };
        }

        window.count += 1;
        Admission::Allowed
    }
}

/// Outcome of token validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Valid,
    Invalid(AuthFailure),
}

/// Why a presented token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No token accompanied the request.
    Missing,
    /// The token does not match the configured secret.
    Mismatch,
    /// The broker itself has no token configured.
    NotConfigured,
}

/// Validates presented client tokens against the configured secret.
pub struct AuthGate {
    token: Option<String>,
}

impl AuthGate {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Checks a presented token. With no secret configured every request
    /// is rejected rather than waved through.
    pub fn validate(&self, presented: Option<&str>) -> AuthOutcome {
        let Some(expected) = self.token.as_deref() else {
            return AuthOutcome::Invalid(AuthFailure::NotConfigured);
        };
        let Some(presented) = presented else {
            return AuthOutcome::Invalid(AuthFailure::Missing);
        };
        if constant_time_eq(presented, expected) {
            AuthOutcome::Valid
        } else {
            AuthOutcome::Invalid(AuthFailure::Mismatch)
        }
    }
}

/// Compares tokens without short-circuiting on the first differing byte.
fn constant_time_eq(received: &str, expected: &str) -> bool {
    if received.len() != expected.len() {
        return false;
    }
    let mut diff = 0u8;
    for (a, b) in received.bytes().zip(expected.bytes()) {
        diff |= a ^ b;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(window_secs),
        })
    }

    #[test]
    fn requests_under_the_limit_are_allowed() {
        let limiter = limiter(3, 60);
        let now = Instant::now();
        for _ in 0..3 {
            assert_eq!(limiter.admit_at("10.0.0.1", now), Admission::Allowed);
        }
    }

    #[test]
    fn requests_over_the_limit_are_rejected_with_retry_hint() {
        let limiter = limiter(2, 60);
        let now = Instant::now();
        assert_eq!(limiter.admit_at("10.0.0.1", now), Admission::Allowed);
        assert_eq!(limiter.admit_at("10.0.0.1", now), Admission::Allowed);

        let rejected = limiter.admit_at("10.0.0.1", now + Duration::from_secs(10));
        assert_eq!(
            rejected,
            Admission::Limited {
                retry_after_secs: 50
            }
        );
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = limiter(1, 60);
        let now = Instant::now();
        assert_eq!(limiter.admit_at("10.0.0.1", now), Admission::Allowed);
        assert!(matches!(
            limiter.admit_at("10.0.0.1", now + Duration::from_secs(59)),
            Admission::Limited { .. }
        ));
        assert_eq!(
            limiter.admit_at("10.0.0.1", now + Duration::from_secs(60)),
            Admission::Allowed
        );
    }

    #[test]
    fn identities_are_counted_separately() {
        let limiter = limiter(1, 60);
        let now = Instant::now();
        assert_eq!(limiter.admit_at("10.0.0.1", now), Admission::Allowed);
        assert_eq!(limiter.admit_at("10.0.0.2", now), Admission::Allowed);
        assert!(matches!(
            limiter.admit_at("10.0.0.1", now),
            Admission::Limited { .. }
        ));
    }

    #[test]
    fn retry_hint_is_never_zero() {
        let limiter = limiter(1, 60);
        let now = Instant::now();
        assert_eq!(limiter.admit_at("10.0.0.1", now), Admission::Allowed);
        let rejected = limiter.admit_at("10.0.0.1", now + Duration::from_millis(59_900));
        assert_eq!(
            rejected,
            Admission::Limited {
                retry_after_secs: 1
            }
        );
    }

    #[test]
    fn matching_token_is_accepted() {
        let gate = AuthGate::new(Some("s3cret-token".into()));
        assert_eq!(gate.validate(Some("s3cret-token")), AuthOutcome::Valid);
    }

    #[test]
    fn wrong_token_is_rejected() {
        let gate = AuthGate::new(Some("s3cret-token".into()));
        assert_eq!(
            gate.validate(Some("not-the-token")),
            AuthOutcome::Invalid(AuthFailure::Mismatch)
        );
    }

    #[test]
    fn absent_token_is_rejected() {
        let gate = AuthGate::new(Some("s3cret-token".into()));
        assert_eq!(
            gate.validate(None),
            AuthOutcome::Invalid(AuthFailure::Missing)
        );
    }

    #[test]
    fn unconfigured_gate_rejects_everything() {
        let gate = AuthGate::new(None);
        assert_eq!(
            gate.validate(Some("anything")),
            AuthOutcome::Invalid(AuthFailure::NotConfigured)
        );
        assert_eq!(
            gate.validate(None),
            AuthOutcome::Invalid(AuthFailure::NotConfigured)
        );
    }

    #[test]
    fn comparison_requires_equal_length_and_bytes() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(!constant_time_eq("", "a"));
        assert!(constant_time_eq("", ""));
    }
}
