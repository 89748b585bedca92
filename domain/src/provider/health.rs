//! Provider health state.
//!
//! Health is derived from consecutive terminal failures on the request path
//! and from periodic probes issued by the health monitor. An `Unhealthy`
//! provider is skipped by default-resolution fallback until a probe succeeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rolling availability classification of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// No probe has completed yet.
    #[default]
    Unknown,
    /// A probe is currently in flight.
    Checking,
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    /// Whether default resolution may pick this provider.
    pub fn is_usable(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy)
    }
}

/// Live health bookkeeping for one provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthState {
    pub status: HealthStatus,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_check: Option<DateTime<Utc>>,
}

impl HealthState {
    /// Record a health-affecting terminal failure. Returns `true` if this
    /// failure crossed the threshold and flipped the provider to unhealthy.
    pub fn record_failure(&mut self, error: impl Into<String>, threshold: u32) -> bool {
        self.consecutive_failures += 1;
        self.last_error = Some(error.into());
        if self.consecutive_failures >= threshold && self.status != HealthStatus::Unhealthy {
            self.status = HealthStatus::Unhealthy;
            return true;
        }
        false
    }

    /// Record a successful call or probe: failures reset, status is healthy.
    pub fn record_success(&mut self, now: DateTime<Utc>) {
        self.consecutive_failures = 0;
        self.last_error = None;
        self.status = HealthStatus::Healthy;
        self.last_check = Some(now);
    }

    /// Mark a probe as started.
    pub fn begin_check(&mut self, now: DateTime<Utc>) {
        if self.status == HealthStatus::Unknown {
            self.status = HealthStatus::Checking;
        }
        self.last_check = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_below_threshold_keep_status() {
        let mut health = HealthState::default();
        assert!(!health.record_failure("timeout", 3));
        assert!(!health.record_failure("timeout", 3));
        assert_eq!(health.status, HealthStatus::Unknown);
        assert_eq!(health.consecutive_failures, 2);
    }

    #[test]
    fn test_threshold_flips_to_unhealthy_once() {
        let mut health = HealthState::default();
        health.record_failure("timeout", 2);
        assert!(health.record_failure("timeout", 2));
        assert_eq!(health.status, HealthStatus::Unhealthy);
        // Further failures keep it unhealthy without re-reporting a transition
        assert!(!health.record_failure("timeout", 2));
    }

    #[test]
    fn test_success_resets_counter_and_restores_health() {
        let mut health = HealthState::default();
        health.record_failure("connection refused", 1);
        assert_eq!(health.status, HealthStatus::Unhealthy);
        health.record_success(Utc::now());
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.consecutive_failures, 0);
        assert!(health.last_error.is_none());
    }

    #[test]
    fn test_unhealthy_is_not_usable() {
        assert!(HealthStatus::Unknown.is_usable());
        assert!(HealthStatus::Healthy.is_usable());
        assert!(!HealthStatus::Unhealthy.is_usable());
    }
}
