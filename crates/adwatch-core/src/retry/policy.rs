use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry; hand the failure back to the caller.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff with a cap and a bounded number of attempts.
///
/// The delay after attempt `k` (1-based) is
/// `min(initial_delay_ms * backoff_factor^(k-1), max_delay_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay after the first failed attempt, in milliseconds.
    pub initial_delay_ms: u64,
    /// Multiplier applied to the delay after each further failure.
    pub backoff_factor: f64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            backoff_factor: 2.0,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryConfig {
    /// Clamp out-of-range values: at least one attempt, factor at least 1.
    pub fn normalized(self) -> Self {
        let backoff_factor = if self.backoff_factor.is_nan() || self.backoff_factor < 1.0 {
            1.0
        } else {
            self.backoff_factor
        };
        Self {
            max_attempts: self.max_attempts.max(1),
            backoff_factor,
            ..self
        }
    }

    /// Delay to wait after the given failed attempt (1-based), capped at `max_delay_ms`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.initial_delay_ms == 0 {
            return Duration::ZERO;
        }
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let raw = self.initial_delay_ms as f64 * self.backoff_factor.powi(exp);
        let capped = raw.min(self.max_delay_ms as f64);
        Duration::from_millis(capped.round() as u64)
    }

    /// Decide what to do after `attempt` (1-based) failed.
    pub fn decide(&self, attempt: u32, retryable: bool) -> RetryDecision {
        if attempt >= self.max_attempts || !retryable {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.delay_after(attempt))
    }
}

/// Partial retry configuration: per-call overrides or the `[retry]` config section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
}

impl RetryOverrides {
    /// Apply the fields that are set on top of `base`.
    pub fn merge(&self, base: RetryConfig) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            initial_delay_ms: self.initial_delay_ms.unwrap_or(base.initial_delay_ms),
            backoff_factor: self.backoff_factor.unwrap_or(base.backoff_factor),
            max_delay_ms: self.max_delay_ms.unwrap_or(base.max_delay_ms),
        }
        .normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn defaults() {
        let c = RetryConfig::default();
        assert_eq!(c.max_attempts, 3);
        assert_eq!(c.initial_delay_ms, 1000);
        assert_eq!(c.backoff_factor, 2.0);
        assert_eq!(c.max_delay_ms, 10_000);
    }

    #[test]
    fn exponential_backoff_grows_and_is_capped() {
        let c = RetryConfig {
            max_attempts: 20,
            ..RetryConfig::default()
        };
        assert_eq!(c.delay_after(1), ms(1000));
        assert_eq!(c.delay_after(2), ms(2000));
        assert_eq!(c.delay_after(3), ms(4000));
        assert_eq!(c.delay_after(4), ms(8000));
        assert_eq!(c.delay_after(5), ms(10_000));
        assert_eq!(c.delay_after(19), ms(10_000));
    }

    #[test]
    fn huge_attempt_does_not_overflow() {
        let c = RetryConfig::default();
        assert_eq!(c.delay_after(u32::MAX), ms(10_000));
    }

    #[test]
    fn initial_delay_above_cap_is_capped() {
        let c = RetryConfig {
            initial_delay_ms: 5000,
            max_delay_ms: 1000,
            ..RetryConfig::default()
        };
        assert_eq!(c.delay_after(1), ms(1000));
    }

    #[test]
    fn fractional_factor() {
        let c = RetryConfig {
            initial_delay_ms: 100,
            backoff_factor: 1.5,
            ..RetryConfig::default()
        };
        assert_eq!(c.delay_after(1), ms(100));
        assert_eq!(c.delay_after(2), ms(150));
        assert_eq!(c.delay_after(3), ms(225));
    }

    #[test]
    fn respects_max_attempts() {
        let c = RetryConfig::default();
        assert!(matches!(c.decide(1, true), RetryDecision::RetryAfter(_)));
        assert!(matches!(c.decide(2, true), RetryDecision::RetryAfter(_)));
        assert_eq!(c.decide(3, true), RetryDecision::NoRetry);
    }

    #[test]
    fn non_retryable_stops_immediately() {
        assert_eq!(RetryConfig::default().decide(1, false), RetryDecision::NoRetry);
    }

    #[test]
    fn normalization_clamps_out_of_range_values() {
        let c = RetryConfig {
            max_attempts: 0,
            backoff_factor: 0.5,
            ..RetryConfig::default()
        }
        .normalized();
        assert_eq!(c.max_attempts, 1);
        assert_eq!(c.backoff_factor, 1.0);

        let nan = RetryConfig {
            backoff_factor: f64::NAN,
            ..RetryConfig::default()
        }
        .normalized();
        assert_eq!(nan.backoff_factor, 1.0);
    }

    #[test]
    fn overrides_merge_over_base() {
        let o = RetryOverrides {
            max_attempts: Some(5),
            initial_delay_ms: Some(100),
            ..RetryOverrides::default()
        };
        let c = o.merge(RetryConfig::default());
        assert_eq!(c.max_attempts, 5);
        assert_eq!(c.initial_delay_ms, 100);
        assert_eq!(c.backoff_factor, 2.0);
        assert_eq!(c.max_delay_ms, 10_000);

        assert_eq!(
            RetryOverrides::default().merge(RetryConfig::default()),
            RetryConfig::default()
        );
    }
}
