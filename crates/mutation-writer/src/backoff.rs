//! Retry delay policies for failed chunk transactions.

use std::time::Duration;

/// Delay applied between attempts of the same chunk.
///
/// Retries are unbounded; the policy only decides how long to wait.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffPolicy {
    /// The same delay after every failure.
    Fixed(Duration),
    /// `initial * multiplier^(attempt - 1)`, capped at `max`.
    Exponential {
        initial: Duration,
        max: Duration,
        multiplier: f64,
    },
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::Fixed(Duration::from_secs(1))
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (1 = first retry).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            BackoffPolicy::Fixed(delay) => *delay,
            BackoffPolicy::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let exponent = attempt.saturating_sub(1).min(64) as i32;
                let secs = initial.as_secs_f64() * multiplier.max(1.0).powi(exponent);
                if !secs.is_finite() || secs >= max.as_secs_f64() {
                    *max
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
        }
    }
}
