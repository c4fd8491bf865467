//! Delays between bootstrap connection attempts.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Decides how long the background task waits after a failed connect
/// attempt before trying again.
///
/// Attempts are never capped: a producer keeps trying until it connects or
/// is shut down.
#[derive(Clone)]
pub enum RetryPolicy {
    /// The same interval after every failure.
    Fixed(Duration),

    /// Exponential growth from `initial`, capped at `max`.
    Exponential {
        /// Delay after the first failure.
        initial: Duration,
        /// Upper bound for any delay.
        max: Duration,
        /// Growth factor per failure.
        multiplier: f64,
    },

    /// Delay computed by a function of the failure count (1-based).
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl RetryPolicy {
    /// Fixed interval between attempts.
    pub fn fixed(interval: Duration) -> Self {
        RetryPolicy::Fixed(interval)
    }

    /// Doubling backoff from `initial` up to `max`.
    pub fn exponential(initial: Duration, max: Duration) -> Self {
        RetryPolicy::Exponential {
            initial,
            max,
            multiplier: 2.0,
        }
    }

    /// Delay from a custom function of the failure count.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        RetryPolicy::Custom(Arc::new(f))
    }

    /// Returns the wait after the `failures`-th failed attempt (1-based).
    pub fn delay_for_attempt(&self, failures: u32) -> Duration {
        match self {
            RetryPolicy::Fixed(interval) => *interval,
            RetryPolicy::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let exponent = failures.saturating_sub(1).min(i32::MAX as u32) as i32;
                let factor = multiplier.powi(exponent);
                if !factor.is_finite() || initial.as_secs_f64() * factor >= max.as_secs_f64() {
                    *max
                } else {
                    initial.mul_f64(factor)
                }
            }
            RetryPolicy::Custom(f) => f(failures),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Fixed(Duration::from_secs(1))
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(interval) => f.debug_tuple("RetryPolicy::Fixed").field(interval).finish(),
            Self::Exponential {
                initial,
                max,
                multiplier,
            } => f
                .debug_struct("RetryPolicy::Exponential")
                .field("initial", initial)
                .field("max", max)
                .field("multiplier", multiplier)
                .finish(),
            Self::Custom(_) => write!(f, "RetryPolicy::Custom"),
        }
    }
}
