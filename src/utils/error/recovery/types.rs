//! Types and configurations for error recovery patterns

use std::time::Duration;

/// How long to wait before the next attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Same delay after every failure
    Fixed(Duration),
    /// Delay grows by `multiplier` after every failure, capped at `max`
    Exponential {
        base: Duration,
        multiplier: f64,
        max: Duration,
    },
    /// Explicit delays; the last one repeats once the list is exhausted
    Schedule(Vec<Duration>),
}

impl Backoff {
    /// Delay after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential {
                base,
                multiplier,
                max,
            } => {
                let exponent = attempt.saturating_sub(1).min(32) as i32;
                let millis = base.as_millis() as f64 * multiplier.powi(exponent);
                if !millis.is_finite() || millis >= max.as_millis() as f64 {
                    *max
                } else {
                    Duration::from_millis(millis as u64)
                }
            }
            Backoff::Schedule(delays) => {
                let index = (attempt.saturating_sub(1) as usize).min(delays.len().saturating_sub(1));
                delays.get(index).copied().unwrap_or_default()
            }
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay between attempts
    pub backoff: Backoff,
    /// Whether to add jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(100),
                multiplier: 2.0,
                max: Duration::from_secs(30),
            },
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Agent delivery: ten attempts with exponential backoff
    pub fn delivery() -> Self {
        Self {
            max_attempts: 10,
            backoff: Backoff::Exponential {
                base: Duration::from_secs(1),
                multiplier: 2.0,
                max: Duration::from_secs(30),
            },
            jitter: true,
        }
    }

    /// Database writes: one attempt plus retries after 1s, 3s and 5s
    pub fn database() -> Self {
        Self {
            max_attempts: 4,
            backoff: Backoff::Schedule(vec![
                Duration::from_secs(1),
                Duration::from_secs(3),
                Duration::from_secs(5),
            ]),
            jitter: false,
        }
    }
}
