//! Backoff strategies.

use std::time::Duration;

/// Delay schedule for successive attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between attempts
    Fixed(Duration),
    /// Linear backoff: initial_delay + (attempt * increment)
    Linear { initial_delay: Duration, increment: Duration },
    /// Exponential backoff: initial_delay * base^attempt, capped at max_delay
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    pub fn exponential(initial_delay: Duration, base: f64, max_delay: Duration) -> Self {
        BackoffStrategy::Exponential { initial_delay, base, max_delay }
    }

    /// Calculate the delay for the given zero-based attempt.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Linear { initial_delay, increment } => {
                initial_delay.saturating_add(increment.saturating_mul(attempt))
            }
            BackoffStrategy::Exponential { initial_delay, base, max_delay } => {
                let cap = max_delay.as_millis() as f64;
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let delay = initial_delay.as_millis() as f64 * base.max(1.0).powi(exponent);
                // powi overflows to inf for large attempts; min() keeps it finite
                Duration::from_millis(delay.min(cap) as u64)
            }
        }
    }
}

/// Stateful cursor over a [`BackoffStrategy`].
#[derive(Debug, Clone)]
pub struct Backoff {
    strategy: BackoffStrategy,
    attempt: u32,
}

impl Backoff {
    pub fn new(strategy: BackoffStrategy) -> Self {
        Self { strategy, attempt: 0 }
    }

    /// Returns the current delay and advances to the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.strategy.calculate_delay(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Delay the next call to [`Backoff::next_delay`] would return.
    pub fn peek_delay(&self) -> Duration {
        self.strategy.calculate_delay(self.attempt)
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn strategy(&self) -> &BackoffStrategy {
        &self.strategy
    }

    /// Sleeps for the next delay and returns it.
    #[cfg(feature = "runtime")]
    pub async fn wait(&mut self) -> Duration {
        let delay = self.next_delay();
        tracing::trace!(attempt = self.attempt, delay_ms = delay.as_millis() as u64, "backing off");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        delay
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_delay())
    }
}
