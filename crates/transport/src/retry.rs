//! Retry policy with pluggable backoff

use std::time::Duration;

/// Growth of the delay between consecutive attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
	/// Same delay before every retry
	Fixed,
	/// `delay * retry`
	Linear,
	/// `delay * multiplier^(retry - 1)`
	Exponential { multiplier: f64 },
}

/// Retry policy for retryable failures
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
	/// Additional attempts after the first one
	pub max_retries: u32,
	/// Base delay between attempts in milliseconds
	pub retry_delay_ms: u64,
	pub backoff: Backoff,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: 2,
			retry_delay_ms: 1000,
			backoff: Backoff::Linear,
		}
	}
}

impl RetryPolicy {
	/// Policy that never retries
	pub fn none() -> Self {
		Self {
			max_retries: 0,
			..Self::default()
		}
	}

	pub fn max_attempts(&self) -> u32 {
		self.max_retries.saturating_add(1)
	}

	/// Delay before retry number `retry` (1-based)
	pub fn delay_for(&self, retry: u32) -> Duration {
		let retry = retry.max(1);
		let base = self.retry_delay_ms as f64;
		let millis = match self.backoff {
			Backoff::Fixed => base,
			Backoff::Linear => base * retry as f64,
			Backoff::Exponential { multiplier } => base * multiplier.powi(retry as i32 - 1),
		};
		Duration::from_millis(millis.max(0.0).round() as u64)
	}
}
