//! Per-operation call metrics
//!
//! A [`MetricsBucket`] aggregates logical calls for one (operation, model) tag.
//! Buckets live for the lifetime of the owning client and are only reset by an
//! explicit clear.

use serde::{Deserialize, Serialize};

/// Aggregate counters for one metrics tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsBucket {
	/// Logical calls, counted once regardless of retry attempts
	pub total_requests: u64,
	pub success_count: u64,
	/// Sum of wall-clock durations from first attempt to final resolution
	pub cumulative_latency_ms: u64,
}

impl MetricsBucket {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record the resolution of one logical call
	pub fn record(&mut self, was_successful: bool, latency_ms: u64) {
		self.total_requests += 1;
		if was_successful {
			self.success_count += 1;
		}
		self.cumulative_latency_ms = self.cumulative_latency_ms.saturating_add(latency_ms);
	}

	/// Success rate as a whole percentage, rounded to nearest
	pub fn success_rate(&self) -> u32 {
		if self.total_requests == 0 {
			return 0;
		}
		((self.success_count as f64 / self.total_requests as f64) * 100.0).round() as u32
	}

	/// Mean response time in milliseconds
	pub fn average_response_time_ms(&self) -> f64 {
		if self.total_requests == 0 {
			return 0.0;
		}
		self.cumulative_latency_ms as f64 / self.total_requests as f64
	}

	pub fn snapshot(&self) -> MetricsSnapshot {
		MetricsSnapshot {
			total_requests: self.total_requests,
			success_count: self.success_count,
			success_rate: self.success_rate(),
			average_response_time_ms: self.average_response_time_ms(),
		}
	}
}

/// Read-only view of a bucket for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
	pub total_requests: u64,
	pub success_count: u64,
	/// Whole percent, 0-100
	pub success_rate: u32,
	pub average_response_time_ms: f64,
}
