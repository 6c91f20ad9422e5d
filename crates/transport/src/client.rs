//! Transport client: timeout, retry, auth-mode defaulting and metrics

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rb_types::{
	AuthMode, MetricsBucket, MetricsSnapshot, MetricsTag, OperationError, OperationResult,
	Outcome, RemoteExecutor, RemoteOperation, TransportError,
};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::classifier::{DefaultClassifier, FailureClass, FailureClassifier};
use crate::retry::RetryPolicy;

/// Constructor-level client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
	pub retry: RetryPolicy,
	/// Per-attempt timeout used when the operation does not set one
	pub timeout_ms: u64,
	/// Auth mode used when the operation does not set one
	pub default_auth_mode: AuthMode,
	pub enable_metrics: bool,
	pub enable_logging: bool,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			retry: RetryPolicy::default(),
			timeout_ms: 30_000,
			default_auth_mode: AuthMode::ApiKey,
			enable_metrics: true,
			enable_logging: true,
		}
	}
}

/// Executes remote operations with retry and metrics
///
/// Metrics are owned by the instance and survive until [`clear_metrics`](Self::clear_metrics).
pub struct TransportClient {
	executor: Arc<dyn RemoteExecutor>,
	classifier: Arc<dyn FailureClassifier>,
	config: ClientConfig,
	metrics: DashMap<MetricsTag, MetricsBucket>,
}

impl TransportClient {
	pub fn new(executor: Arc<dyn RemoteExecutor>, config: ClientConfig) -> Self {
		Self {
			executor,
			classifier: Arc::new(DefaultClassifier),
			config,
			metrics: DashMap::new(),
		}
	}

	/// Replace the failure classifier
	pub fn with_classifier(mut self, classifier: Arc<dyn FailureClassifier>) -> Self {
		self.classifier = classifier;
		self
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	pub fn executor_name(&self) -> &str {
		self.executor.name()
	}

	/// Execute one logical call
	///
	/// Remote errors returned by a reachable service come back as warnings on
	/// a successful outcome; only transport-level failures produce `Err`.
	pub async fn execute(&self, operation: &RemoteOperation) -> OperationResult<Option<Value>> {
		let auth_mode = operation.auth_mode.unwrap_or(self.config.default_auth_mode);
		let timeout_ms = operation.timeout_ms.unwrap_or(self.config.timeout_ms);
		let started = Instant::now();

		let result = self.execute_with_retry(operation, auth_mode, timeout_ms).await;

		let latency_ms = started.elapsed().as_millis() as u64;
		if self.config.enable_metrics {
			self.metrics
				.entry(operation.metrics_tag.clone())
				.or_default()
				.record(result.is_ok(), latency_ms);
		}

		if self.config.enable_logging {
			match &result {
				Ok(outcome) if outcome.has_warnings() => debug!(
					"{} completed in {}ms with {} remote error(s)",
					operation.metrics_tag,
					latency_ms,
					outcome.warnings.len()
				),
				Ok(_) => debug!("{} completed in {}ms", operation.metrics_tag, latency_ms),
				Err(e) => warn!(
					"{} failed after {}ms: {}",
					operation.metrics_tag, latency_ms, e
				),
			}
		}

		result
	}

	async fn execute_with_retry(
		&self,
		operation: &RemoteOperation,
		auth_mode: AuthMode,
		timeout_ms: u64,
	) -> OperationResult<Option<Value>> {
		let max_attempts = self.config.retry.max_attempts();
		let mut attempt = 0;

		loop {
			attempt += 1;
			if self.config.enable_logging {
				debug!(
					"{} attempt {}/{} via {} ({})",
					operation.metrics_tag,
					attempt,
					max_attempts,
					self.executor.name(),
					auth_mode
				);
			}

			let error = match tokio::time::timeout(
				Duration::from_millis(timeout_ms),
				self.executor.execute(operation, auth_mode),
			)
			.await
			{
				Ok(Ok(response)) => return Ok(Outcome::with_warnings(response.data, response.errors)),
				Ok(Err(error)) => error,
				Err(_) => TransportError::Timeout { timeout_ms },
			};

			match self.classifier.classify(&error) {
				FailureClass::Retryable if attempt < max_attempts => {
					let delay = self.config.retry.delay_for(attempt);
					if self.config.enable_logging {
						warn!(
							"{} attempt {} failed: {}; retrying in {}ms",
							operation.metrics_tag,
							attempt,
							error,
							delay.as_millis()
						);
					}
					tokio::time::sleep(delay).await;
				},
				FailureClass::Retryable => return Err(Self::exhausted(error)),
				FailureClass::Unauthorized => {
					return Err(OperationError::unauthorized(error.to_string()))
				},
				FailureClass::Validation => {
					return Err(OperationError::validation(error.to_string()))
				},
				FailureClass::Fatal => return Err(OperationError::internal(error.to_string())),
			}
		}
	}

	/// Failure after the last retryable attempt
	fn exhausted(last_error: TransportError) -> OperationError {
		match last_error {
			TransportError::Timeout { timeout_ms } => OperationError::timeout(timeout_ms),
			other => OperationError::network(other.to_string()),
		}
	}

	/// Snapshot of every bucket, ordered by tag
	pub fn metrics(&self) -> Vec<(MetricsTag, MetricsSnapshot)> {
		let mut snapshots: Vec<_> = self
			.metrics
			.iter()
			.map(|entry| (entry.key().clone(), entry.value().snapshot()))
			.collect();
		snapshots.sort_by(|a, b| a.0.cmp(&b.0));
		snapshots
	}

	pub fn metrics_for(&self, tag: &MetricsTag) -> Option<MetricsSnapshot> {
		self.metrics.get(tag).map(|bucket| bucket.snapshot())
	}

	/// The only way metrics are reset
	pub fn clear_metrics(&self) {
		self.metrics.clear();
	}
}
