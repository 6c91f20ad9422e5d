//! Configuration settings structures

use crate::configurable_value::{ConfigurableValue, ConfigurableValueError};
use rb_types::{AuthMode, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Upper bound on configured retries; beyond this a caller waits far too long
pub const MAX_CONFIGURED_RETRIES: u32 = 10;

/// Main back-office settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
	pub remote: RemoteSettings,
	pub client: ClientSettings,
	pub cache: CacheSettings,
	pub workflow: WorkflowSettings,
	pub logging: LoggingSettings,
}

/// Remote query service connection
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RemoteSettings {
	pub endpoint: String,
	pub default_auth_mode: AuthMode,
	/// API key used for `apiKey` auth, e.g. `{ type = "env", value = "BACKOFFICE_API_KEY" }`
	pub api_key: Option<ConfigurableValue>,
}

impl Default for RemoteSettings {
	fn default() -> Self {
		Self {
			endpoint: "http://localhost:20002/graphql".to_string(),
			default_auth_mode: AuthMode::ApiKey,
			api_key: None,
		}
	}
}

/// Delay growth between retry attempts
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum BackoffStrategy {
	Fixed,
	Linear,
	Exponential { multiplier: f64 },
}

/// Transport client behaviour
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ClientSettings {
	/// Additional attempts after the first one
	pub max_retries: u32,
	pub retry_delay_ms: u64,
	pub backoff: BackoffStrategy,
	/// Per-attempt timeout
	pub timeout_ms: u64,
	pub enable_metrics: bool,
	pub enable_logging: bool,
}

impl Default for ClientSettings {
	fn default() -> Self {
		Self {
			max_retries: 2,
			retry_delay_ms: 1000,
			backoff: BackoffStrategy::Linear,
			timeout_ms: 30_000,
			enable_metrics: true,
			enable_logging: true,
		}
	}
}

/// Repository cache TTLs
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CacheSettings {
	pub ttl_ms: u64,
	/// Per-model overrides keyed by model name, e.g. `Contacts`
	pub model_ttl_ms: HashMap<String, u64>,
}

impl Default for CacheSettings {
	fn default() -> Self {
		Self {
			ttl_ms: 5 * 60 * 1000,
			model_ttl_ms: HashMap::new(),
		}
	}
}

impl CacheSettings {
	/// Effective TTL for a model; override keys match case-insensitively
	pub fn ttl_for(&self, model: &str) -> u64 {
		self.model_ttl_ms
			.iter()
			.find(|(name, _)| name.eq_ignore_ascii_case(model))
			.map(|(_, ttl)| *ttl)
			.unwrap_or(self.ttl_ms)
	}
}

/// Workflow rule settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct WorkflowSettings {
	/// First business hour (inclusive, UTC)
	pub business_hours_start: u32,
	/// Last business hour (exclusive, UTC)
	pub business_hours_end: u32,
	/// Warn on transitions outside business hours
	pub warn_outside_business_hours: bool,
}

impl Default for WorkflowSettings {
	fn default() -> Self {
		Self {
			business_hours_start: 8,
			business_hours_end: 18,
			warn_outside_business_hours: true,
		}
	}
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
	pub structured: bool,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Pretty,
			structured: false,
		}
	}
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
	#[error("Remote endpoint must not be empty")]
	EmptyEndpoint,

	#[error("Invalid remote endpoint '{endpoint}': {reason}")]
	InvalidEndpoint { endpoint: String, reason: String },

	#[error("client.timeout_ms must be greater than zero")]
	ZeroTimeout,

	#[error("client.max_retries must be at most {max}, got {value}")]
	TooManyRetries { value: u32, max: u32 },

	#[error("Exponential backoff multiplier must be at least 1.0, got {0}")]
	InvalidBackoffMultiplier(f64),

	#[error("Business hours must satisfy start < end <= 24, got {start}-{end}")]
	InvalidBusinessHours { start: u32, end: u32 },
}

impl Settings {
	/// Check settings for values the client cannot work with
	pub fn validate(&self) -> Result<(), ConfigValidationError> {
		let endpoint = self.remote.endpoint.trim();
		if endpoint.is_empty() {
			return Err(ConfigValidationError::EmptyEndpoint);
		}
		url::Url::parse(endpoint).map_err(|e| ConfigValidationError::InvalidEndpoint {
			endpoint: endpoint.to_string(),
			reason: e.to_string(),
		})?;

		if self.client.timeout_ms == 0 {
			return Err(ConfigValidationError::ZeroTimeout);
		}
		if self.client.max_retries > MAX_CONFIGURED_RETRIES {
			return Err(ConfigValidationError::TooManyRetries {
				value: self.client.max_retries,
				max: MAX_CONFIGURED_RETRIES,
			});
		}
		if let BackoffStrategy::Exponential { multiplier } = self.client.backoff {
			if multiplier.is_nan() || multiplier < 1.0 {
				return Err(ConfigValidationError::InvalidBackoffMultiplier(multiplier));
			}
		}

		let (start, end) = (
			self.workflow.business_hours_start,
			self.workflow.business_hours_end,
		);
		if start >= end || end > 24 {
			return Err(ConfigValidationError::InvalidBusinessHours { start, end });
		}
		Ok(())
	}

	/// Resolve the configured API key, if any
	pub fn api_key(&self) -> Result<Option<SecretString>, ConfigurableValueError> {
		self.remote
			.api_key
			.as_ref()
			.map(ConfigurableValue::resolve_for_secret)
			.transpose()
	}
}
