//! Remote call model
//!
//! A [`RemoteOperation`] describes one query or mutation against the remote
//! schema-typed service. The service answers with a [`RemoteResponse`]
//! (`{ data, errors }`); the client turns that into an [`OperationResult`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub mod errors;
pub mod traits;

pub use errors::{ErrorKind, FieldError, OperationError, TransportError};
pub use traits::RemoteExecutor;

/// Result of a remote call or repository operation
pub type OperationResult<T> = Result<Outcome<T>, OperationError>;

/// Credential strategy for a single remote call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum AuthMode {
	/// Shared API key sent in the `x-api-key` header
	ApiKey,
	/// Authenticated user session token sent in the `Authorization` header
	UserPool,
}

impl AuthMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			AuthMode::ApiKey => "apiKey",
			AuthMode::UserPool => "userPool",
		}
	}
}

impl fmt::Display for AuthMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Caller-supplied metrics key for a remote call
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetricsTag {
	pub operation: String,
	pub model: String,
}

impl MetricsTag {
	pub fn new(operation: impl Into<String>, model: impl Into<String>) -> Self {
		Self {
			operation: operation.into(),
			model: model.into(),
		}
	}
}

impl fmt::Display for MetricsTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.operation, self.model)
	}
}

/// A single query or mutation against the remote service
///
/// Built once and passed by reference to every attempt, so retries always
/// send exactly the same payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteOperation {
	/// Query or mutation document
	pub payload: String,
	/// Named variables referenced by the payload
	pub variables: Map<String, Value>,
	/// Explicit auth mode; `None` uses the client's default
	pub auth_mode: Option<AuthMode>,
	/// Per-attempt timeout; `None` uses the client's default
	pub timeout_ms: Option<u64>,
	pub metrics_tag: MetricsTag,
}

impl RemoteOperation {
	pub fn new(payload: impl Into<String>, metrics_tag: MetricsTag) -> Self {
		Self {
			payload: payload.into(),
			variables: Map::new(),
			auth_mode: None,
			timeout_ms: None,
			metrics_tag,
		}
	}

	pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.variables.insert(name.into(), value.into());
		self
	}

	pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
		self.variables.extend(variables);
		self
	}

	pub fn with_auth_mode(mut self, auth_mode: AuthMode) -> Self {
		self.auth_mode = Some(auth_mode);
		self
	}

	pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.timeout_ms = Some(timeout_ms);
		self
	}

	/// Variables as a JSON object, ready for the request body
	pub fn variables_value(&self) -> Value {
		Value::Object(self.variables.clone())
	}
}

/// Application-level error reported by a reachable remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteError {
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<Vec<Value>>,
}

impl RemoteError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			error_type: None,
			path: None,
		}
	}

	pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
		self.error_type = Some(error_type.into());
		self
	}
}

impl fmt::Display for RemoteError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.error_type {
			Some(error_type) => write!(f, "{}: {}", error_type, self.message),
			None => write!(f, "{}", self.message),
		}
	}
}

/// Raw response body of the remote service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteResponse {
	#[serde(default)]
	pub data: Option<Value>,
	#[serde(default)]
	pub errors: Vec<RemoteError>,
}

impl RemoteResponse {
	pub fn data(data: Value) -> Self {
		Self {
			data: Some(data),
			errors: Vec::new(),
		}
	}

	pub fn with_errors(data: Option<Value>, errors: Vec<RemoteError>) -> Self {
		Self { data, errors }
	}
}

/// Extra information attached to a successful result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeMetadata {
	/// Served from the repository cache without a remote call
	pub cached: bool,
}

/// Successful result with any non-fatal remote errors attached
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
	pub data: T,
	pub warnings: Vec<RemoteError>,
	pub metadata: OutcomeMetadata,
}

impl<T> Outcome<T> {
	pub fn new(data: T) -> Self {
		Self {
			data,
			warnings: Vec::new(),
			metadata: OutcomeMetadata::default(),
		}
	}

	pub fn with_warnings(data: T, warnings: Vec<RemoteError>) -> Self {
		Self {
			data,
			warnings,
			metadata: OutcomeMetadata::default(),
		}
	}

	/// Result served from a local cache
	pub fn cached(data: T) -> Self {
		Self {
			data,
			warnings: Vec::new(),
			metadata: OutcomeMetadata { cached: true },
		}
	}

	pub fn is_cached(&self) -> bool {
		self.metadata.cached
	}

	pub fn has_warnings(&self) -> bool {
		!self.warnings.is_empty()
	}

	/// Transform the payload, keeping warnings and metadata
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
		Outcome {
			data: f(self.data),
			warnings: self.warnings,
			metadata: self.metadata,
		}
	}

	pub fn into_data(self) -> T {
		self.data
	}
}
