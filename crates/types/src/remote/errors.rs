//! Error types for remote calls

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure of a single raw attempt against the remote service
///
/// Produced by a [`RemoteExecutor`](super::RemoteExecutor); the transport client
/// classifies it and decides whether to retry.
#[derive(Error, Debug)]
pub enum TransportError {
	#[error("HTTP request failed: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("HTTP {status_code}: {reason}")]
	HttpStatusError { status_code: u16, reason: String },

	#[error("Connection error: {0}")]
	Connection(String),

	#[error("Network error: {0}")]
	Network(String),

	#[error("Timeout occurred after {timeout_ms}ms")]
	Timeout { timeout_ms: u64 },

	#[error("Unauthorized: {0}")]
	Unauthorized(String),

	#[error("Validation error: {0}")]
	Validation(String),

	#[error("Malformed request: {0}")]
	MalformedRequest(String),

	#[error("Invalid response format: {reason}")]
	InvalidResponse { reason: String },

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl TransportError {
	/// Extract HTTP status code from the error if available
	pub fn status_code(&self) -> Option<u16> {
		match self {
			TransportError::HttpStatusError { status_code, .. } => Some(*status_code),
			TransportError::HttpError(reqwest_error) => {
				reqwest_error.status().map(|status| status.as_u16())
			},
			_ => None,
		}
	}

	/// Create an HTTP failure error from response status with default reason
	pub fn from_http_failure(status_code: u16) -> Self {
		let reason = match status_code {
			400 => "Bad Request".to_string(),
			401 => "Unauthorized".to_string(),
			403 => "Forbidden".to_string(),
			404 => "Not Found".to_string(),
			408 => "Request Timeout".to_string(),
			429 => "Too Many Requests".to_string(),
			500 => "Internal Server Error".to_string(),
			502 => "Bad Gateway".to_string(),
			503 => "Service Unavailable".to_string(),
			504 => "Gateway Timeout".to_string(),
			_ => format!("HTTP Error {}", status_code),
		};

		Self::HttpStatusError {
			status_code,
			reason,
		}
	}
}

/// Stable failure taxonomy shared by every layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
	/// Retryable failure that exhausted its retries
	NetworkError,
	/// Every attempt up to the last one timed out
	Timeout,
	Unauthorized,
	/// Rejected input, locally or by the remote service
	ValidationFailed,
	NotFound,
	/// Unexpected condition such as an unreadable response or a caught panic
	Internal,
}

impl ErrorKind {
	pub fn code(&self) -> &'static str {
		match self {
			ErrorKind::NetworkError => "NETWORK_ERROR",
			ErrorKind::Timeout => "TIMEOUT",
			ErrorKind::Unauthorized => "UNAUTHORIZED",
			ErrorKind::ValidationFailed => "VALIDATION_FAILED",
			ErrorKind::NotFound => "NOT_FOUND",
			ErrorKind::Internal => "INTERNAL_ERROR",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.code())
	}
}

/// Field-level validation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
	pub field: String,
	pub code: String,
	pub message: String,
}

impl FieldError {
	pub fn new(
		field: impl Into<String>,
		code: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		Self {
			field: field.into(),
			code: code.into(),
			message: message.into(),
		}
	}
}

/// Typed failure returned across every layer boundary
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{kind}: {message}")]
pub struct OperationError {
	pub kind: ErrorKind,
	pub message: String,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub field_errors: Vec<FieldError>,
}

impl OperationError {
	pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		let message = message.into();
		Self {
			kind,
			// Failures always carry a message
			message: if message.is_empty() {
				kind.code().to_string()
			} else {
				message
			},
			field_errors: Vec::new(),
		}
	}

	pub fn network(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::NetworkError, message)
	}

	pub fn timeout(timeout_ms: u64) -> Self {
		Self::new(
			ErrorKind::Timeout,
			format!("Operation timed out after {}ms", timeout_ms),
		)
	}

	pub fn unauthorized(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::Unauthorized, message)
	}

	pub fn validation(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::ValidationFailed, message)
	}

	/// Validation failure summarising the given field errors
	pub fn invalid_fields(field_errors: Vec<FieldError>) -> Self {
		let message = field_errors
			.iter()
			.map(|e| e.message.as_str())
			.collect::<Vec<_>>()
			.join("; ");
		Self {
			field_errors,
			..Self::validation(message)
		}
	}

	pub fn not_found(model: &str, id: &str) -> Self {
		Self::new(ErrorKind::NotFound, format!("{} not found: {}", model, id))
	}

	pub fn internal(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::Internal, message)
	}

	/// Stable error code for display layers
	pub fn code(&self) -> &'static str {
		self.kind.code()
	}

	pub fn is_not_found(&self) -> bool {
		self.kind == ErrorKind::NotFound
	}

	/// Codes of the attached field errors
	pub fn field_codes(&self) -> Vec<&str> {
		self.field_errors.iter().map(|e| e.code.as_str()).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_transport_error_status_code_extraction() {
		let error = TransportError::HttpStatusError {
			status_code: 503,
			reason: "Service Unavailable".to_string(),
		};
		assert_eq!(error.status_code(), Some(503));

		let error = TransportError::from_http_failure(429);
		assert_eq!(error.status_code(), Some(429));
		assert!(error.to_string().contains("Too Many Requests"));

		let error = TransportError::Network("socket hang up".to_string());
		assert_eq!(error.status_code(), None);
	}

	#[test]
	fn test_operation_error_codes() {
		assert_eq!(OperationError::network("down").code(), "NETWORK_ERROR");
		assert_eq!(OperationError::timeout(100).code(), "TIMEOUT");
		assert_eq!(OperationError::not_found("Requests", "r-1").code(), "NOT_FOUND");
		assert_eq!(
			OperationError::not_found("Requests", "r-1").message,
			"Requests not found: r-1"
		);
	}

	#[test]
	fn test_empty_message_falls_back_to_code() {
		let error = OperationError::internal("");
		assert_eq!(error.message, "INTERNAL_ERROR");
	}

	#[test]
	fn test_invalid_fields_joins_messages() {
		let error = OperationError::invalid_fields(vec![
			FieldError::new("totalAmount", "INVALID_AMOUNT", "Total amount cannot be negative"),
			FieldError::new("validUntil", "VALID_UNTIL_IN_PAST", "Valid-until date is in the past"),
		]);
		assert_eq!(error.kind, ErrorKind::ValidationFailed);
		assert_eq!(error.field_codes(), vec!["INVALID_AMOUNT", "VALID_UNTIL_IN_PAST"]);
		assert!(error.message.contains("negative"));
		assert!(error.message.contains("past"));
	}
}
