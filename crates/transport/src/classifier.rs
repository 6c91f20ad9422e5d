//! Failure classification for retry decisions

use rb_types::TransportError;

/// Messages that name a transient condition of the remote service or network
const TRANSIENT_MARKERS: &[&str] = &[
	"NetworkError",
	"ECONNRESET",
	"ETIMEDOUT",
	"ServiceUnavailable",
	"ThrottlingException",
	"Failed to fetch",
	"socket hang up",
];

/// How the client should react to a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
	/// Transient; retried while attempts remain
	Retryable,
	/// Credentials missing or rejected
	Unauthorized,
	/// Request rejected as invalid
	Validation,
	/// Anything else that retrying cannot fix
	Fatal,
}

/// Decides whether a failed attempt is worth retrying
pub trait FailureClassifier: Send + Sync {
	fn classify(&self, error: &TransportError) -> FailureClass;
}

/// Classifier used unless the caller injects another
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl DefaultClassifier {
	fn classify_status(status: u16) -> FailureClass {
		match status {
			401 | 403 => FailureClass::Unauthorized,
			400 | 422 => FailureClass::Validation,
			408 | 429 | 500..=599 => FailureClass::Retryable,
			_ => FailureClass::Fatal,
		}
	}
}

/// True when the message names a known transient condition
pub fn is_transient_message(message: &str) -> bool {
	TRANSIENT_MARKERS
		.iter()
		.any(|marker| message.contains(marker))
}

impl FailureClassifier for DefaultClassifier {
	fn classify(&self, error: &TransportError) -> FailureClass {
		let class = match error {
			TransportError::Timeout { .. }
			| TransportError::Connection(_)
			| TransportError::Network(_) => FailureClass::Retryable,
			TransportError::Unauthorized(_) => return FailureClass::Unauthorized,
			TransportError::Validation(_) | TransportError::MalformedRequest(_) => {
				return FailureClass::Validation
			},
			TransportError::HttpStatusError { status_code, .. } => {
				Self::classify_status(*status_code)
			},
			TransportError::HttpError(e) => match e.status() {
				Some(status) => Self::classify_status(status.as_u16()),
				None if e.is_timeout() || e.is_connect() || e.is_request() => {
					FailureClass::Retryable
				},
				None => FailureClass::Fatal,
			},
			TransportError::InvalidResponse { .. } | TransportError::Serialization(_) => {
				FailureClass::Fatal
			},
		};

		if class == FailureClass::Fatal && is_transient_message(&error.to_string()) {
			FailureClass::Retryable
		} else {
			class
		}
	}
}
