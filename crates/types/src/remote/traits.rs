//! Executor trait for pluggable remote backends

use super::{AuthMode, RemoteOperation, RemoteResponse, TransportError};
use async_trait::async_trait;

/// Performs one raw attempt of a remote operation
///
/// Implementations must not retry or time out on their own; the transport
/// client wraps every attempt with its timeout and retry policy. A reachable
/// service that reports application errors should return `Ok` with the errors
/// in [`RemoteResponse::errors`].
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
	/// Execute the operation with the resolved auth mode
	async fn execute(
		&self,
		operation: &RemoteOperation,
		auth_mode: AuthMode,
	) -> Result<RemoteResponse, TransportError>;

	/// Human-readable backend name for logs
	fn name(&self) -> &str {
		"remote"
	}
}
