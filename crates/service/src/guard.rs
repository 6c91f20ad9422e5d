//! Panic containment for service entry points

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use rb_types::{OperationError, OperationResult};
use tracing::error;

/// Run a service operation, turning a panic into `INTERNAL_ERROR`
///
/// The panic message is kept as the error message.
pub async fn guarded<T, F>(operation: &str, future: F) -> OperationResult<T>
where
	F: Future<Output = OperationResult<T>>,
{
	match AssertUnwindSafe(future).catch_unwind().await {
		Ok(result) => result,
		Err(panic) => {
			let message = panic_message(panic.as_ref());
			error!("{} panicked: {}", operation, message);
			Err(OperationError::internal(message))
		},
	}
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
	if let Some(message) = panic.downcast_ref::<&str>() {
		message.to_string()
	} else if let Some(message) = panic.downcast_ref::<String>() {
		message.clone()
	} else {
		"Unexpected panic".to_string()
	}
}
