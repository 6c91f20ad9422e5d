//! Settings and wiring helpers for tests

#![allow(dead_code)]

use std::sync::Arc;

use renovation_backoffice::{Backoffice, BackofficeBuilder, BackoffStrategy, Settings};

use super::remote::InMemoryRemote;

/// Fast retries, short timeout, five-minute cache, no business-hours warning
pub fn test_settings() -> Settings {
	let mut settings = Settings::default();
	settings.remote.endpoint = "http://localhost:20002/graphql".to_string();
	settings.client.max_retries = 2;
	settings.client.retry_delay_ms = 100;
	settings.client.backoff = BackoffStrategy::Linear;
	settings.client.timeout_ms = 1_000;
	settings.workflow.warn_outside_business_hours = false;
	settings.logging.level = "debug".to_string();
	settings
}

/// Back office over a fresh in-memory remote
pub fn backoffice() -> (Backoffice, Arc<InMemoryRemote>) {
	backoffice_with(test_settings())
}

pub fn backoffice_with(settings: Settings) -> (Backoffice, Arc<InMemoryRemote>) {
	let remote = Arc::new(InMemoryRemote::new());
	let backoffice = BackofficeBuilder::new()
		.with_settings(settings)
		.with_executor(remote.clone())
		.build()
		.expect("test settings build");
	(backoffice, remote)
}
