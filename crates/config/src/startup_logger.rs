//! Startup logging for the back-office core

use crate::settings::Settings;
use std::env;
use tracing::{info, warn};

/// Logs service and configuration details at startup
pub fn log_service_info(settings: &Settings) {
	let service_name = "renovation-backoffice";
	let service_version = env!("CARGO_PKG_VERSION");

	info!("=== Renovation Back-Office Core Starting ===");
	info!("🚀 Service: {} v{}", service_name, service_version);
	info!("💻 Platform: {} ({})", env::consts::OS, env::consts::ARCH);

	if let Ok(rust_log) = env::var("RUST_LOG") {
		info!("🔧 Log Level: {}", rust_log);
	}

	info!("🌐 Remote endpoint: {}", settings.remote.endpoint);
	info!("🔑 Default auth mode: {}", settings.remote.default_auth_mode);
	match &settings.remote.api_key {
		Some(api_key) if api_key.is_insecure_default() => {
			warn!("⚠️ API key uses an insecure default value; configure a real key")
		},
		Some(api_key) => info!("🔑 API key source: {}", api_key.description()),
		None => info!("🔑 No API key configured"),
	}
	info!(
		"🔁 Retries: {} (delay {}ms, {:?}), timeout {}ms",
		settings.client.max_retries,
		settings.client.retry_delay_ms,
		settings.client.backoff,
		settings.client.timeout_ms
	);
	info!("🗃️ Default cache TTL: {}ms", settings.cache.ttl_ms);
	info!(
		"🕒 Started at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs that the transport client and repositories are wired up
pub fn log_client_ready(executor: &str, models: &[&str]) {
	info!("✅ Back-office core ready");
	info!("📡 Remote executor: {}", executor);
	info!("📦 Repositories: {}", models.join(", "));
}
