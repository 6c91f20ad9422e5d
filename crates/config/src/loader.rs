//! Configuration loading utilities

use crate::settings::ConfigValidationError;
use crate::Settings;
use config::{Config, ConfigError, Environment, File};
use tracing::debug;

/// Prefix of environment overrides, e.g. `BACKOFFICE__CLIENT__MAX_RETRIES=4`
pub const ENV_PREFIX: &str = "BACKOFFICE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
	#[error("Failed to load configuration: {0}")]
	Load(#[from] ConfigError),

	#[error("Invalid configuration: {0}")]
	Invalid(#[from] ConfigValidationError),
}

/// Load `config/config.*` (optional) layered with environment overrides
pub fn load_config() -> Result<Settings, ConfigLoadError> {
	load_config_from("config/config")
}

/// Load from an explicit file path (extension optional) plus environment overrides
pub fn load_config_from(path: &str) -> Result<Settings, ConfigLoadError> {
	let s = Config::builder()
		.add_source(File::with_name(path).required(false))
		.add_source(
			Environment::with_prefix(ENV_PREFIX)
				.separator("__")
				.try_parsing(true),
		)
		.build()?;

	let settings: Settings = s.try_deserialize()?;
	settings.validate()?;
	debug!("Loaded configuration for endpoint {}", settings.remote.endpoint);
	Ok(settings)
}
