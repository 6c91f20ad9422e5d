//! Back-office configuration
//!
//! Settings for the remote endpoint, the transport client, repository caching,
//! workflow rules and logging, plus startup banners.

pub mod configurable_value;
pub mod loader;
pub mod settings;
pub mod startup_logger;

pub use configurable_value::{ConfigurableValue, ConfigurableValueError, ValueType};
pub use loader::{load_config, load_config_from, ConfigLoadError};
pub use settings::{
	BackoffStrategy, CacheSettings, ClientSettings, ConfigValidationError, LogFormat,
	LoggingSettings, RemoteSettings, Settings, WorkflowSettings,
};
pub use startup_logger::{log_client_ready, log_service_info};
