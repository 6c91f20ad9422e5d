//! Renovation Back-Office Core
//!
//! Resilient data access to the remote query service plus the business rules
//! of the renovation back office: workflow transitions, lead scoring and
//! quote/project metrics.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

// Core domain types
pub use rb_types::{
	chrono,
	serde_json,
	AuthMode,
	Contact,
	ErrorKind,
	FieldError,
	FilterSpec,
	ListOptions,
	NewContact,
	NewProject,
	NewProperty,
	NewQuote,
	NewRequest,
	OperationError,
	OperationResult,
	Outcome,
	Page,
	Project,
	ProjectStatus,
	Property,
	Quote,
	QuoteStatus,
	RemoteError,
	RemoteExecutor,
	RemoteOperation,
	RemoteResponse,
	Request,
	RequestStatus,
	TransportError,
};

// Transport layer
pub use rb_transport::{Backoff, ClientConfig, HttpExecutor, RetryPolicy, TransportClient};

// Storage layer
pub use rb_storage::{
	CacheStats, CachedRepository, ContactRepository, EntityStore, ProjectRepository,
	PropertyRepository, QuoteRepository, RequestRepository,
};

// Service layer
pub use rb_service::{
	LeadScore, ProjectMetrics, ProjectService, QuoteMetrics, QuoteService, RequestService,
	RiskLevel, TransitionResult, WorkflowEngine, WorkflowOutcome,
};

// Config
pub use rb_config::{
	load_config, log_client_ready, log_service_info, BackoffStrategy, LogFormat, LoggingSettings,
	Settings,
};

pub mod types {
	pub use rb_types::*;
}

pub mod transport {
	pub use rb_transport::*;
}

pub mod storage {
	pub use rb_storage::*;
}

pub mod service {
	pub use rb_service::*;
}

pub mod config {
	pub use rb_config::*;
}

pub use async_trait;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
	#[error("Invalid configuration: {0}")]
	Config(#[from] rb_config::ConfigValidationError),

	#[error("Failed to load configuration: {0}")]
	Load(#[from] rb_config::ConfigLoadError),

	#[error("Failed to resolve API key: {0}")]
	Secret(#[from] rb_config::ConfigurableValueError),

	#[error("Failed to create remote executor: {0}")]
	Transport(#[from] TransportError),

	#[error("Failed to initialise tracing: {0}")]
	Tracing(String),
}

/// Wired-up back office: one transport client, one repository per model
/// and the business services on top of them
#[derive(Clone)]
pub struct Backoffice {
	pub client: Arc<TransportClient>,
	pub requests: Arc<RequestRepository>,
	pub quotes: Arc<QuoteRepository>,
	pub projects: Arc<ProjectRepository>,
	pub contacts: Arc<ContactRepository>,
	pub properties: Arc<PropertyRepository>,
	pub request_service: RequestService,
	pub quote_service: QuoteService,
	pub project_service: ProjectService,
	pub workflow: WorkflowEngine,
}

impl Backoffice {
	pub fn builder() -> BackofficeBuilder {
		BackofficeBuilder::new()
	}

	/// Cache statistics per model, in a stable order
	pub fn cache_stats(&self) -> Vec<(&'static str, CacheStats)> {
		vec![
			(self.requests.model(), self.requests.cache_stats()),
			(self.quotes.model(), self.quotes.cache_stats()),
			(self.projects.model(), self.projects.cache_stats()),
			(self.contacts.model(), self.contacts.cache_stats()),
			(self.properties.model(), self.properties.cache_stats()),
		]
	}

	pub fn clear_caches(&self) {
		self.requests.clear_cache();
		self.quotes.clear_cache();
		self.projects.clear_cache();
		self.contacts.clear_cache();
		self.properties.clear_cache();
	}
}

/// Builder for [`Backoffice`]
///
/// Without an explicit executor, an [`HttpExecutor`] is created for the
/// configured endpoint and API key.
#[derive(Default)]
pub struct BackofficeBuilder {
	settings: Settings,
	executor: Option<Arc<dyn RemoteExecutor>>,
}

impl BackofficeBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder from `config/config.*` and `BACKOFFICE__*` environment overrides
	pub fn from_config() -> Result<Self, BuildError> {
		Ok(Self::new().with_settings(load_config()?))
	}

	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = settings;
		self
	}

	/// Use a custom executor instead of HTTP
	pub fn with_executor(mut self, executor: Arc<dyn RemoteExecutor>) -> Self {
		self.executor = Some(executor);
		self
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn build(self) -> Result<Backoffice, BuildError> {
		let settings = self.settings;
		settings.validate()?;

		let executor = match self.executor {
			Some(executor) => executor,
			None => Arc::new(HttpExecutor::new(
				&settings.remote.endpoint,
				settings.api_key()?,
			)?) as Arc<dyn RemoteExecutor>,
		};

		let client = Arc::new(TransportClient::new(executor, client_config(&settings)));
		let ttl = |model: &str| Duration::from_millis(settings.cache.ttl_for(model));

		let requests = Arc::new(RequestRepository::new(client.clone(), ttl("Requests")));
		let quotes = Arc::new(QuoteRepository::new(client.clone(), ttl("Quotes")));
		let projects = Arc::new(ProjectRepository::new(client.clone(), ttl("Projects")));
		let contacts = Arc::new(ContactRepository::new(client.clone(), ttl("Contacts")));
		let properties = Arc::new(PropertyRepository::new(client.clone(), ttl("Properties")));

		let workflow = WorkflowEngine::new(&settings.workflow);
		let request_service = RequestService::new(requests.clone(), quotes.clone(), workflow.clone());
		let quote_service = QuoteService::new(quotes.clone(), projects.clone(), workflow.clone());
		let project_service = ProjectService::new(projects.clone(), workflow.clone());

		log_client_ready(
			client.executor_name(),
			&[
				requests.model(),
				quotes.model(),
				projects.model(),
				contacts.model(),
				properties.model(),
			],
		);

		Ok(Backoffice {
			client,
			requests,
			quotes,
			projects,
			contacts,
			properties,
			request_service,
			quote_service,
			project_service,
			workflow,
		})
	}
}

/// Transport client configuration from settings
pub fn client_config(settings: &Settings) -> ClientConfig {
	let backoff = match settings.client.backoff {
		BackoffStrategy::Fixed => Backoff::Fixed,
		BackoffStrategy::Linear => Backoff::Linear,
		BackoffStrategy::Exponential { multiplier } => Backoff::Exponential { multiplier },
	};

	ClientConfig {
		retry: RetryPolicy {
			max_retries: settings.client.max_retries,
			retry_delay_ms: settings.client.retry_delay_ms,
			backoff,
		},
		timeout_ms: settings.client.timeout_ms,
		default_auth_mode: settings.remote.default_auth_mode,
		enable_metrics: settings.client.enable_metrics,
		enable_logging: settings.client.enable_logging,
	}
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides the configured level.
pub fn init_tracing(logging: &LoggingSettings) -> Result<(), BuildError> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

	let result = match logging.format {
		LogFormat::Json => {
			let subscriber = tracing_subscriber::fmt().json().with_env_filter(env_filter);

			if logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
		LogFormat::Pretty => {
			let subscriber = tracing_subscriber::fmt()
				.pretty()
				.with_env_filter(env_filter);

			if logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
		LogFormat::Compact => {
			let subscriber = tracing_subscriber::fmt()
				.compact()
				.with_env_filter(env_filter);

			if logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
	};
	result.map_err(|e| BuildError::Tracing(e.to_string()))?;

	info!(
		"Logging configuration applied: level={}, format={:?}, structured={}",
		logging.level, logging.format, logging.structured
	);
	Ok(())
}

/// Load configuration, install tracing, log the startup banner and build
pub fn start() -> Result<Backoffice, BuildError> {
	let builder = BackofficeBuilder::from_config()?;
	init_tracing(&builder.settings().logging)?;
	log_service_info(builder.settings());
	builder.build()
}
