//! Renovation back-office types
//!
//! Shared models and traits for the back-office data-access core.
//! Entities are organised by business object; the remote-call model, metrics and
//! filter DSL are shared by the transport and repository layers.

pub mod contacts;
pub mod entity;
pub mod filter;
pub mod metrics;
pub mod models;
pub mod projects;
pub mod properties;
pub mod quotes;
pub mod remote;
pub mod requests;
pub mod wire;

// Re-export chrono and serde_json for convenience
pub use chrono;
pub use serde_json;

pub use remote::{
	AuthMode, ErrorKind, FieldError, MetricsTag, OperationError, OperationResult, Outcome,
	OutcomeMetadata, RemoteError, RemoteExecutor, RemoteOperation, RemoteResponse,
	TransportError,
};

pub use entity::EntityModel;
pub use filter::{Condition, FieldCondition, FilterSpec, ListOptions, Page};
pub use metrics::{MetricsBucket, MetricsSnapshot};
pub use models::SecretString;
pub use wire::MappingError;

pub use contacts::{Contact, ContactFilter, ContactPatch, ContactStatus, NewContact};
pub use projects::{Milestone, NewProject, Project, ProjectFilter, ProjectPatch, ProjectStatus};
pub use properties::{NewProperty, Property, PropertyFilter, PropertyPatch, PropertyStatus};
pub use quotes::{NewQuote, Quote, QuoteFilter, QuoteLineItem, QuotePatch, QuoteStatus};
pub use requests::{MediaItem, NewRequest, Request, RequestFilter, RequestPatch, RequestStatus};
