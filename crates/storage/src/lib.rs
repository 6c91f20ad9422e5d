//! Cached repositories
//!
//! [`CachedRepository`] implements CRUD, filtered listing and cursor
//! pagination for any [`EntityModel`](rb_types::EntityModel) on top of the
//! transport client, with a per-instance TTL cache for reads by id.

pub mod cache;
pub mod entities;
pub mod payload;
pub mod repository;
pub mod traits;

pub use cache::{CacheEntry, CacheStats, EntityCache};
pub use entities::{
	ContactRepository, ProjectRepository, PropertyRepository, QuoteRepository, RequestRepository,
};
pub use payload::RepositoryOperation;
pub use repository::CachedRepository;
pub use traits::EntityStore;
