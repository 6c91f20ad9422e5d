//! Storage seam used by the services and workflow engine

use async_trait::async_trait;
use rb_types::{EntityModel, FilterSpec, ListOptions, OperationResult, Page};

/// Data access for one business object
///
/// Implemented by [`CachedRepository`](crate::CachedRepository); services
/// depend on this trait so they can be exercised against in-memory stores.
#[async_trait]
pub trait EntityStore<E: EntityModel>: Send + Sync {
	/// Fetch one entity, `NOT_FOUND` when the remote returns nothing
	async fn find_by_id(&self, id: &str) -> OperationResult<E>;

	/// One page of entities matching the options
	async fn find_all(&self, options: ListOptions) -> OperationResult<Page<E>>;

	/// First entity matching the filter across all pages, `NOT_FOUND` if none
	async fn find_one(&self, filter: FilterSpec) -> OperationResult<E>;

	async fn create(&self, input: &E::Create) -> OperationResult<E>;

	/// Apply the set fields of `patch`
	async fn update(&self, id: &str, patch: &E::Patch) -> OperationResult<E>;

	/// Delete and return the removed entity
	async fn delete(&self, id: &str) -> OperationResult<E>;

	/// Number of matching entities across all pages
	async fn count(&self, filter: Option<FilterSpec>) -> OperationResult<u64>;

	async fn exists(&self, id: &str) -> OperationResult<bool>;
}
