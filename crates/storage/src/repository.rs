//! Generic cached repository

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rb_transport::TransportClient;
use rb_types::{
	AuthMode, EntityModel, ErrorKind, FilterSpec, ListOptions, OperationError, OperationResult,
	Outcome, Page, RemoteError, RemoteOperation,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::cache::{CacheStats, EntityCache};
use crate::payload::{document, root_field, RepositoryOperation};
use crate::traits::EntityStore;

/// Page size used when `find_one` and `count` walk the full result set
const SCAN_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListPayload {
	items: Vec<Value>,
	next_token: Option<String>,
}

/// CRUD for one entity over the transport client
///
/// Reads by id are served from an instance-owned TTL cache; every write
/// drops the cached entry for the id it touched, whether or not it succeeded.
pub struct CachedRepository<E: EntityModel> {
	client: Arc<TransportClient>,
	cache: EntityCache<E>,
	auth_mode: Option<AuthMode>,
}

impl<E: EntityModel> CachedRepository<E> {
	pub fn new(client: Arc<TransportClient>, cache_ttl: Duration) -> Self {
		Self {
			client,
			cache: EntityCache::new(cache_ttl),
			auth_mode: None,
		}
	}

	/// Use `auth_mode` for every call instead of the client's default
	pub fn with_auth_mode(mut self, auth_mode: AuthMode) -> Self {
		self.auth_mode = Some(auth_mode);
		self
	}

	pub fn model(&self) -> &'static str {
		E::MODEL
	}

	pub fn client(&self) -> &Arc<TransportClient> {
		&self.client
	}

	pub fn cache_stats(&self) -> CacheStats {
		self.cache.stats()
	}

	pub fn clear_cache(&self) {
		self.cache.clear();
		debug!("Cleared {} cache", E::MODEL);
	}

	fn operation(&self, operation: RepositoryOperation) -> RemoteOperation {
		let remote = RemoteOperation::new(
			document::<E>(operation),
			operation.metrics_tag(E::MODEL),
		);
		match self.auth_mode {
			Some(auth_mode) => remote.with_auth_mode(auth_mode),
			None => remote,
		}
	}

	/// Execute and unwrap the operation's root field; a null field becomes `None`
	async fn call(
		&self,
		operation: RepositoryOperation,
		remote: RemoteOperation,
	) -> OperationResult<Option<Value>> {
		let field = root_field(operation, E::MODEL);
		let outcome = self.client.execute(&remote).await?;
		Ok(outcome.map(|data| {
			data.and_then(|mut data| data.get_mut(&field).map(Value::take))
				.filter(|value| !value.is_null())
		}))
	}

	fn map_record(value: Value) -> Result<E, OperationError> {
		let record: E::Record = serde_json::from_value(value).map_err(|e| {
			OperationError::internal(format!("Unreadable {} record: {}", E::MODEL, e))
		})?;
		E::from_record(record).map_err(|e| {
			OperationError::internal(format!("Failed to map {} record: {}", E::MODEL, e))
		})
	}

	fn map_page(value: Value) -> Result<Page<E>, OperationError> {
		let payload: ListPayload = serde_json::from_value(value).map_err(|e| {
			OperationError::internal(format!("Unreadable {} page: {}", E::MODEL, e))
		})?;
		let items = payload
			.items
			.into_iter()
			.filter(|item| !item.is_null())
			.map(Self::map_record)
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Page {
			items,
			next_token: payload.next_token,
		})
	}

	/// The remote answered a mutation with no payload
	fn rejected(operation: RepositoryOperation, warnings: &[RemoteError]) -> OperationError {
		if warnings.is_empty() {
			OperationError::validation(format!(
				"Remote service rejected {} on {}",
				operation,
				E::MODEL
			))
		} else {
			OperationError::validation(
				warnings
					.iter()
					.map(ToString::to_string)
					.collect::<Vec<_>>()
					.join("; "),
			)
		}
	}

	async fn mutate(
		&self,
		operation: RepositoryOperation,
		input: Map<String, Value>,
	) -> OperationResult<E> {
		let remote = self
			.operation(operation)
			.with_variable("input", Value::Object(input));
		let Outcome {
			data,
			warnings,
			metadata,
		} = self.call(operation, remote).await?;

		match data {
			Some(value) => Ok(Outcome {
				data: Self::map_record(value)?,
				warnings,
				metadata,
			}),
			None => Err(Self::rejected(operation, &warnings)),
		}
	}

	/// Run a write for `id`, dropping its cache entry afterwards
	async fn write_through(
		&self,
		id: &str,
		operation: RepositoryOperation,
		input: Result<Map<String, Value>, OperationError>,
	) -> OperationResult<E> {
		let result = match input {
			Ok(input) => self.mutate(operation, input).await,
			Err(e) => Err(e),
		};
		self.cache.invalidate(id);

		if let Err(e) = &result {
			warn!("{} of {} {} failed: {}", operation, E::MODEL, id, e);
		}
		result
	}

	/// Walk every page matching `filter`, stopping when `visit` returns true
	async fn scan(
		&self,
		filter: Option<FilterSpec>,
		mut visit: impl FnMut(Vec<E>) -> bool + Send,
	) -> Result<Vec<RemoteError>, OperationError> {
		let mut options = ListOptions {
			filter,
			limit: Some(SCAN_PAGE_SIZE),
			next_token: None,
		};
		let mut warnings = Vec::new();

		loop {
			let outcome = self.find_all(options.clone()).await?;
			warnings.extend(outcome.warnings);
			let Page { items, next_token } = outcome.data;
			if visit(items) {
				break;
			}
			match next_token {
				// A repeated cursor would loop forever
				Some(token) if options.next_token.as_deref() != Some(token.as_str()) => {
					options.next_token = Some(token);
				},
				_ => break,
			}
		}
		Ok(warnings)
	}
}

#[async_trait]
impl<E: EntityModel> EntityStore<E> for CachedRepository<E> {
	async fn find_by_id(&self, id: &str) -> OperationResult<E> {
		if let Some(entity) = self.cache.get(id) {
			debug!("Cache hit for {} {}", E::MODEL, id);
			return Ok(Outcome::cached(entity));
		}

		let generation = self.cache.generation(id);
		let remote = self
			.operation(RepositoryOperation::Get)
			.with_variable("id", id);
		let Outcome {
			data,
			warnings,
			metadata,
		} = self.call(RepositoryOperation::Get, remote).await?;

		let value = data.ok_or_else(|| OperationError::not_found(E::MODEL, id))?;
		let entity = Self::map_record(value)?;
		self.cache.insert_if_current(id, entity.clone(), generation);

		Ok(Outcome {
			data: entity,
			warnings,
			metadata,
		})
	}

	async fn find_all(&self, options: ListOptions) -> OperationResult<Page<E>> {
		let mut remote = self.operation(RepositoryOperation::List);
		if let Some(filter) = options
			.filter
			.as_ref()
			.and_then(|filter| filter.to_wire(E::SEARCHABLE_FIELDS))
		{
			remote = remote.with_variable("filter", filter);
		}
		if let Some(limit) = options.limit {
			remote = remote.with_variable("limit", limit);
		}
		if let Some(next_token) = options.next_token {
			remote = remote.with_variable("nextToken", next_token);
		}

		let Outcome {
			data,
			warnings,
			metadata,
		} = self.call(RepositoryOperation::List, remote).await?;

		let page = match data {
			Some(value) => Self::map_page(value)?,
			None => Page {
				items: Vec::new(),
				next_token: None,
			},
		};
		Ok(Outcome {
			data: page,
			warnings,
			metadata,
		})
	}

	async fn find_one(&self, filter: FilterSpec) -> OperationResult<E> {
		let mut found = None;
		let warnings = self
			.scan(Some(filter), |items| {
				found = items.into_iter().next();
				found.is_some()
			})
			.await?;

		match found {
			Some(entity) => Ok(Outcome::with_warnings(entity, warnings)),
			None => Err(OperationError::new(
				ErrorKind::NotFound,
				format!("No {} matches the filter", E::MODEL),
			)),
		}
	}

	async fn create(&self, input: &E::Create) -> OperationResult<E> {
		let input = E::prepare_create(input, Utc::now()).map_err(|e| {
			OperationError::internal(format!("Failed to build {} input: {}", E::MODEL, e))
		})?;

		let outcome = self.mutate(RepositoryOperation::Create, input).await?;
		self.cache.invalidate(outcome.data.id());
		debug!("Created {} {}", E::MODEL, outcome.data.id());
		Ok(outcome)
	}

	async fn update(&self, id: &str, patch: &E::Patch) -> OperationResult<E> {
		let input = E::prepare_update(id, patch, Utc::now()).map_err(|e| {
			OperationError::internal(format!("Failed to build {} update: {}", E::MODEL, e))
		});
		self.write_through(id, RepositoryOperation::Update, input).await
	}

	async fn delete(&self, id: &str) -> OperationResult<E> {
		let mut input = Map::new();
		input.insert("id".to_string(), Value::String(id.to_string()));
		self.write_through(id, RepositoryOperation::Delete, Ok(input))
			.await
	}

	async fn count(&self, filter: Option<FilterSpec>) -> OperationResult<u64> {
		let mut total = 0u64;
		let warnings = self
			.scan(filter, |items| {
				total += items.len() as u64;
				false
			})
			.await?;
		Ok(Outcome::with_warnings(total, warnings))
	}

	async fn exists(&self, id: &str) -> OperationResult<bool> {
		match self.find_by_id(id).await {
			Ok(outcome) => Ok(outcome.map(|_| true)),
			Err(e) if e.is_not_found() => Ok(Outcome::new(false)),
			Err(e) => Err(e),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use mockall::mock;
	use rb_transport::{ClientConfig, RetryPolicy};
	use rb_types::{
		NewRequest, RemoteExecutor, RemoteResponse, Request, RequestPatch, RequestStatus,
		TransportError,
	};
	use serde_json::json;

	mock! {
		pub Executor {}

		#[async_trait]
		impl RemoteExecutor for Executor {
			async fn execute(
				&self,
				operation: &RemoteOperation,
				auth_mode: AuthMode,
			) -> Result<RemoteResponse, TransportError>;
		}
	}

	fn request_json(id: &str, status: &str) -> Value {
		json!({
			"id": id,
			"status": status,
			"message": "Kitchen remodel",
			"homeownerContactId": "contact-1",
			"uploadedMedia": "[{\"url\":\"s3://media/1.jpg\"}]",
			"archived": false,
			"createdAt": "2024-03-01T10:00:00Z",
			"updatedAt": "2024-03-01T10:00:00Z"
		})
	}

	fn repository(executor: MockExecutor, ttl: Duration) -> CachedRepository<Request> {
		let config = ClientConfig {
			retry: RetryPolicy::none(),
			..Default::default()
		};
		let client = Arc::new(TransportClient::new(Arc::new(executor), config));
		CachedRepository::new(client, ttl)
	}

	fn is_operation(operation: &RemoteOperation, name: &str) -> bool {
		operation.metrics_tag.operation == name
	}

	#[tokio::test]
	async fn test_find_by_id_is_cached() {
		let mut executor = MockExecutor::new();
		executor
			.expect_execute()
			.withf(|op, _| is_operation(op, "get") && op.variables["id"] == "req-1")
			.times(1)
			.returning(|_, _| {
				Ok(RemoteResponse::data(
					json!({"getRequests": request_json("req-1", "new")}),
				))
			});
		let repository = repository(executor, Duration::from_secs(60));

		let first = repository.find_by_id("req-1").await.unwrap();
		assert!(!first.is_cached());
		assert_eq!(first.data.uploaded_media.len(), 1);

		let second = repository.find_by_id("req-1").await.unwrap();
		assert!(second.is_cached());
		assert_eq!(second.data, first.data);

		let stats = repository.cache_stats();
		assert_eq!(stats.size, 1);
		assert_eq!(stats.hit_rate, 0.5);

		repository.clear_cache();
		assert_eq!(repository.cache_stats().size, 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_cache_entry_expires() {
		let mut executor = MockExecutor::new();
		executor.expect_execute().times(2).returning(|_, _| {
			Ok(RemoteResponse::data(
				json!({"getRequests": request_json("req-1", "new")}),
			))
		});
		let repository = repository(executor, Duration::from_millis(100));

		repository.find_by_id("req-1").await.unwrap();
		tokio::time::advance(Duration::from_millis(100)).await;
		let again = repository.find_by_id("req-1").await.unwrap();
		assert!(!again.is_cached());
	}

	/// Answers a read with the status current when it arrived, after `read_delay`
	struct SlowReadExecutor {
		status: std::sync::Mutex<&'static str>,
		read_delay: Duration,
	}

	#[async_trait]
	impl RemoteExecutor for SlowReadExecutor {
		async fn execute(
			&self,
			operation: &RemoteOperation,
			_auth_mode: AuthMode,
		) -> Result<RemoteResponse, TransportError> {
			if is_operation(operation, "update") {
				*self.status.lock().unwrap() = "assigned";
				return Ok(RemoteResponse::data(
					json!({"updateRequests": request_json("req-1", "assigned")}),
				));
			}
			let status = *self.status.lock().unwrap();
			tokio::time::sleep(self.read_delay).await;
			Ok(RemoteResponse::data(
				json!({"getRequests": request_json("req-1", status)}),
			))
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_read_overlapping_update_does_not_cache_old_record() {
		let executor = SlowReadExecutor {
			status: std::sync::Mutex::new("new"),
			read_delay: Duration::from_millis(200),
		};
		let config = ClientConfig {
			retry: RetryPolicy::none(),
			..Default::default()
		};
		let client = Arc::new(TransportClient::new(Arc::new(executor), config));
		let repository = CachedRepository::<Request>::new(client, Duration::from_secs(60));
		let patch = RequestPatch {
			assigned_to: Some("estimator-7".to_string()),
			..Default::default()
		};

		let (slow_read, update) = tokio::join!(repository.find_by_id("req-1"), async {
			tokio::time::sleep(Duration::from_millis(10)).await;
			repository.update("req-1", &patch).await
		});
		assert_eq!(slow_read.unwrap().data.status, RequestStatus::New);
		assert_eq!(update.unwrap().data.status, RequestStatus::Assigned);

		tokio::time::sleep(Duration::from_millis(200)).await;
		let after_write = repository.find_by_id("req-1").await.unwrap();
		assert!(!after_write.is_cached());
		assert_eq!(after_write.data.status, RequestStatus::Assigned);
	}

	#[tokio::test]
	async fn test_null_read_is_not_found() {
		let mut executor = MockExecutor::new();
		executor
			.expect_execute()
			.returning(|_, _| Ok(RemoteResponse::data(json!({"getRequests": null}))));
		let repository = repository(executor, Duration::from_secs(60));

		let error = repository.find_by_id("missing").await.unwrap_err();
		assert_eq!(error.code(), "NOT_FOUND");
		assert!(!repository.exists("missing").await.unwrap().data);
		assert_eq!(repository.cache_stats().size, 0);
	}

	#[tokio::test]
	async fn test_failed_update_still_invalidates_cache() {
		let mut executor = MockExecutor::new();
		executor
			.expect_execute()
			.withf(|op, _| is_operation(op, "get"))
			.times(2)
			.returning(|_, _| {
				Ok(RemoteResponse::data(
					json!({"getRequests": request_json("req-1", "new")}),
				))
			});
		executor
			.expect_execute()
			.withf(|op, _| is_operation(op, "update"))
			.times(1)
			.returning(|_, _| {
				Ok(RemoteResponse::with_errors(
					Some(json!({"updateRequests": null})),
					vec![RemoteError::new("The conditional request failed")
						.with_type("DynamoDB:ConditionalCheckFailedException")],
				))
			});
		let repository = repository(executor, Duration::from_secs(60));

		repository.find_by_id("req-1").await.unwrap();
		let patch = RequestPatch {
			status: Some(RequestStatus::Assigned),
			..Default::default()
		};
		let error = repository.update("req-1", &patch).await.unwrap_err();
		assert_eq!(error.kind, ErrorKind::ValidationFailed);
		assert!(error.message.contains("conditional request failed"));

		let reread = repository.find_by_id("req-1").await.unwrap();
		assert!(!reread.is_cached());
	}

	#[tokio::test]
	async fn test_update_sends_only_set_fields() {
		let mut executor = MockExecutor::new();
		executor
			.expect_execute()
			.withf(|op, _| {
				let input = op.variables["input"].as_object().unwrap();
				is_operation(op, "update")
					&& input["id"] == "req-1"
					&& input["assignedTo"] == "estimator-7"
					&& input.contains_key("updatedAt")
					&& !input.contains_key("message")
					&& !input.contains_key("status")
			})
			.times(1)
			.returning(|_, _| {
				let mut record = request_json("req-1", "new");
				record["assignedTo"] = json!("estimator-7");
				Ok(RemoteResponse::data(json!({"updateRequests": record})))
			});
		let repository = repository(executor, Duration::from_secs(60));

		let patch = RequestPatch {
			assigned_to: Some("estimator-7".to_string()),
			..Default::default()
		};
		let updated = repository.update("req-1", &patch).await.unwrap();
		assert_eq!(updated.data.assigned_to.as_deref(), Some("estimator-7"));
	}

	#[tokio::test]
	async fn test_create_applies_defaults() {
		let mut executor = MockExecutor::new();
		executor
			.expect_execute()
			.withf(|op, _| {
				let input = &op.variables["input"];
				is_operation(op, "create")
					&& input["status"] == "new"
					&& input["archived"] == false
					&& input["uploadedMedia"] == "[]"
					&& input["createdAt"].is_string()
			})
			.times(1)
			.returning(|op, _| {
				let mut record = op.variables["input"].clone();
				record["id"] = json!("req-new");
				Ok(RemoteResponse::data(json!({"createRequests": record})))
			});
		let repository = repository(executor, Duration::from_secs(60));

		let input = NewRequest {
			message: Some("Bathroom refresh".to_string()),
			homeowner_contact_id: Some("contact-1".to_string()),
			..Default::default()
		};
		let created = repository.create(&input).await.unwrap();
		assert_eq!(created.data.id, "req-new");
		assert_eq!(created.data.status, RequestStatus::New);
		assert!(created.data.uploaded_media.is_empty());
	}

	#[tokio::test]
	async fn test_find_all_translates_options() {
		let mut executor = MockExecutor::new();
		executor
			.expect_execute()
			.withf(|op, _| {
				is_operation(op, "list")
					&& op.variables["filter"]
						== json!({
							"status": {"eq": "new"},
							"or": [
								{"message": {"contains": "deck"}},
								{"product": {"contains": "deck"}},
								{"leadSource": {"contains": "deck"}}
							]
						}) && op.variables["limit"] == 2
					&& op.variables["nextToken"] == "opaque-1"
			})
			.times(1)
			.returning(|_, _| {
				Ok(RemoteResponse::data(json!({
					"listRequests": {
						"items": [request_json("req-1", "new"), null],
						"nextToken": "opaque-2"
					}
				})))
			});
		let repository = repository(executor, Duration::from_secs(60));

		let options = ListOptions::new()
			.with_filter(FilterSpec::new().eq("status", "new").search("deck"))
			.with_limit(2)
			.with_next_token("opaque-1");
		let page = repository.find_all(options).await.unwrap().data;
		assert_eq!(page.items.len(), 1);
		assert_eq!(page.next_token.as_deref(), Some("opaque-2"));
	}

	#[tokio::test]
	async fn test_count_and_find_one_walk_pages() {
		let mut executor = MockExecutor::new();
		executor.expect_execute().returning(|op, _| {
			let page = match op.variables.get("nextToken").and_then(Value::as_str) {
				None => json!({"items": [], "nextToken": "page-2"}),
				Some("page-2") => json!({
					"items": [request_json("req-1", "new"), request_json("req-2", "new")],
					"nextToken": "page-3"
				}),
				_ => json!({"items": [request_json("req-3", "quoted")], "nextToken": null}),
			};
			Ok(RemoteResponse::data(json!({ "listRequests": page })))
		});
		let repository = repository(executor, Duration::from_secs(60));

		assert_eq!(repository.count(None).await.unwrap().data, 3);

		let first = repository
			.find_one(FilterSpec::new().eq("status", "new"))
			.await
			.unwrap();
		assert_eq!(first.data.id, "req-1");
	}

	#[tokio::test]
	async fn test_unmappable_record_is_internal() {
		let mut executor = MockExecutor::new();
		executor.expect_execute().returning(|_, _| {
			Ok(RemoteResponse::data(
				json!({"getRequests": {"id": "req-1", "status": "teleported"}}),
			))
		});
		let repository = repository(executor, Duration::from_secs(60));

		let error = repository.find_by_id("req-1").await.unwrap_err();
		assert_eq!(error.kind, ErrorKind::Internal);
	}

	#[tokio::test]
	async fn test_transport_failure_passes_through() {
		let mut executor = MockExecutor::new();
		executor
			.expect_execute()
			.returning(|_, _| Err(TransportError::Connection("ECONNRESET".to_string())));
		let repository = repository(executor, Duration::from_secs(60));

		let error = repository.delete("req-1").await.unwrap_err();
		assert_eq!(error.kind, ErrorKind::NetworkError);
	}
}
