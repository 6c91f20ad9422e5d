//! In-memory entity store for service tests

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rb_storage::EntityStore;
use rb_types::{
	Condition, EntityModel, FilterSpec, ListOptions, OperationError, OperationResult, Outcome,
	Page,
};
use serde_json::{Map, Value};

/// Keeps wire-form records and maps them like the remote repository does
pub struct MemoryStore<E> {
	records: Mutex<BTreeMap<String, Map<String, Value>>>,
	next_id: AtomicU64,
	creates: AtomicU64,
	updates: AtomicU64,
	fail_writes: AtomicBool,
	_entity: PhantomData<fn() -> E>,
}

impl<E: EntityModel> MemoryStore<E> {
	pub fn new() -> Self {
		Self {
			records: Mutex::new(BTreeMap::new()),
			next_id: AtomicU64::new(1),
			creates: AtomicU64::new(0),
			updates: AtomicU64::new(0),
			fail_writes: AtomicBool::new(false),
			_entity: PhantomData,
		}
	}

	pub async fn insert(&self, input: &E::Create) -> E {
		self.create(input).await.unwrap().data
	}

	pub fn get(&self, id: &str) -> Option<E> {
		let records = self.records.lock().unwrap();
		records.get(id).map(|fields| map(fields).unwrap())
	}

	pub fn create_count(&self) -> u64 {
		self.creates.load(Ordering::SeqCst)
	}

	pub fn update_count(&self) -> u64 {
		self.updates.load(Ordering::SeqCst)
	}

	/// Make every following write fail with a network error
	pub fn fail_writes(&self, fail: bool) {
		self.fail_writes.store(fail, Ordering::SeqCst);
	}

	fn check_writable(&self) -> Result<(), OperationError> {
		if self.fail_writes.load(Ordering::SeqCst) {
			Err(OperationError::network("connection reset"))
		} else {
			Ok(())
		}
	}

	fn matching(&self, filter: Option<&FilterSpec>) -> Vec<E> {
		let records = self.records.lock().unwrap();
		records
			.values()
			.filter(|fields| filter.map_or(true, |filter| matches(fields, filter)))
			.map(|fields| map(fields).unwrap())
			.collect()
	}
}

fn map<E: EntityModel>(fields: &Map<String, Value>) -> Result<E, OperationError> {
	let record: E::Record = serde_json::from_value(Value::Object(fields.clone()))
		.map_err(|e| OperationError::internal(e.to_string()))?;
	E::from_record(record).map_err(|e| OperationError::internal(e.to_string()))
}

fn matches(fields: &Map<String, Value>, filter: &FilterSpec) -> bool {
	filter.conditions.iter().all(|condition| {
		let value = fields.get(&condition.field).unwrap_or(&Value::Null);
		match &condition.condition {
			Condition::Eq(expected) => value == expected,
			Condition::Contains(term) => value.as_str().is_some_and(|s| s.contains(term.as_str())),
			Condition::Between(..) => true,
		}
	})
}

#[async_trait]
impl<E: EntityModel> EntityStore<E> for MemoryStore<E> {
	async fn find_by_id(&self, id: &str) -> OperationResult<E> {
		self.get(id)
			.map(Outcome::new)
			.ok_or_else(|| OperationError::not_found(E::MODEL, id))
	}

	async fn find_all(&self, options: ListOptions) -> OperationResult<Page<E>> {
		Ok(Outcome::new(Page {
			items: self.matching(options.filter.as_ref()),
			next_token: None,
		}))
	}

	async fn find_one(&self, filter: FilterSpec) -> OperationResult<E> {
		self.matching(Some(&filter))
			.into_iter()
			.next()
			.map(Outcome::new)
			.ok_or_else(|| OperationError::not_found(E::MODEL, "filter"))
	}

	async fn create(&self, input: &E::Create) -> OperationResult<E> {
		self.check_writable()?;
		let mut fields = E::prepare_create(input, Utc::now())
			.map_err(|e| OperationError::internal(e.to_string()))?;
		let id = format!(
			"{}-{}",
			E::MODEL.to_lowercase(),
			self.next_id.fetch_add(1, Ordering::SeqCst)
		);
		fields.insert("id".to_string(), Value::String(id.clone()));

		let entity = map(&fields)?;
		self.records.lock().unwrap().insert(id, fields);
		self.creates.fetch_add(1, Ordering::SeqCst);
		Ok(Outcome::new(entity))
	}

	async fn update(&self, id: &str, patch: &E::Patch) -> OperationResult<E> {
		self.check_writable()?;
		let changes = E::prepare_update(id, patch, Utc::now())
			.map_err(|e| OperationError::internal(e.to_string()))?;

		let mut records = self.records.lock().unwrap();
		let fields = records
			.get_mut(id)
			.ok_or_else(|| OperationError::validation("The conditional request failed"))?;
		fields.extend(changes);
		let entity = map(fields)?;
		self.updates.fetch_add(1, Ordering::SeqCst);
		Ok(Outcome::new(entity))
	}

	async fn delete(&self, id: &str) -> OperationResult<E> {
		self.check_writable()?;
		let fields = self
			.records
			.lock()
			.unwrap()
			.remove(id)
			.ok_or_else(|| OperationError::validation("The conditional request failed"))?;
		map(&fields).map(Outcome::new)
	}

	async fn count(&self, filter: Option<FilterSpec>) -> OperationResult<u64> {
		Ok(Outcome::new(self.matching(filter.as_ref()).len() as u64))
	}

	async fn exists(&self, id: &str) -> OperationResult<bool> {
		Ok(Outcome::new(self.records.lock().unwrap().contains_key(id)))
	}
}
