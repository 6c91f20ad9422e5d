//! Declarative per-entity configuration
//!
//! Each business object implements [`EntityModel`] once. The generic
//! repository uses it to build payloads, translate filters and map wire
//! records, so no entity re-implements CRUD.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::wire::{self, MappingError};

/// Shape and defaulting rules of one remote model
pub trait EntityModel: Clone + Send + Sync + 'static {
	/// Wire representation as returned by the remote service
	type Record: DeserializeOwned + Send;
	/// Input accepted by `create`
	type Create: Serialize + Send + Sync;
	/// Partial update; `None` fields are never sent
	type Patch: Serialize + DeserializeOwned + Default + Send + Sync;

	/// Remote model name, e.g. `Requests`
	const MODEL: &'static str;
	/// Fields selected on every read
	const FIELDS: &'static [&'static str];
	/// Fields matched by a free-text search term
	const SEARCHABLE_FIELDS: &'static [&'static str];

	fn id(&self) -> &str;

	/// Map a wire record into the domain entity
	fn from_record(record: Self::Record) -> Result<Self, MappingError>;

	/// Build the create mutation input, applying entity defaults
	fn prepare_create(
		input: &Self::Create,
		now: DateTime<Utc>,
	) -> Result<Map<String, Value>, MappingError>;

	/// Build the update mutation input from the set fields of a patch
	fn prepare_update(
		id: &str,
		patch: &Self::Patch,
		now: DateTime<Utc>,
	) -> Result<Map<String, Value>, MappingError> {
		let mut input = wire::to_object(patch)?;
		strip_nulls(&mut input);
		input.insert("id".to_string(), Value::String(id.to_string()));
		input.insert("updatedAt".to_string(), Value::String(now.to_rfc3339()));
		Ok(input)
	}

	/// Selection set used by queries and mutations
	fn selection() -> String {
		Self::FIELDS.join(" ")
	}
}

/// Stamp `createdAt`/`updatedAt` onto a create input
pub fn stamp_created(input: &mut Map<String, Value>, now: DateTime<Utc>) {
	let now = Value::String(now.to_rfc3339());
	input.insert("createdAt".to_string(), now.clone());
	input.insert("updatedAt".to_string(), now);
}

/// Drop unset fields so a mutation never nulls out untouched values
pub fn strip_nulls(input: &mut Map<String, Value>) {
	input.retain(|_, value| !value.is_null());
}
