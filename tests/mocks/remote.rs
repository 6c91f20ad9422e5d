//! In-process stand-in for the remote query service
//!
//! Understands the `getX`/`listX`/`createX`/`updateX`/`deleteX` root fields
//! the repositories send, evaluates the filter expression and pages results
//! with an opaque offset cursor.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use renovation_backoffice::{
	AuthMode, RemoteError, RemoteExecutor, RemoteOperation, RemoteResponse, TransportError,
};
use serde_json::{json, Map, Value};

const DEFAULT_PAGE_SIZE: usize = 100;

type Table = BTreeMap<String, Map<String, Value>>;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
	pub root_field: String,
	pub auth_mode: AuthMode,
	pub variables: Map<String, Value>,
}

#[derive(Default)]
pub struct InMemoryRemote {
	tables: Mutex<HashMap<String, Table>>,
	next_id: AtomicU64,
	calls: Mutex<Vec<RecordedCall>>,
	failures: Mutex<VecDeque<TransportError>>,
	rejections: Mutex<VecDeque<Vec<RemoteError>>>,
	latency: Mutex<Duration>,
}

impl InMemoryRemote {
	pub fn new() -> Self {
		Self::default()
	}

	/// Store a record as-is and return its id
	pub fn seed(&self, model: &str, mut record: Map<String, Value>) -> String {
		let id = match record.get("id").and_then(Value::as_str) {
			Some(id) => id.to_string(),
			None => {
				let id = self.next_id(model);
				record.insert("id".to_string(), Value::String(id.clone()));
				id
			},
		};
		self.tables
			.lock()
			.unwrap()
			.entry(model.to_string())
			.or_default()
			.insert(id.clone(), record);
		id
	}

	pub fn record(&self, model: &str, id: &str) -> Option<Map<String, Value>> {
		self.tables
			.lock()
			.unwrap()
			.get(model)
			.and_then(|table| table.get(id).cloned())
	}

	pub fn len(&self, model: &str) -> usize {
		self.tables
			.lock()
			.unwrap()
			.get(model)
			.map_or(0, BTreeMap::len)
	}

	/// Fail the next attempts with these errors, one per attempt
	pub fn fail_next(&self, errors: impl IntoIterator<Item = TransportError>) {
		self.failures.lock().unwrap().extend(errors);
	}

	/// Answer the next call with a null payload and these remote errors
	pub fn reject_next(&self, errors: Vec<RemoteError>) {
		self.rejections.lock().unwrap().push_back(errors);
	}

	/// Delay every answer by `latency`
	pub fn set_latency(&self, latency: Duration) {
		*self.latency.lock().unwrap() = latency;
	}

	pub fn calls(&self) -> Vec<RecordedCall> {
		self.calls.lock().unwrap().clone()
	}

	pub fn call_count(&self) -> usize {
		self.calls.lock().unwrap().len()
	}

	/// Calls whose root field is `root_field`, e.g. `getRequests`
	pub fn calls_to(&self, root_field: &str) -> usize {
		self.calls
			.lock()
			.unwrap()
			.iter()
			.filter(|call| call.root_field == root_field)
			.count()
	}

	fn next_id(&self, model: &str) -> String {
		format!(
			"{}-{:04}",
			model.to_lowercase(),
			self.next_id.fetch_add(1, Ordering::SeqCst) + 1
		)
	}

	fn answer(&self, root_field: &str, variables: &Map<String, Value>) -> RemoteResponse {
		let Some((verb, model)) = split_root_field(root_field) else {
			return RemoteResponse::with_errors(
				None,
				vec![RemoteError::new(format!("Unknown field {}", root_field))
					.with_type("ValidationError")],
			);
		};

		let mut tables = self.tables.lock().unwrap();
		let table = tables.entry(model.to_string()).or_default();
		let id_of = |key: &str| {
			variables
				.get(key)
				.and_then(|input| if key == "id" { Some(input) } else { input.get("id") })
				.and_then(Value::as_str)
				.map(str::to_string)
		};

		let result = match verb {
			"get" => id_of("id")
				.and_then(|id| table.get(&id).cloned())
				.map(Value::Object)
				.unwrap_or(Value::Null),
			"list" => list(table, variables),
			"create" => {
				let mut input = object(variables.get("input"));
				let id = match input.get("id").and_then(Value::as_str) {
					Some(id) => id.to_string(),
					None => self.next_id(model),
				};
				input.insert("id".to_string(), Value::String(id.clone()));
				table.insert(id, input.clone());
				Value::Object(input)
			},
			"update" => match table.get_mut(&id_of("input").unwrap_or_default()) {
				Some(record) => {
					record.extend(object(variables.get("input")));
					Value::Object(record.clone())
				},
				None => return conditional_failure(root_field),
			},
			"delete" => match table.remove(&id_of("input").unwrap_or_default()) {
				Some(record) => Value::Object(record),
				None => return conditional_failure(root_field),
			},
			_ => Value::Null,
		};

		RemoteResponse::data(json!({ root_field: result }))
	}
}

#[async_trait]
impl RemoteExecutor for InMemoryRemote {
	async fn execute(
		&self,
		operation: &RemoteOperation,
		auth_mode: AuthMode,
	) -> Result<RemoteResponse, TransportError> {
		let root_field = root_field(&operation.payload);
		self.calls.lock().unwrap().push(RecordedCall {
			root_field: root_field.clone(),
			auth_mode,
			variables: operation.variables.clone(),
		});

		let latency = *self.latency.lock().unwrap();
		if !latency.is_zero() {
			tokio::time::sleep(latency).await;
		}

		if let Some(error) = self.failures.lock().unwrap().pop_front() {
			return Err(error);
		}
		if let Some(errors) = self.rejections.lock().unwrap().pop_front() {
			return Ok(RemoteResponse::with_errors(
				Some(json!({ root_field.clone(): null })),
				errors,
			));
		}

		Ok(self.answer(&root_field, &operation.variables))
	}

	fn name(&self) -> &str {
		"in-memory"
	}
}

/// First field selected by the document, e.g. `listQuotes`
fn root_field(payload: &str) -> String {
	payload
		.split_once('{')
		.map(|(_, body)| body.trim_start())
		.unwrap_or_default()
		.chars()
		.take_while(|c| c.is_ascii_alphanumeric())
		.collect()
}

fn split_root_field(root_field: &str) -> Option<(&str, &str)> {
	["get", "list", "create", "update", "delete"]
		.into_iter()
		.find_map(|verb| {
			root_field
				.strip_prefix(verb)
				.filter(|model| !model.is_empty())
				.map(|model| (verb, model))
		})
}

fn object(value: Option<&Value>) -> Map<String, Value> {
	value.and_then(Value::as_object).cloned().unwrap_or_default()
}

fn conditional_failure(root_field: &str) -> RemoteResponse {
	RemoteResponse::with_errors(
		Some(json!({ root_field: null })),
		vec![RemoteError::new("The conditional request failed")
			.with_type("DynamoDB:ConditionalCheckFailedException")],
	)
}

fn list(table: &Table, variables: &Map<String, Value>) -> Value {
	let filter = variables.get("filter").filter(|filter| !filter.is_null());
	let limit = variables
		.get("limit")
		.and_then(Value::as_u64)
		.map_or(DEFAULT_PAGE_SIZE, |limit| limit as usize);
	let offset = variables
		.get("nextToken")
		.and_then(Value::as_str)
		.and_then(|token| token.strip_prefix("offset:"))
		.and_then(|offset| offset.parse::<usize>().ok())
		.unwrap_or(0);

	let matching: Vec<&Map<String, Value>> = table
		.values()
		.filter(|record| filter.map_or(true, |filter| matches(record, filter)))
		.collect();
	let items: Vec<Value> = matching
		.iter()
		.skip(offset)
		.take(limit)
		.map(|record| Value::Object((*record).clone()))
		.collect();
	let next_token = (offset + limit < matching.len()).then(|| format!("offset:{}", offset + limit));

	json!({ "items": items, "nextToken": next_token })
}

fn matches(record: &Map<String, Value>, expression: &Value) -> bool {
	let Some(expression) = expression.as_object() else {
		return true;
	};

	expression.iter().all(|(key, condition)| match key.as_str() {
		"and" => clauses(condition).all(|clause| matches(record, clause)),
		"or" => clauses(condition).any(|clause| matches(record, clause)),
		field => field_matches(record.get(field).unwrap_or(&Value::Null), condition),
	})
}

fn clauses(value: &Value) -> impl Iterator<Item = &Value> {
	value.as_array().into_iter().flatten()
}

fn field_matches(value: &Value, condition: &Value) -> bool {
	if let Some(expected) = condition.get("eq") {
		return value == expected;
	}
	if let Some(term) = condition.get("contains").and_then(Value::as_str) {
		return value.as_str().is_some_and(|s| s.contains(term));
	}
	if let Some([lo, hi]) = condition.get("between").and_then(Value::as_array).map(Vec::as_slice) {
		return compare(value, lo).is_some_and(|o| o.is_ge()) && compare(value, hi).is_some_and(|o| o.is_le());
	}
	false
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
	match (a, b) {
		(Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
		(Value::String(a), Value::String(b)) => Some(a.cmp(b)),
		_ => None,
	}
}
