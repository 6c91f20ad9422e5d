//! Filter DSL and list options
//!
//! A [`FilterSpec`] is the entity-neutral form of a list filter. It is
//! translated into the remote service's filter expression:
//!
//! ```text
//! { field: { eq: v } | { contains: v } | { between: [lo, hi] }, or: [ ...clauses ] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Comparison applied to one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
	Eq(Value),
	Contains(String),
	Between(Value, Value),
}

impl Condition {
	fn to_wire(&self) -> Value {
		match self {
			Condition::Eq(value) => json!({ "eq": value }),
			Condition::Contains(term) => json!({ "contains": term }),
			Condition::Between(lo, hi) => json!({ "between": [lo, hi] }),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCondition {
	pub field: String,
	pub condition: Condition,
}

fn clause(field: &str, condition: Value) -> Value {
	let mut clause = Map::new();
	clause.insert(field.to_string(), condition);
	Value::Object(clause)
}

/// Entity-neutral list filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
	pub conditions: Vec<FieldCondition>,
	/// Free-text term matched against the entity's searchable fields
	pub search: Option<String>,
}

impl FilterSpec {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.push(field, Condition::Eq(value.into()));
		self
	}

	pub fn contains(mut self, field: impl Into<String>, term: impl Into<String>) -> Self {
		self.push(field, Condition::Contains(term.into()));
		self
	}

	pub fn between(
		mut self,
		field: impl Into<String>,
		lo: impl Into<Value>,
		hi: impl Into<Value>,
	) -> Self {
		self.push(field, Condition::Between(lo.into(), hi.into()));
		self
	}

	pub fn search(mut self, term: impl Into<String>) -> Self {
		self.search = Some(term.into());
		self
	}

	/// Add an equality condition only when a value is present
	pub fn eq_opt<V: Into<Value>>(self, field: &str, value: Option<V>) -> Self {
		match value {
			Some(v) => self.eq(field, v),
			None => self,
		}
	}

	/// Add a range condition only when a range is present
	pub fn between_opt<V: Into<Value>>(self, field: &str, range: Option<(V, V)>) -> Self {
		match range {
			Some((lo, hi)) => self.between(field, lo, hi),
			None => self,
		}
	}

	pub fn search_opt(self, term: Option<String>) -> Self {
		match term {
			Some(term) => self.search(term),
			None => self,
		}
	}

	fn push(&mut self, field: impl Into<String>, condition: Condition) {
		self.conditions.push(FieldCondition {
			field: field.into(),
			condition,
		});
	}

	fn search_term(&self) -> Option<&str> {
		self.search
			.as_deref()
			.map(str::trim)
			.filter(|term| !term.is_empty())
	}

	pub fn is_empty(&self) -> bool {
		self.conditions.is_empty() && self.search_term().is_none()
	}

	/// Translate into the remote filter expression
	///
	/// Returns `None` when nothing would be filtered, so the variable can be
	/// omitted entirely. A second condition on an already-filtered field is
	/// moved into an `and` list instead of overwriting the first.
	pub fn to_wire(&self, searchable_fields: &[&str]) -> Option<Value> {
		let mut expression = Map::new();
		let mut and_clauses = Vec::new();

		for FieldCondition { field, condition } in &self.conditions {
			if expression.contains_key(field) {
				and_clauses.push(clause(field, condition.to_wire()));
			} else {
				expression.insert(field.clone(), condition.to_wire());
			}
		}

		if !and_clauses.is_empty() {
			expression.insert("and".to_string(), Value::Array(and_clauses));
		}

		if let Some(term) = self.search_term() {
			if !searchable_fields.is_empty() {
				let clauses = searchable_fields
					.iter()
					.map(|field| clause(field, json!({ "contains": term })))
					.collect();
				expression.insert("or".to_string(), Value::Array(clauses));
			}
		}

		if expression.is_empty() {
			None
		} else {
			Some(Value::Object(expression))
		}
	}
}

/// Options for a paginated list call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
	pub filter: Option<FilterSpec>,
	pub limit: Option<u32>,
	/// Opaque cursor echoed from the previous page
	pub next_token: Option<String>,
}

impl ListOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_filter(mut self, filter: impl Into<FilterSpec>) -> Self {
		self.filter = Some(filter.into());
		self
	}

	pub fn with_limit(mut self, limit: u32) -> Self {
		self.limit = Some(limit);
		self
	}

	pub fn with_next_token(mut self, next_token: impl Into<String>) -> Self {
		self.next_token = Some(next_token.into());
		self
	}
}

/// One page of a list call
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
	pub items: Vec<T>,
	/// Cursor for the following page, exactly as the remote service returned it
	pub next_token: Option<String>,
}

impl<T> Page<T> {
	pub fn has_more(&self) -> bool {
		self.next_token.is_some()
	}
}
