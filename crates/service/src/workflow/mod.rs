//! Status state machines
//!
//! Each status enum declares its outgoing edges. Validation looks the edge
//! up and reports errors, required fields and advisory warnings in a
//! [`TransitionResult`]; it never touches storage.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use rb_config::WorkflowSettings;
use serde::Serialize;
use serde_json::{Map, Value};

pub mod engine;
pub mod graphs;

pub use engine::{WorkflowEngine, WorkflowOutcome};
pub use graphs::{WorkflowAction, WorkflowEntity};

/// One permitted transition
#[derive(Debug, Clone, Copy)]
pub struct Edge<S: 'static> {
	pub target: S,
	/// Fields that must be set, on the entity or in the call, before the move
	pub required_fields: &'static [&'static str],
	/// Advisory message for a risky but permitted move
	pub warning: Option<&'static str>,
	/// Field whose presence silences `warning`
	pub waived_by: Option<&'static str>,
}

impl<S> Edge<S> {
	pub const fn to(target: S) -> Self {
		Self {
			target,
			required_fields: &[],
			warning: None,
			waived_by: None,
		}
	}

	pub const fn requires(mut self, fields: &'static [&'static str]) -> Self {
		self.required_fields = fields;
		self
	}

	pub const fn warns(mut self, warning: &'static str) -> Self {
		self.warning = Some(warning);
		self
	}

	pub const fn unless(mut self, field: &'static str) -> Self {
		self.waived_by = Some(field);
		self
	}
}

/// A status with a declared transition graph
pub trait WorkflowState: Copy + Eq + fmt::Display + Send + Sync + 'static {
	/// Entity type name used in messages
	const ENTITY: &'static str;

	fn as_str(&self) -> &'static str;

	/// Outgoing edges; empty for terminal states
	fn edges(&self) -> &'static [Edge<Self>];

	fn is_terminal(&self) -> bool {
		self.edges().is_empty()
	}

	fn edge_to(&self, target: Self) -> Option<&'static Edge<Self>> {
		self.edges().iter().find(|edge| edge.target == target)
	}

	/// Targets reachable in one step
	fn successors(&self) -> Vec<Self> {
		self.edges().iter().map(|edge| edge.target).collect()
	}
}

/// Outcome of a transition check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResult {
	pub is_valid: bool,
	pub errors: Vec<String>,
	pub warnings: Vec<String>,
	pub required_fields: Vec<String>,
}

impl TransitionResult {
	fn invalid(error: String) -> Self {
		Self {
			is_valid: false,
			errors: vec![error],
			..Default::default()
		}
	}
}

/// Check `current -> target` against the graph alone
pub fn validate_transition<S: WorkflowState>(current: S, target: S) -> TransitionResult {
	if current.is_terminal() {
		return TransitionResult::invalid(format!(
			"Cannot transition {} from terminal status '{}' to '{}'",
			S::ENTITY,
			current,
			target
		));
	}

	match current.edge_to(target) {
		Some(edge) => TransitionResult {
			is_valid: true,
			errors: Vec::new(),
			warnings: edge.warning.map(str::to_string).into_iter().collect(),
			required_fields: edge.required_fields.iter().map(|f| f.to_string()).collect(),
		},
		None => {
			let allowed = current
				.successors()
				.iter()
				.map(|s| s.as_str())
				.collect::<Vec<_>>()
				.join(", ");
			TransitionResult::invalid(format!(
				"Invalid {} transition from '{}' to '{}' (allowed: {})",
				S::ENTITY,
				current,
				target,
				allowed
			))
		},
	}
}

/// Mon-Fri window in UTC hours, `start` inclusive and `end` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
	pub start: u32,
	pub end: u32,
}

impl BusinessHours {
	pub fn contains(&self, at: DateTime<Utc>) -> bool {
		let weekday = !matches!(at.weekday(), Weekday::Sat | Weekday::Sun);
		weekday && (self.start..self.end).contains(&at.hour())
	}

	/// Window from settings, `None` when the warning is switched off
	pub fn from_settings(settings: &WorkflowSettings) -> Option<Self> {
		settings.warn_outside_business_hours.then_some(Self {
			start: settings.business_hours_start,
			end: settings.business_hours_end,
		})
	}
}

/// What is known about the entity when a transition is attempted
#[derive(Debug, Clone)]
pub struct TransitionContext {
	pub now: DateTime<Utc>,
	/// Non-null fields on the entity or supplied with the call
	pub present_fields: HashSet<String>,
	/// `None` disables the business-hours warning
	pub business_hours: Option<BusinessHours>,
}

impl TransitionContext {
	pub fn new(now: DateTime<Utc>) -> Self {
		Self {
			now,
			present_fields: HashSet::new(),
			business_hours: None,
		}
	}

	/// Collect present fields from the serialized entity and the call params
	pub fn for_entity(entity: &impl Serialize, params: &Map<String, Value>, now: DateTime<Utc>) -> Self {
		let mut context = Self::new(now);
		if let Ok(Value::Object(fields)) = serde_json::to_value(entity) {
			context.add_fields(&fields);
		}
		context.add_fields(params);
		context
	}

	pub fn with_business_hours(mut self, business_hours: Option<BusinessHours>) -> Self {
		self.business_hours = business_hours;
		self
	}

	pub fn with_field(mut self, field: impl Into<String>) -> Self {
		self.present_fields.insert(field.into());
		self
	}

	fn add_fields(&mut self, fields: &Map<String, Value>) {
		for (name, value) in fields {
			let present = match value {
				Value::Null => false,
				Value::String(s) => !s.trim().is_empty(),
				_ => true,
			};
			if present {
				self.present_fields.insert(name.clone());
			}
		}
	}

	fn has(&self, field: &str) -> bool {
		self.present_fields.contains(field)
	}
}

/// Check a transition with what is known about the entity
///
/// Required fields missing from the context make the result invalid. A
/// waived warning is dropped, and a move outside business hours adds a
/// warning without blocking.
pub fn validate_transition_at<S: WorkflowState>(
	current: S,
	target: S,
	context: &TransitionContext,
) -> TransitionResult {
	let mut result = validate_transition(current, target);
	if !result.is_valid {
		return result;
	}

	if let Some(edge) = current.edge_to(target) {
		if edge.waived_by.is_some_and(|field| context.has(field)) {
			result.warnings.clear();
		}
	}

	for field in &result.required_fields {
		if !context.has(field) {
			result
				.errors
				.push(format!("Field '{}' is required to move {} to '{}'", field, S::ENTITY, target));
		}
	}
	result.is_valid = result.errors.is_empty();

	if let Some(hours) = context.business_hours {
		if !hours.contains(context.now) {
			result.warnings.push(format!(
				"Transition to '{}' requested outside business hours ({:02}:00-{:02}:00 UTC, Mon-Fri)",
				target, hours.start, hours.end
			));
		}
	}
	result
}
