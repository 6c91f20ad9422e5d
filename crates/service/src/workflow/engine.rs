//! Workflow execution against a store

use chrono::{DateTime, Utc};
use rb_config::WorkflowSettings;
use rb_storage::EntityStore;
use rb_types::{FieldError, OperationError, OperationResult, Outcome};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::graphs::WorkflowEntity;
use super::{validate_transition_at, BusinessHours, TransitionContext, TransitionResult, WorkflowState};

/// Entity after a workflow action, with the checks that let it through
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOutcome<E> {
	pub entity: E,
	pub transition: TransitionResult,
}

/// Validates and applies workflow actions
#[derive(Debug, Clone, Default)]
pub struct WorkflowEngine {
	business_hours: Option<BusinessHours>,
}

impl WorkflowEngine {
	pub fn new(settings: &WorkflowSettings) -> Self {
		Self {
			business_hours: BusinessHours::from_settings(settings),
		}
	}

	pub fn business_hours(&self) -> Option<BusinessHours> {
		self.business_hours
	}

	/// Check moving `entity` to `target` given the fields supplied with the call
	pub fn check<E: WorkflowEntity>(
		&self,
		entity: &E,
		target: E::State,
		params: &Map<String, Value>,
		now: DateTime<Utc>,
	) -> TransitionResult {
		let context = self.context(entity, params, now);
		validate_transition_at(entity.state(), target, &context)
	}

	fn context<E: WorkflowEntity>(
		&self,
		entity: &E,
		params: &Map<String, Value>,
		now: DateTime<Utc>,
	) -> TransitionContext {
		TransitionContext::for_entity(entity, params, now).with_business_hours(self.business_hours)
	}

	pub async fn process_workflow<E: WorkflowEntity>(
		&self,
		store: &dyn EntityStore<E>,
		entity_id: &str,
		action: &str,
		params: Map<String, Value>,
	) -> OperationResult<WorkflowOutcome<E>> {
		self.process_workflow_at(store, entity_id, action, params, Utc::now())
			.await
	}

	/// Resolve the entity, validate the action's transition and write it
	///
	/// Nothing is written unless the transition is valid and the resulting
	/// patch passes the entity's field rules. `params` are entity fields
	/// (camelCase) applied together with the new status.
	pub async fn process_workflow_at<E: WorkflowEntity>(
		&self,
		store: &dyn EntityStore<E>,
		entity_id: &str,
		action: &str,
		params: Map<String, Value>,
		now: DateTime<Utc>,
	) -> OperationResult<WorkflowOutcome<E>> {
		let entity = store.find_by_id(entity_id).await?.into_data();
		let current = entity.state();

		let Some(resolved) = E::action(action, current, now) else {
			return Err(OperationError::validation(format!(
				"Invalid workflow action: {}",
				action
			)));
		};
		let target = resolved.target;

		let context = self.context(&entity, &params, now);
		let transition = validate_transition_at(current, target, &context);
		if !transition.is_valid {
			debug!(
				"Rejected {} on {} {}: {}",
				action,
				E::MODEL,
				entity_id,
				transition.errors.join("; ")
			);
			return Err(rejection(&transition, &context));
		}

		let mut fields = params;
		fields.extend(resolved.effects);
		fields.insert("status".to_string(), Value::from(target.as_str()));
		let patch: E::Patch = serde_json::from_value(Value::Object(fields)).map_err(|e| {
			OperationError::validation(format!("Invalid parameters for {}: {}", action, e))
		})?;
		E::validate_patch(&patch, now)?;

		let Outcome {
			data,
			warnings,
			metadata,
		} = store.update(entity_id, &patch).await?;

		info!(
			"{} {} moved from {} to {} via {}",
			E::MODEL,
			entity_id,
			current,
			target,
			action
		);
		Ok(Outcome {
			data: WorkflowOutcome {
				entity: data,
				transition,
			},
			warnings,
			metadata,
		})
	}
}

/// Validation failure for a rejected transition
fn rejection(transition: &TransitionResult, context: &TransitionContext) -> OperationError {
	let missing: Vec<FieldError> = transition
		.required_fields
		.iter()
		.filter(|field| !context.has(field))
		.map(|field| {
			FieldError::new(
				field.as_str(),
				"MISSING_REQUIRED_FIELD",
				format!("{} is required for this transition", field),
			)
		})
		.collect();

	if missing.is_empty() {
		OperationError::invalid_fields(vec![FieldError::new(
			"status",
			"INVALID_FIELD",
			transition.errors.join("; "),
		)])
	} else {
		let mut error = OperationError::validation(transition.errors.join("; "));
		error.field_errors = missing;
		error
	}
}
