//! Renovation projects executed from an approved quote

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub mod storage;

pub use storage::ProjectRecord;

use crate::entity::{stamp_created, strip_nulls, EntityModel};
use crate::filter::FilterSpec;
use crate::wire::{self, encode_collection, encode_optional_collection, MappingError};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
	#[default]
	Planning,
	Approved,
	InProgress,
	OnHold,
	UnderReview,
	Completed,
	Cancelled,
	Archived,
}

impl ProjectStatus {
	pub const ALL: [ProjectStatus; 8] = [
		ProjectStatus::Planning,
		ProjectStatus::Approved,
		ProjectStatus::InProgress,
		ProjectStatus::OnHold,
		ProjectStatus::UnderReview,
		ProjectStatus::Completed,
		ProjectStatus::Cancelled,
		ProjectStatus::Archived,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			ProjectStatus::Planning => "planning",
			ProjectStatus::Approved => "approved",
			ProjectStatus::InProgress => "in_progress",
			ProjectStatus::OnHold => "on_hold",
			ProjectStatus::UnderReview => "under_review",
			ProjectStatus::Completed => "completed",
			ProjectStatus::Cancelled => "cancelled",
			ProjectStatus::Archived => "archived",
		}
	}

	/// Work has started and not yet finished
	pub fn is_active(&self) -> bool {
		matches!(
			self,
			ProjectStatus::InProgress | ProjectStatus::OnHold | ProjectStatus::UnderReview
		)
	}
}

impl FromStr for ProjectStatus {
	type Err = MappingError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|status| status.as_str() == s)
			.ok_or_else(|| MappingError::InvalidValue {
				field: "status".to_string(),
				value: s.to_string(),
			})
	}
}

impl fmt::Display for ProjectStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub due_date: Option<DateTime<Utc>>,
	#[serde(default)]
	pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
	pub id: String,
	pub status: ProjectStatus,
	pub title: Option<String>,
	pub description: Option<String>,
	pub quote_id: Option<String>,
	pub request_id: Option<String>,
	pub address_id: Option<String>,
	pub homeowner_contact_id: Option<String>,
	pub agent_contact_id: Option<String>,
	pub assigned_to: Option<String>,
	pub budget: Option<f64>,
	pub actual_cost: Option<f64>,
	pub start_date: Option<DateTime<Utc>>,
	pub estimated_completion_date: Option<DateTime<Utc>>,
	pub actual_completion_date: Option<DateTime<Utc>>,
	pub cancellation_reason: Option<String>,
	pub archived: bool,
	pub milestones: Vec<Milestone>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
	pub status: Option<ProjectStatus>,
	pub title: Option<String>,
	pub description: Option<String>,
	pub quote_id: Option<String>,
	pub request_id: Option<String>,
	pub address_id: Option<String>,
	pub homeowner_contact_id: Option<String>,
	pub agent_contact_id: Option<String>,
	pub assigned_to: Option<String>,
	pub budget: Option<f64>,
	pub start_date: Option<DateTime<Utc>>,
	pub estimated_completion_date: Option<DateTime<Utc>>,
	#[serde(serialize_with = "encode_collection")]
	pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectPatch {
	pub status: Option<ProjectStatus>,
	pub title: Option<String>,
	pub description: Option<String>,
	pub assigned_to: Option<String>,
	pub budget: Option<f64>,
	pub actual_cost: Option<f64>,
	pub start_date: Option<DateTime<Utc>>,
	pub estimated_completion_date: Option<DateTime<Utc>>,
	pub actual_completion_date: Option<DateTime<Utc>>,
	pub cancellation_reason: Option<String>,
	pub archived: Option<bool>,
	#[serde(serialize_with = "encode_optional_collection", skip_deserializing)]
	pub milestones: Option<Vec<Milestone>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFilter {
	pub status: Option<ProjectStatus>,
	pub quote_id: Option<String>,
	pub assigned_to: Option<String>,
	pub homeowner_contact_id: Option<String>,
	pub archived: Option<bool>,
	pub budget_range: Option<(f64, f64)>,
	pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
	pub search: Option<String>,
}

impl From<ProjectFilter> for FilterSpec {
	fn from(filter: ProjectFilter) -> Self {
		FilterSpec::new()
			.eq_opt("status", filter.status.map(|s| s.as_str()))
			.eq_opt("quoteId", filter.quote_id)
			.eq_opt("assignedTo", filter.assigned_to)
			.eq_opt("homeownerContactId", filter.homeowner_contact_id)
			.eq_opt("archived", filter.archived)
			.between_opt("budget", filter.budget_range)
			.between_opt(
				"createdAt",
				filter
					.date_range
					.map(|(from, to)| (from.to_rfc3339(), to.to_rfc3339())),
			)
			.search_opt(filter.search)
	}
}

impl EntityModel for Project {
	type Record = ProjectRecord;
	type Create = NewProject;
	type Patch = ProjectPatch;

	const MODEL: &'static str = "Projects";
	const FIELDS: &'static [&'static str] = &[
		"id",
		"status",
		"title",
		"description",
		"quoteId",
		"requestId",
		"addressId",
		"homeownerContactId",
		"agentContactId",
		"assignedTo",
		"budget",
		"actualCost",
		"startDate",
		"estimatedCompletionDate",
		"actualCompletionDate",
		"cancellationReason",
		"archived",
		"milestones",
		"createdAt",
		"updatedAt",
	];
	const SEARCHABLE_FIELDS: &'static [&'static str] = &["title", "description"];

	fn id(&self) -> &str {
		&self.id
	}

	fn from_record(record: ProjectRecord) -> Result<Self, MappingError> {
		Self::try_from(record)
	}

	fn prepare_create(input: &NewProject, now: DateTime<Utc>) -> Result<Map<String, Value>, MappingError> {
		let mut fields = wire::to_object(input)?;
		strip_nulls(&mut fields);
		fields
			.entry("status")
			.or_insert_with(|| Value::from(ProjectStatus::default().as_str()));
		fields.insert("archived".to_string(), Value::Bool(false));
		stamp_created(&mut fields, now);
		Ok(fields)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use serde_json::json;

	#[test]
	fn test_prepare_create_defaults_to_planning() {
		let now = Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap();
		let input = NewProject {
			title: Some("Basement finish".to_string()),
			budget: Some(42000.0),
			..Default::default()
		};
		let fields = Project::prepare_create(&input, now).unwrap();
		assert_eq!(fields["status"], json!("planning"));
		assert_eq!(fields["milestones"], json!("[]"));
		assert_eq!(fields["archived"], json!(false));
	}

	#[test]
	fn test_patch_deserialises_from_workflow_fields() {
		let patch: ProjectPatch = serde_json::from_value(json!({
			"status": "archived",
			"archived": true
		}))
		.unwrap();
		assert_eq!(patch.status, Some(ProjectStatus::Archived));
		assert_eq!(patch.archived, Some(true));
		assert!(patch.start_date.is_none());
	}
}
