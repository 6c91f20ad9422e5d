//! Wire record for projects

use serde::{Deserialize, Serialize};

use super::{Project, ProjectStatus};
use crate::wire::{decode_collection, optional_timestamp, required_timestamp, MappingError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectRecord {
	pub id: Option<String>,
	pub status: Option<String>,
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
	pub start_date: Option<String>,
	pub estimated_completion_date: Option<String>,
	pub actual_completion_date: Option<String>,
	pub cancellation_reason: Option<String>,
	pub archived: Option<bool>,
	pub milestones: Option<String>,
	pub created_at: Option<String>,
	pub updated_at: Option<String>,
}

impl TryFrom<ProjectRecord> for Project {
	type Error = MappingError;

	fn try_from(record: ProjectRecord) -> Result<Self, Self::Error> {
		let id = record.id.ok_or_else(|| MappingError::missing("id"))?;
		let status = match record.status.as_deref() {
			Some(raw) => raw.parse()?,
			None => ProjectStatus::default(),
		};
		let created_at = required_timestamp("createdAt", record.created_at.as_deref())?;
		let updated_at = optional_timestamp("updatedAt", record.updated_at.as_deref())
			.unwrap_or(created_at);

		Ok(Project {
			id,
			status,
			title: record.title,
			description: record.description,
			quote_id: record.quote_id,
			request_id: record.request_id,
			address_id: record.address_id,
			homeowner_contact_id: record.homeowner_contact_id,
			agent_contact_id: record.agent_contact_id,
			assigned_to: record.assigned_to,
			budget: record.budget,
			actual_cost: record.actual_cost,
			start_date: optional_timestamp("startDate", record.start_date.as_deref()),
			estimated_completion_date: optional_timestamp(
				"estimatedCompletionDate",
				record.estimated_completion_date.as_deref(),
			),
			actual_completion_date: optional_timestamp(
				"actualCompletionDate",
				record.actual_completion_date.as_deref(),
			),
			cancellation_reason: record.cancellation_reason,
			archived: record.archived.unwrap_or(false),
			milestones: decode_collection("milestones", record.milestones.as_deref())?,
			created_at,
			updated_at,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_record_maps_schedule_and_milestones() {
		let record: ProjectRecord = serde_json::from_value(json!({
			"id": "p-1",
			"status": "on_hold",
			"budget": 80000.0,
			"actualCost": 91000.0,
			"startDate": "2025-01-06",
			"estimatedCompletionDate": "04/30/2025",
			"milestones": "[{\"name\":\"Demo\",\"completed\":true},{\"name\":\"Framing\"}]",
			"createdAt": "2024-12-15T10:00:00Z"
		}))
		.unwrap();

		let project = Project::try_from(record).unwrap();
		assert_eq!(project.status, ProjectStatus::OnHold);
		assert!(project.status.is_active());
		assert!(project.start_date.unwrap() < project.estimated_completion_date.unwrap());
		assert_eq!(project.milestones.len(), 2);
		assert!(project.milestones[0].completed);
		assert!(!project.milestones[1].completed);
	}
}
