//! Wire record for requests and its domain conversion

use serde::{Deserialize, Serialize};

use super::{Request, RequestStatus};
use crate::wire::{decode_collection, optional_timestamp, required_timestamp, MappingError};

/// Request as stored by the remote service
///
/// Timestamps are raw strings (legacy rows use US date formats) and
/// `uploadedMedia` is a JSON-encoded list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestRecord {
	pub id: Option<String>,
	pub status: Option<String>,
	pub message: Option<String>,
	pub product: Option<String>,
	pub lead_source: Option<String>,
	pub budget: Option<String>,
	pub address_id: Option<String>,
	pub homeowner_contact_id: Option<String>,
	pub agent_contact_id: Option<String>,
	pub assigned_to: Option<String>,
	pub uploaded_media: Option<String>,
	pub requested_visit_date_time: Option<String>,
	pub assigned_date: Option<String>,
	pub move_to_quoting_date: Option<String>,
	pub expired_date: Option<String>,
	pub archived_date: Option<String>,
	pub archived: Option<bool>,
	pub lead_score: Option<f64>,
	pub created_at: Option<String>,
	pub updated_at: Option<String>,
}

impl TryFrom<RequestRecord> for Request {
	type Error = MappingError;

	fn try_from(record: RequestRecord) -> Result<Self, Self::Error> {
		let id = record.id.ok_or_else(|| MappingError::missing("id"))?;
		let status = match record.status.as_deref() {
			Some(raw) => raw.parse()?,
			None => RequestStatus::default(),
		};
		let created_at = required_timestamp("createdAt", record.created_at.as_deref())?;
		let updated_at = optional_timestamp("updatedAt", record.updated_at.as_deref())
			.unwrap_or(created_at);

		Ok(Request {
			id,
			status,
			message: record.message,
			product: record.product,
			lead_source: record.lead_source,
			budget: record.budget,
			address_id: record.address_id,
			homeowner_contact_id: record.homeowner_contact_id,
			agent_contact_id: record.agent_contact_id,
			assigned_to: record.assigned_to,
			uploaded_media: decode_collection("uploadedMedia", record.uploaded_media.as_deref())?,
			requested_visit_date_time: optional_timestamp(
				"requestedVisitDateTime",
				record.requested_visit_date_time.as_deref(),
			),
			assigned_date: optional_timestamp("assignedDate", record.assigned_date.as_deref()),
			move_to_quoting_date: optional_timestamp(
				"moveToQuotingDate",
				record.move_to_quoting_date.as_deref(),
			),
			expired_date: optional_timestamp("expiredDate", record.expired_date.as_deref()),
			archived_date: optional_timestamp("archivedDate", record.archived_date.as_deref()),
			archived: record.archived.unwrap_or(false),
			lead_score: record
				.lead_score
				.map(|score| score.round().clamp(0.0, 100.0) as u32),
			created_at,
			updated_at,
		})
	}
}
