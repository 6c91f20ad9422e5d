//! Inbound renovation requests (leads)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub mod storage;

pub use storage::RequestRecord;

use crate::entity::{stamp_created, strip_nulls, EntityModel};
use crate::filter::FilterSpec;
use crate::wire::{self, encode_collection, encode_optional_collection, MappingError};

/// Lifecycle status of a request
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
	#[default]
	New,
	Assigned,
	InProgress,
	NeedsInformation,
	Quoted,
	Expired,
	Cancelled,
	Archived,
}

impl RequestStatus {
	pub const ALL: [RequestStatus; 8] = [
		RequestStatus::New,
		RequestStatus::Assigned,
		RequestStatus::InProgress,
		RequestStatus::NeedsInformation,
		RequestStatus::Quoted,
		RequestStatus::Expired,
		RequestStatus::Cancelled,
		RequestStatus::Archived,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			RequestStatus::New => "new",
			RequestStatus::Assigned => "assigned",
			RequestStatus::InProgress => "in_progress",
			RequestStatus::NeedsInformation => "needs_information",
			RequestStatus::Quoted => "quoted",
			RequestStatus::Expired => "expired",
			RequestStatus::Cancelled => "cancelled",
			RequestStatus::Archived => "archived",
		}
	}
}

impl FromStr for RequestStatus {
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

impl fmt::Display for RequestStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Photo or document attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
	pub url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content_type: Option<String>,
}

impl MediaItem {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			name: None,
			content_type: None,
		}
	}
}

/// A renovation request as seen by the back office
///
/// Related contacts, the property address and the assignee are referenced by
/// id only; callers resolve them through their own repositories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
	pub id: String,
	pub status: RequestStatus,
	pub message: Option<String>,
	pub product: Option<String>,
	pub lead_source: Option<String>,
	/// Free-form budget as entered by the homeowner, e.g. `$50k - $75k`
	pub budget: Option<String>,
	pub address_id: Option<String>,
	pub homeowner_contact_id: Option<String>,
	pub agent_contact_id: Option<String>,
	pub assigned_to: Option<String>,
	pub uploaded_media: Vec<MediaItem>,
	pub requested_visit_date_time: Option<DateTime<Utc>>,
	pub assigned_date: Option<DateTime<Utc>>,
	pub move_to_quoting_date: Option<DateTime<Utc>>,
	pub expired_date: Option<DateTime<Utc>>,
	pub archived_date: Option<DateTime<Utc>>,
	pub archived: bool,
	/// Last computed lead score, a convenience copy only
	pub lead_score: Option<u32>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Request {
	pub fn has_contact(&self) -> bool {
		self.homeowner_contact_id.is_some() || self.agent_contact_id.is_some()
	}
}

/// Input for creating a request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
	pub status: Option<RequestStatus>,
	pub message: Option<String>,
	pub product: Option<String>,
	pub lead_source: Option<String>,
	pub budget: Option<String>,
	pub address_id: Option<String>,
	pub homeowner_contact_id: Option<String>,
	pub agent_contact_id: Option<String>,
	pub assigned_to: Option<String>,
	#[serde(serialize_with = "encode_collection")]
	pub uploaded_media: Vec<MediaItem>,
	pub requested_visit_date_time: Option<DateTime<Utc>>,
}

/// Partial update of a request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestPatch {
	pub status: Option<RequestStatus>,
	pub message: Option<String>,
	pub product: Option<String>,
	pub lead_source: Option<String>,
	pub budget: Option<String>,
	pub address_id: Option<String>,
	pub homeowner_contact_id: Option<String>,
	pub agent_contact_id: Option<String>,
	pub assigned_to: Option<String>,
	#[serde(serialize_with = "encode_optional_collection", skip_deserializing)]
	pub uploaded_media: Option<Vec<MediaItem>>,
	pub requested_visit_date_time: Option<DateTime<Utc>>,
	pub assigned_date: Option<DateTime<Utc>>,
	pub move_to_quoting_date: Option<DateTime<Utc>>,
	pub expired_date: Option<DateTime<Utc>>,
	pub archived_date: Option<DateTime<Utc>>,
	pub archived: Option<bool>,
	pub lead_score: Option<u32>,
}

/// Typed list filter for requests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFilter {
	pub status: Option<RequestStatus>,
	pub assigned_to: Option<String>,
	pub homeowner_contact_id: Option<String>,
	pub agent_contact_id: Option<String>,
	pub lead_source: Option<String>,
	pub archived: Option<bool>,
	/// Creation date window, inclusive
	pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
	pub search: Option<String>,
}

impl From<RequestFilter> for FilterSpec {
	fn from(filter: RequestFilter) -> Self {
		FilterSpec::new()
			.eq_opt("status", filter.status.map(|s| s.as_str()))
			.eq_opt("assignedTo", filter.assigned_to)
			.eq_opt("homeownerContactId", filter.homeowner_contact_id)
			.eq_opt("agentContactId", filter.agent_contact_id)
			.eq_opt("leadSource", filter.lead_source)
			.eq_opt("archived", filter.archived)
			.between_opt(
				"createdAt",
				filter
					.date_range
					.map(|(from, to)| (from.to_rfc3339(), to.to_rfc3339())),
			)
			.search_opt(filter.search)
	}
}

impl EntityModel for Request {
	type Record = RequestRecord;
	type Create = NewRequest;
	type Patch = RequestPatch;

	const MODEL: &'static str = "Requests";
	const FIELDS: &'static [&'static str] = &[
		"id",
		"status",
		"message",
		"product",
		"leadSource",
		"budget",
		"addressId",
		"homeownerContactId",
		"agentContactId",
		"assignedTo",
		"uploadedMedia",
		"requestedVisitDateTime",
		"assignedDate",
		"moveToQuotingDate",
		"expiredDate",
		"archivedDate",
		"archived",
		"leadScore",
		"createdAt",
		"updatedAt",
	];
	const SEARCHABLE_FIELDS: &'static [&'static str] = &["message", "product", "leadSource"];

	fn id(&self) -> &str {
		&self.id
	}

	fn from_record(record: RequestRecord) -> Result<Self, MappingError> {
		Self::try_from(record)
	}

	fn prepare_create(input: &NewRequest, now: DateTime<Utc>) -> Result<Map<String, Value>, MappingError> {
		let mut fields = wire::to_object(input)?;
		strip_nulls(&mut fields);
		fields
			.entry("status")
			.or_insert_with(|| Value::from(RequestStatus::default().as_str()));
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

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 6, 2, 15, 0, 0).unwrap()
	}

	#[test]
	fn test_status_parses_wire_values() {
		assert_eq!(
			"needs_information".parse::<RequestStatus>().unwrap(),
			RequestStatus::NeedsInformation
		);
		assert!("pending".parse::<RequestStatus>().is_err());
		assert_eq!(RequestStatus::InProgress.to_string(), "in_progress");
	}

	#[test]
	fn test_prepare_create_applies_defaults() {
		let input = NewRequest {
			message: Some("Kitchen remodel".to_string()),
			homeowner_contact_id: Some("c-1".to_string()),
			uploaded_media: vec![MediaItem::new("https://cdn/photo.jpg")],
			..Default::default()
		};
		let fields = Request::prepare_create(&input, now()).unwrap();

		assert_eq!(fields["status"], json!("new"));
		assert_eq!(fields["archived"], json!(false));
		assert_eq!(fields["uploadedMedia"], json!(r#"[{"url":"https://cdn/photo.jpg"}]"#));
		assert_eq!(fields["createdAt"], fields["updatedAt"]);
		assert!(!fields.contains_key("agentContactId"));
	}

	#[test]
	fn test_prepare_update_sends_only_set_fields() {
		let patch = RequestPatch {
			status: Some(RequestStatus::Assigned),
			assigned_to: Some("rep-7".to_string()),
			..Default::default()
		};
		let fields = Request::prepare_update("r-1", &patch, now()).unwrap();

		let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
		keys.sort();
		assert_eq!(keys, vec!["assignedTo", "id", "status", "updatedAt"]);
		assert_eq!(fields["status"], json!("assigned"));
	}

	#[test]
	fn test_filter_translation() {
		let filter = RequestFilter {
			status: Some(RequestStatus::New),
			search: Some("deck".to_string()),
			..Default::default()
		};
		let wire = FilterSpec::from(filter)
			.to_wire(Request::SEARCHABLE_FIELDS)
			.unwrap();
		assert_eq!(wire["status"], json!({"eq": "new"}));
		assert_eq!(wire["or"].as_array().unwrap().len(), 3);
	}
}
