//! Quotes issued against a request

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub mod storage;

pub use storage::QuoteRecord;

use crate::entity::{stamp_created, strip_nulls, EntityModel};
use crate::filter::FilterSpec;
use crate::wire::{self, encode_collection, encode_optional_collection, MappingError};

/// Lifecycle status of a quote
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
	#[default]
	Draft,
	PendingReview,
	Sent,
	Viewed,
	UnderNegotiation,
	Approved,
	Rejected,
	Expired,
	Cancelled,
}

impl QuoteStatus {
	pub const ALL: [QuoteStatus; 9] = [
		QuoteStatus::Draft,
		QuoteStatus::PendingReview,
		QuoteStatus::Sent,
		QuoteStatus::Viewed,
		QuoteStatus::UnderNegotiation,
		QuoteStatus::Approved,
		QuoteStatus::Rejected,
		QuoteStatus::Expired,
		QuoteStatus::Cancelled,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			QuoteStatus::Draft => "draft",
			QuoteStatus::PendingReview => "pending_review",
			QuoteStatus::Sent => "sent",
			QuoteStatus::Viewed => "viewed",
			QuoteStatus::UnderNegotiation => "under_negotiation",
			QuoteStatus::Approved => "approved",
			QuoteStatus::Rejected => "rejected",
			QuoteStatus::Expired => "expired",
			QuoteStatus::Cancelled => "cancelled",
		}
	}
}

impl FromStr for QuoteStatus {
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

impl fmt::Display for QuoteStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// One priced line of a quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLineItem {
	pub description: String,
	pub quantity: f64,
	pub unit_price: f64,
}

impl QuoteLineItem {
	pub fn new(description: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
		Self {
			description: description.into(),
			quantity,
			unit_price,
		}
	}

	pub fn amount(&self) -> f64 {
		self.quantity * self.unit_price
	}
}

/// Sum of line amounts rounded to cents
pub fn line_items_total(items: &[QuoteLineItem]) -> f64 {
	let total: f64 = items.iter().map(QuoteLineItem::amount).sum();
	(total * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
	pub id: String,
	pub status: QuoteStatus,
	pub quote_number: Option<String>,
	pub title: Option<String>,
	pub request_id: Option<String>,
	pub project_id: Option<String>,
	pub address_id: Option<String>,
	pub homeowner_contact_id: Option<String>,
	pub agent_contact_id: Option<String>,
	pub assigned_to: Option<String>,
	pub line_items: Vec<QuoteLineItem>,
	pub total_amount: Option<f64>,
	pub valid_until: Option<DateTime<Utc>>,
	pub sent_date: Option<DateTime<Utc>>,
	pub opened_date: Option<DateTime<Utc>>,
	pub signed_date: Option<DateTime<Utc>>,
	pub rejected_date: Option<DateTime<Utc>>,
	pub expired_date: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Input for creating a quote
///
/// When `total_amount` is omitted it is computed from the line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuote {
	pub status: Option<QuoteStatus>,
	pub quote_number: Option<String>,
	pub title: Option<String>,
	pub request_id: Option<String>,
	pub project_id: Option<String>,
	pub address_id: Option<String>,
	pub homeowner_contact_id: Option<String>,
	pub agent_contact_id: Option<String>,
	pub assigned_to: Option<String>,
	#[serde(serialize_with = "encode_collection")]
	pub line_items: Vec<QuoteLineItem>,
	pub total_amount: Option<f64>,
	pub valid_until: Option<DateTime<Utc>>,
}

impl NewQuote {
	/// Stated total, falling back to the line items
	pub fn effective_total(&self) -> Option<f64> {
		self.total_amount.or_else(|| {
			if self.line_items.is_empty() {
				None
			} else {
				Some(line_items_total(&self.line_items))
			}
		})
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuotePatch {
	pub status: Option<QuoteStatus>,
	pub quote_number: Option<String>,
	pub title: Option<String>,
	pub project_id: Option<String>,
	pub assigned_to: Option<String>,
	#[serde(serialize_with = "encode_optional_collection", skip_deserializing)]
	pub line_items: Option<Vec<QuoteLineItem>>,
	pub total_amount: Option<f64>,
	pub valid_until: Option<DateTime<Utc>>,
	pub sent_date: Option<DateTime<Utc>>,
	pub opened_date: Option<DateTime<Utc>>,
	pub signed_date: Option<DateTime<Utc>>,
	pub rejected_date: Option<DateTime<Utc>>,
	pub expired_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteFilter {
	pub status: Option<QuoteStatus>,
	pub request_id: Option<String>,
	pub homeowner_contact_id: Option<String>,
	pub assigned_to: Option<String>,
	pub amount_range: Option<(f64, f64)>,
	pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
	pub search: Option<String>,
}

impl From<QuoteFilter> for FilterSpec {
	fn from(filter: QuoteFilter) -> Self {
		FilterSpec::new()
			.eq_opt("status", filter.status.map(|s| s.as_str()))
			.eq_opt("requestId", filter.request_id)
			.eq_opt("homeownerContactId", filter.homeowner_contact_id)
			.eq_opt("assignedTo", filter.assigned_to)
			.between_opt("totalAmount", filter.amount_range)
			.between_opt(
				"createdAt",
				filter
					.date_range
					.map(|(from, to)| (from.to_rfc3339(), to.to_rfc3339())),
			)
			.search_opt(filter.search)
	}
}

impl EntityModel for Quote {
	type Record = QuoteRecord;
	type Create = NewQuote;
	type Patch = QuotePatch;

	const MODEL: &'static str = "Quotes";
	const FIELDS: &'static [&'static str] = &[
		"id",
		"status",
		"quoteNumber",
		"title",
		"requestId",
		"projectId",
		"addressId",
		"homeownerContactId",
		"agentContactId",
		"assignedTo",
		"lineItems",
		"totalAmount",
		"validUntil",
		"sentDate",
		"openedDate",
		"signedDate",
		"rejectedDate",
		"expiredDate",
		"createdAt",
		"updatedAt",
	];
	const SEARCHABLE_FIELDS: &'static [&'static str] = &["title", "quoteNumber"];

	fn id(&self) -> &str {
		&self.id
	}

	fn from_record(record: QuoteRecord) -> Result<Self, MappingError> {
		Self::try_from(record)
	}

	fn prepare_create(input: &NewQuote, now: DateTime<Utc>) -> Result<Map<String, Value>, MappingError> {
		let mut fields = wire::to_object(input)?;
		strip_nulls(&mut fields);
		fields
			.entry("status")
			.or_insert_with(|| Value::from(QuoteStatus::default().as_str()));
		if let Some(total) = input.effective_total() {
			fields.insert("totalAmount".to_string(), Value::from(total));
		}
		stamp_created(&mut fields, now);
		Ok(fields)
	}
}
