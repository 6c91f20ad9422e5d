//! Wire record for quotes

use serde::{Deserialize, Serialize};

use super::{Quote, QuoteStatus};
use crate::wire::{decode_collection, optional_timestamp, required_timestamp, MappingError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteRecord {
	pub id: Option<String>,
	pub status: Option<String>,
	pub quote_number: Option<String>,
	pub title: Option<String>,
	pub request_id: Option<String>,
	pub project_id: Option<String>,
	pub address_id: Option<String>,
	pub homeowner_contact_id: Option<String>,
	pub agent_contact_id: Option<String>,
	pub assigned_to: Option<String>,
	/// JSON-encoded list of line items
	pub line_items: Option<String>,
	pub total_amount: Option<f64>,
	pub valid_until: Option<String>,
	pub sent_date: Option<String>,
	pub opened_date: Option<String>,
	pub signed_date: Option<String>,
	pub rejected_date: Option<String>,
	pub expired_date: Option<String>,
	pub created_at: Option<String>,
	pub updated_at: Option<String>,
}

impl TryFrom<QuoteRecord> for Quote {
	type Error = MappingError;

	fn try_from(record: QuoteRecord) -> Result<Self, Self::Error> {
		let id = record.id.ok_or_else(|| MappingError::missing("id"))?;
		let status = match record.status.as_deref() {
			Some(raw) => raw.parse()?,
			None => QuoteStatus::default(),
		};
		let created_at = required_timestamp("createdAt", record.created_at.as_deref())?;
		let updated_at = optional_timestamp("updatedAt", record.updated_at.as_deref())
			.unwrap_or(created_at);

		Ok(Quote {
			id,
			status,
			quote_number: record.quote_number,
			title: record.title,
			request_id: record.request_id,
			project_id: record.project_id,
			address_id: record.address_id,
			homeowner_contact_id: record.homeowner_contact_id,
			agent_contact_id: record.agent_contact_id,
			assigned_to: record.assigned_to,
			line_items: decode_collection("lineItems", record.line_items.as_deref())?,
			total_amount: record.total_amount,
			valid_until: optional_timestamp("validUntil", record.valid_until.as_deref()),
			sent_date: optional_timestamp("sentDate", record.sent_date.as_deref()),
			opened_date: optional_timestamp("openedDate", record.opened_date.as_deref()),
			signed_date: optional_timestamp("signedDate", record.signed_date.as_deref()),
			rejected_date: optional_timestamp("rejectedDate", record.rejected_date.as_deref()),
			expired_date: optional_timestamp("expiredDate", record.expired_date.as_deref()),
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
	fn test_record_decodes_line_items() {
		let record: QuoteRecord = serde_json::from_value(json!({
			"id": "q-1",
			"status": "under_negotiation",
			"lineItems": "[{\"description\":\"Tile\",\"quantity\":40,\"unitPrice\":12.5}]",
			"totalAmount": 500.0,
			"validUntil": "12/31/2025",
			"createdAt": "2025-01-02T08:00:00Z",
			"updatedAt": "2025-01-03T08:00:00Z"
		}))
		.unwrap();

		let quote = Quote::try_from(record).unwrap();
		assert_eq!(quote.status, QuoteStatus::UnderNegotiation);
		assert_eq!(quote.line_items.len(), 1);
		assert_eq!(quote.line_items[0].amount(), 500.0);
		assert!(quote.valid_until.is_some());
		assert!(quote.updated_at > quote.created_at);
	}

	#[test]
	fn test_corrupt_line_items_fail_mapping() {
		let record = QuoteRecord {
			id: Some("q-2".to_string()),
			line_items: Some("not json".to_string()),
			created_at: Some("2025-01-02T08:00:00Z".to_string()),
			..Default::default()
		};
		assert!(matches!(
			Quote::try_from(record),
			Err(MappingError::InvalidCollection { .. })
		));
	}
}
