//! Wire record for properties

use serde::{Deserialize, Serialize};

use super::{Property, PropertyStatus};
use crate::wire::{optional_timestamp, required_timestamp, MappingError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyRecord {
	pub id: Option<String>,
	pub status: Option<String>,
	pub street_address: Option<String>,
	pub city: Option<String>,
	pub state: Option<String>,
	pub zip: Option<String>,
	pub property_full_address: Option<String>,
	pub property_type: Option<String>,
	pub year_built: Option<f64>,
	pub size_sqft: Option<f64>,
	pub bedrooms: Option<f64>,
	pub bathrooms: Option<f64>,
	pub owner_contact_id: Option<String>,
	pub created_at: Option<String>,
	pub updated_at: Option<String>,
}

impl TryFrom<PropertyRecord> for Property {
	type Error = MappingError;

	fn try_from(record: PropertyRecord) -> Result<Self, Self::Error> {
		let id = record.id.ok_or_else(|| MappingError::missing("id"))?;
		let status = match record.status.as_deref() {
			Some(raw) => raw.parse()?,
			None => PropertyStatus::default(),
		};
		let created_at = required_timestamp("createdAt", record.created_at.as_deref())?;
		let updated_at = optional_timestamp("updatedAt", record.updated_at.as_deref())
			.unwrap_or(created_at);

		Ok(Property {
			id,
			status,
			street_address: record.street_address,
			city: record.city,
			state: record.state,
			zip: record.zip,
			property_full_address: record.property_full_address,
			property_type: record.property_type,
			// Numeric columns may arrive as floats from imported sheets
			year_built: record.year_built.map(|year| year.round() as i32),
			size_sqft: record.size_sqft,
			bedrooms: record.bedrooms.map(|count| count.max(0.0).round() as u32),
			bathrooms: record.bathrooms,
			owner_contact_id: record.owner_contact_id,
			created_at,
			updated_at,
		})
	}
}
