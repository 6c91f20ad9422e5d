//! Properties (homes) where work is requested or performed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub mod storage;

pub use storage::PropertyRecord;

use crate::entity::{stamp_created, strip_nulls, EntityModel};
use crate::filter::FilterSpec;
use crate::wire::{self, MappingError};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
	#[default]
	Active,
	Inactive,
}

impl PropertyStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			PropertyStatus::Active => "active",
			PropertyStatus::Inactive => "inactive",
		}
	}
}

impl FromStr for PropertyStatus {
	type Err = MappingError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"active" => Ok(PropertyStatus::Active),
			"inactive" => Ok(PropertyStatus::Inactive),
			other => Err(MappingError::InvalidValue {
				field: "status".to_string(),
				value: other.to_string(),
			}),
		}
	}
}

impl fmt::Display for PropertyStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
	pub id: String,
	pub status: PropertyStatus,
	pub street_address: Option<String>,
	pub city: Option<String>,
	pub state: Option<String>,
	pub zip: Option<String>,
	/// Single-line display address
	pub property_full_address: Option<String>,
	pub property_type: Option<String>,
	pub year_built: Option<i32>,
	pub size_sqft: Option<f64>,
	pub bedrooms: Option<u32>,
	pub bathrooms: Option<f64>,
	pub owner_contact_id: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
	pub status: Option<PropertyStatus>,
	pub street_address: Option<String>,
	pub city: Option<String>,
	pub state: Option<String>,
	pub zip: Option<String>,
	pub property_full_address: Option<String>,
	pub property_type: Option<String>,
	pub year_built: Option<i32>,
	pub size_sqft: Option<f64>,
	pub bedrooms: Option<u32>,
	pub bathrooms: Option<f64>,
	pub owner_contact_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyPatch {
	pub status: Option<PropertyStatus>,
	pub street_address: Option<String>,
	pub city: Option<String>,
	pub state: Option<String>,
	pub zip: Option<String>,
	pub property_full_address: Option<String>,
	pub property_type: Option<String>,
	pub year_built: Option<i32>,
	pub size_sqft: Option<f64>,
	pub bedrooms: Option<u32>,
	pub bathrooms: Option<f64>,
	pub owner_contact_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
	pub status: Option<PropertyStatus>,
	pub city: Option<String>,
	pub state: Option<String>,
	pub zip: Option<String>,
	pub property_type: Option<String>,
	pub owner_contact_id: Option<String>,
	pub year_range: Option<(i32, i32)>,
	pub size_range: Option<(f64, f64)>,
	pub search: Option<String>,
}

impl From<PropertyFilter> for FilterSpec {
	fn from(filter: PropertyFilter) -> Self {
		FilterSpec::new()
			.eq_opt("status", filter.status.map(|s| s.as_str()))
			.eq_opt("city", filter.city)
			.eq_opt("state", filter.state)
			.eq_opt("zip", filter.zip)
			.eq_opt("propertyType", filter.property_type)
			.eq_opt("ownerContactId", filter.owner_contact_id)
			.between_opt("yearBuilt", filter.year_range)
			.between_opt("sizeSqft", filter.size_range)
			.search_opt(filter.search)
	}
}

/// `street, city, state zip`, skipping missing parts
pub fn compose_full_address(
	street: Option<&str>,
	city: Option<&str>,
	state: Option<&str>,
	zip: Option<&str>,
) -> Option<String> {
	fn clean(part: Option<&str>) -> Option<&str> {
		part.map(str::trim).filter(|p| !p.is_empty())
	}

	let region = match (clean(state), clean(zip)) {
		(Some(state), Some(zip)) => Some(format!("{} {}", state, zip)),
		(state, zip) => state.or(zip).map(str::to_string),
	};
	let parts: Vec<String> = [
		clean(street).map(str::to_string),
		clean(city).map(str::to_string),
		region,
	]
	.into_iter()
	.flatten()
	.collect();
	if parts.is_empty() {
		None
	} else {
		Some(parts.join(", "))
	}
}

impl EntityModel for Property {
	type Record = PropertyRecord;
	type Create = NewProperty;
	type Patch = PropertyPatch;

	const MODEL: &'static str = "Properties";
	const FIELDS: &'static [&'static str] = &[
		"id",
		"status",
		"streetAddress",
		"city",
		"state",
		"zip",
		"propertyFullAddress",
		"propertyType",
		"yearBuilt",
		"sizeSqft",
		"bedrooms",
		"bathrooms",
		"ownerContactId",
		"createdAt",
		"updatedAt",
	];
	const SEARCHABLE_FIELDS: &'static [&'static str] =
		&["propertyFullAddress", "streetAddress", "city", "zip"];

	fn id(&self) -> &str {
		&self.id
	}

	fn from_record(record: PropertyRecord) -> Result<Self, MappingError> {
		Self::try_from(record)
	}

	fn prepare_create(
		input: &NewProperty,
		now: DateTime<Utc>,
	) -> Result<Map<String, Value>, MappingError> {
		let mut fields = wire::to_object(input)?;
		strip_nulls(&mut fields);
		fields
			.entry("status")
			.or_insert_with(|| Value::from(PropertyStatus::default().as_str()));
		if input.property_full_address.is_none() {
			if let Some(address) = compose_full_address(
				input.street_address.as_deref(),
				input.city.as_deref(),
				input.state.as_deref(),
				input.zip.as_deref(),
			) {
				fields.insert("propertyFullAddress".to_string(), Value::String(address));
			}
		}
		stamp_created(&mut fields, now);
		Ok(fields)
	}
}
