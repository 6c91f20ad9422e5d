//! Homeowners, agents and other people the business deals with

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub mod storage;

pub use storage::ContactRecord;

use crate::entity::{stamp_created, strip_nulls, EntityModel};
use crate::filter::FilterSpec;
use crate::wire::{self, MappingError};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
	#[default]
	Active,
	Inactive,
}

impl ContactStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			ContactStatus::Active => "active",
			ContactStatus::Inactive => "inactive",
		}
	}
}

impl FromStr for ContactStatus {
	type Err = MappingError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"active" => Ok(ContactStatus::Active),
			"inactive" => Ok(ContactStatus::Inactive),
			other => Err(MappingError::InvalidValue {
				field: "status".to_string(),
				value: other.to_string(),
			}),
		}
	}
}

impl fmt::Display for ContactStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
	pub id: String,
	pub status: ContactStatus,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub full_name: Option<String>,
	pub email: Option<String>,
	pub phone: Option<String>,
	pub company: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
	pub status: Option<ContactStatus>,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	/// Composed from first and last name when omitted
	pub full_name: Option<String>,
	pub email: Option<String>,
	pub phone: Option<String>,
	pub company: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactPatch {
	pub status: Option<ContactStatus>,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub full_name: Option<String>,
	pub email: Option<String>,
	pub phone: Option<String>,
	pub company: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactFilter {
	pub status: Option<ContactStatus>,
	pub email: Option<String>,
	pub company: Option<String>,
	pub search: Option<String>,
}

impl From<ContactFilter> for FilterSpec {
	fn from(filter: ContactFilter) -> Self {
		FilterSpec::new()
			.eq_opt("status", filter.status.map(|s| s.as_str()))
			.eq_opt("email", filter.email.as_deref().map(normalize_email))
			.eq_opt("company", filter.company)
			.search_opt(filter.search)
	}
}

fn normalize_email(email: &str) -> String {
	email.trim().to_lowercase()
}

/// `first last`, skipping blank parts
pub fn compose_full_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
	let parts: Vec<&str> = [first, last]
		.into_iter()
		.flatten()
		.map(str::trim)
		.filter(|part| !part.is_empty())
		.collect();
	if parts.is_empty() {
		None
	} else {
		Some(parts.join(" "))
	}
}

impl EntityModel for Contact {
	type Record = ContactRecord;
	type Create = NewContact;
	type Patch = ContactPatch;

	const MODEL: &'static str = "Contacts";
	const FIELDS: &'static [&'static str] = &[
		"id",
		"status",
		"firstName",
		"lastName",
		"fullName",
		"email",
		"phone",
		"company",
		"createdAt",
		"updatedAt",
	];
	const SEARCHABLE_FIELDS: &'static [&'static str] =
		&["fullName", "firstName", "lastName", "email", "phone", "company"];

	fn id(&self) -> &str {
		&self.id
	}

	fn from_record(record: ContactRecord) -> Result<Self, MappingError> {
		Self::try_from(record)
	}

	fn prepare_create(input: &NewContact, now: DateTime<Utc>) -> Result<Map<String, Value>, MappingError> {
		let mut fields = wire::to_object(input)?;
		strip_nulls(&mut fields);
		fields
			.entry("status")
			.or_insert_with(|| Value::from(ContactStatus::default().as_str()));
		if input.full_name.is_none() {
			if let Some(full_name) =
				compose_full_name(input.first_name.as_deref(), input.last_name.as_deref())
			{
				fields.insert("fullName".to_string(), Value::String(full_name));
			}
		}
		if let Some(email) = input.email.as_deref() {
			fields.insert("email".to_string(), Value::String(normalize_email(email)));
		}
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
	fn test_create_composes_name_and_normalises_email() {
		let input = NewContact {
			first_name: Some("Dana ".to_string()),
			last_name: Some("Reyes".to_string()),
			email: Some(" Dana.Reyes@Example.COM".to_string()),
			..Default::default()
		};
		let now = Utc.with_ymd_and_hms(2025, 3, 3, 10, 0, 0).unwrap();
		let fields = Contact::prepare_create(&input, now).unwrap();

		assert_eq!(fields["fullName"], json!("Dana Reyes"));
		assert_eq!(fields["email"], json!("dana.reyes@example.com"));
		assert_eq!(fields["status"], json!("active"));
	}

	#[test]
	fn test_compose_full_name_skips_blank_parts() {
		assert_eq!(compose_full_name(None, Some("Ng")), Some("Ng".to_string()));
		assert_eq!(compose_full_name(Some(" "), None), None);
	}
}
