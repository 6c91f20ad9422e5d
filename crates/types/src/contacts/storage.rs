//! Wire record for contacts

use serde::{Deserialize, Serialize};

use super::{compose_full_name, Contact, ContactStatus};
use crate::wire::{optional_timestamp, required_timestamp, MappingError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactRecord {
	pub id: Option<String>,
	pub status: Option<String>,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub full_name: Option<String>,
	pub email: Option<String>,
	pub phone: Option<String>,
	pub company: Option<String>,
	pub created_at: Option<String>,
	pub updated_at: Option<String>,
}

impl TryFrom<ContactRecord> for Contact {
	type Error = MappingError;

	fn try_from(record: ContactRecord) -> Result<Self, Self::Error> {
		let id = record.id.ok_or_else(|| MappingError::missing("id"))?;
		let status = match record.status.as_deref() {
			Some(raw) => raw.parse()?,
			None => ContactStatus::default(),
		};
		let created_at = required_timestamp("createdAt", record.created_at.as_deref())?;
		let updated_at = optional_timestamp("updatedAt", record.updated_at.as_deref())
			.unwrap_or(created_at);
		// Imported rows may lack the composed name
		let full_name = record.full_name.or_else(|| {
			compose_full_name(record.first_name.as_deref(), record.last_name.as_deref())
		});

		Ok(Contact {
			id,
			status,
			first_name: record.first_name,
			last_name: record.last_name,
			full_name,
			email: record.email,
			phone: record.phone,
			company: record.company,
			created_at,
			updated_at,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_missing_full_name_is_composed_on_read() {
		let record = ContactRecord {
			id: Some("c-1".to_string()),
			first_name: Some("Sam".to_string()),
			last_name: Some("Okafor".to_string()),
			created_at: Some("1/15/2023".to_string()),
			..Default::default()
		};
		let contact = Contact::try_from(record).unwrap();
		assert_eq!(contact.full_name.as_deref(), Some("Sam Okafor"));
		assert_eq!(contact.status, ContactStatus::Active);
	}
}
