//! Entity inputs and wire records shared by the integration tests

#![allow(dead_code)]

use renovation_backoffice::chrono::{DateTime, Duration, Utc};
use renovation_backoffice::{NewContact, NewProject, NewProperty, NewQuote, NewRequest};
use serde_json::{json, Map, Value};

pub struct Fixtures;

impl Fixtures {
	/// Referral lead with full details, budget in range and a visit booked
	pub fn strong_request() -> NewRequest {
		NewRequest {
			message: Some(
				"Full kitchen remodel with new cabinets, quartz counters and an island. \
				 Open to moving the sink under the window."
					.to_string(),
			),
			product: Some("Kitchen Remodel".to_string()),
			lead_source: Some("Referral".to_string()),
			budget: Some("$50k - $75k".to_string()),
			address_id: Some("properties-seed-1".to_string()),
			homeowner_contact_id: Some("contacts-seed-1".to_string()),
			agent_contact_id: Some("contacts-seed-2".to_string()),
			requested_visit_date_time: Some(Utc::now() + Duration::days(3)),
			..Default::default()
		}
	}

	pub fn bare_request() -> NewRequest {
		NewRequest {
			homeowner_contact_id: Some("contacts-seed-1".to_string()),
			..Default::default()
		}
	}

	pub fn quote_for(request_id: &str) -> NewQuote {
		NewQuote {
			request_id: Some(request_id.to_string()),
			title: Some("Kitchen remodel".to_string()),
			total_amount: Some(64_500.0),
			valid_until: Some(Utc::now() + Duration::days(30)),
			..Default::default()
		}
	}

	pub fn project(title: &str) -> NewProject {
		NewProject {
			title: Some(title.to_string()),
			budget: Some(64_500.0),
			..Default::default()
		}
	}

	pub fn contact() -> NewContact {
		NewContact {
			first_name: Some("Dana".to_string()),
			last_name: Some("Whitfield".to_string()),
			email: Some("Dana.Whitfield@Example.com ".to_string()),
			phone: Some("503-555-0142".to_string()),
			..Default::default()
		}
	}

	pub fn property() -> NewProperty {
		NewProperty {
			street_address: Some("1420 SE Alder St".to_string()),
			city: Some("Portland".to_string()),
			state: Some("OR".to_string()),
			zip: Some("97214".to_string()),
			bedrooms: Some(3),
			bathrooms: Some(1.5),
			..Default::default()
		}
	}

	/// Wire record of a request in `status`, created at `created_at`
	pub fn request_record(status: &str, created_at: DateTime<Utc>) -> Map<String, Value> {
		let record = json!({
			"status": status,
			"message": "Bathroom refresh",
			"homeownerContactId": "contacts-seed-1",
			"archived": false,
			"createdAt": created_at.to_rfc3339(),
			"updatedAt": created_at.to_rfc3339(),
		});
		record.as_object().cloned().unwrap_or_default()
	}

	/// Request record written by the legacy intake form
	pub fn legacy_request_record() -> Map<String, Value> {
		let record = json!({
			"status": "new",
			"message": "Deck stain",
			"agentContactId": "contacts-seed-2",
			"requestedVisitDateTime": "07/04/24",
			"createdAt": "2024-3-5 9:30:00",
			"updatedAt": "03/05/2024",
		});
		record.as_object().cloned().unwrap_or_default()
	}
}
