//! Input checks run before any write
//!
//! Failures are `VALIDATION_FAILED` with one [`FieldError`] per problem.

use chrono::{DateTime, Utc};
use rb_types::{
	FieldError, NewProject, NewQuote, NewRequest, OperationError, ProjectPatch, ProjectStatus,
	QuoteLineItem, QuotePatch, QuoteStatus, RequestStatus,
};

pub const MISSING_CONTACT_RELATIONSHIP: &str = "MISSING_CONTACT_RELATIONSHIP";
pub const INVALID_AMOUNT: &str = "INVALID_AMOUNT";
pub const VALID_UNTIL_IN_PAST: &str = "VALID_UNTIL_IN_PAST";
pub const MISSING_REQUIRED_FIELD: &str = "MISSING_REQUIRED_FIELD";
pub const INVALID_FIELD: &str = "INVALID_FIELD";

#[derive(Debug, Default)]
struct Checks {
	errors: Vec<FieldError>,
}

impl Checks {
	fn fail(&mut self, field: &str, code: &str, message: impl Into<String>) {
		self.errors.push(FieldError::new(field, code, message));
	}

	fn amount(&mut self, field: &str, amount: Option<f64>) {
		if let Some(amount) = amount {
			if !amount.is_finite() || amount < 0.0 {
				self.fail(field, INVALID_AMOUNT, format!("{} must be a non-negative amount", field));
			}
		}
	}

	fn valid_until(&mut self, valid_until: Option<DateTime<Utc>>, now: DateTime<Utc>) {
		if valid_until.is_some_and(|until| until < now) {
			self.fail("validUntil", VALID_UNTIL_IN_PAST, "validUntil must not be in the past");
		}
	}

	/// New entities enter their workflow at the initial status only
	fn initial_status<S: PartialEq + std::fmt::Display>(&mut self, status: Option<S>, initial: S) {
		if let Some(status) = status.filter(|status| *status != initial) {
			self.fail(
				"status",
				INVALID_FIELD,
				format!(
					"New records start as '{}', not '{}'; use a workflow action to move them",
					initial, status
				),
			);
		}
	}

	fn line_items(&mut self, items: &[QuoteLineItem]) {
		for (index, item) in items.iter().enumerate() {
			if item.description.trim().is_empty() {
				self.fail(
					"lineItems",
					MISSING_REQUIRED_FIELD,
					format!("Line item {} needs a description", index + 1),
				);
			}
			if !(item.quantity.is_finite() && item.quantity > 0.0)
				|| !(item.unit_price.is_finite() && item.unit_price >= 0.0)
			{
				self.fail(
					"lineItems",
					INVALID_AMOUNT,
					format!("Line item {} has an invalid quantity or price", index + 1),
				);
			}
		}
	}

	fn finish(self) -> Result<(), OperationError> {
		if self.errors.is_empty() {
			Ok(())
		} else {
			Err(OperationError::invalid_fields(self.errors))
		}
	}
}

fn blank(value: &Option<String>) -> bool {
	value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// A request must reach someone: a homeowner or an agent
pub fn validate_new_request(input: &NewRequest) -> Result<(), OperationError> {
	let mut checks = Checks::default();
	if blank(&input.homeowner_contact_id) && blank(&input.agent_contact_id) {
		checks.fail(
			"homeownerContactId",
			MISSING_CONTACT_RELATIONSHIP,
			"A request needs a homeowner or agent contact",
		);
	}
	checks.initial_status(input.status, RequestStatus::New);
	if input.uploaded_media.iter().any(|media| media.url.trim().is_empty()) {
		checks.fail("uploadedMedia", INVALID_FIELD, "Uploaded media must have a URL");
	}
	checks.finish()
}

pub fn validate_new_quote(input: &NewQuote, now: DateTime<Utc>) -> Result<(), OperationError> {
	let mut checks = Checks::default();
	if blank(&input.request_id)
		&& blank(&input.homeowner_contact_id)
		&& blank(&input.agent_contact_id)
	{
		checks.fail(
			"requestId",
			MISSING_CONTACT_RELATIONSHIP,
			"A quote needs a request or a homeowner or agent contact",
		);
	}
	checks.initial_status(input.status, QuoteStatus::Draft);
	checks.amount("totalAmount", input.total_amount);
	checks.line_items(&input.line_items);
	checks.valid_until(input.valid_until, now);
	checks.finish()
}

pub fn validate_quote_patch(patch: &QuotePatch, now: DateTime<Utc>) -> Result<(), OperationError> {
	let mut checks = Checks::default();
	checks.amount("totalAmount", patch.total_amount);
	if let Some(items) = &patch.line_items {
		checks.line_items(items);
	}
	checks.valid_until(patch.valid_until, now);
	checks.finish()
}

pub fn validate_new_project(input: &NewProject) -> Result<(), OperationError> {
	let mut checks = Checks::default();
	if blank(&input.title) {
		checks.fail("title", MISSING_REQUIRED_FIELD, "A project needs a title");
	}
	checks.initial_status(input.status, ProjectStatus::Planning);
	checks.amount("budget", input.budget);
	if let (Some(start), Some(end)) = (input.start_date, input.estimated_completion_date) {
		if end < start {
			checks.fail(
				"estimatedCompletionDate",
				INVALID_FIELD,
				"estimatedCompletionDate must not precede startDate",
			);
		}
	}
	checks.finish()
}

pub fn validate_project_patch(patch: &ProjectPatch) -> Result<(), OperationError> {
	let mut checks = Checks::default();
	checks.amount("budget", patch.budget);
	checks.amount("actualCost", patch.actual_cost);
	if patch.title.as_ref().is_some_and(|title| title.trim().is_empty()) {
		checks.fail("title", MISSING_REQUIRED_FIELD, "A project needs a title");
	}
	checks.finish()
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, TimeZone};

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 8, 1, 12, 0, 0).unwrap()
	}

	#[test]
	fn test_request_needs_a_contact() {
		let error = validate_new_request(&NewRequest::default()).unwrap_err();
		assert_eq!(error.code(), "VALIDATION_FAILED");
		assert_eq!(error.field_codes(), vec![MISSING_CONTACT_RELATIONSHIP]);

		let input = NewRequest {
			agent_contact_id: Some("contact-9".to_string()),
			..Default::default()
		};
		assert!(validate_new_request(&input).is_ok());
	}

	#[test]
	fn test_negative_quote_total() {
		let input = NewQuote {
			request_id: Some("req-1".to_string()),
			total_amount: Some(-5000.0),
			..Default::default()
		};
		let error = validate_new_quote(&input, now()).unwrap_err();
		assert_eq!(error.field_codes(), vec![INVALID_AMOUNT]);
	}

	#[test]
	fn test_quote_valid_until_in_past() {
		let input = NewQuote {
			request_id: Some("req-1".to_string()),
			total_amount: Some(18_000.0),
			valid_until: Some(now() - Duration::days(1)),
			..Default::default()
		};
		let error = validate_new_quote(&input, now()).unwrap_err();
		assert_eq!(error.field_codes(), vec![VALID_UNTIL_IN_PAST]);

		let patch = QuotePatch {
			valid_until: Some(now() + Duration::days(30)),
			..Default::default()
		};
		assert!(validate_quote_patch(&patch, now()).is_ok());
	}

	#[test]
	fn test_line_items_are_checked() {
		let input = NewQuote {
			request_id: Some("req-1".to_string()),
			line_items: vec![
				QuoteLineItem::new("Cabinets", 1.0, 12_000.0),
				QuoteLineItem::new("", 0.0, 50.0),
			],
			..Default::default()
		};
		let error = validate_new_quote(&input, now()).unwrap_err();
		assert_eq!(error.field_codes(), vec![MISSING_REQUIRED_FIELD, INVALID_AMOUNT]);
	}

	#[test]
	fn test_project_rules() {
		let error = validate_new_project(&NewProject {
			budget: Some(-1.0),
			..Default::default()
		})
		.unwrap_err();
		assert_eq!(error.field_codes(), vec![MISSING_REQUIRED_FIELD, INVALID_AMOUNT]);

		let patch = ProjectPatch {
			actual_cost: Some(f64::NAN),
			..Default::default()
		};
		assert!(validate_project_patch(&patch).is_err());
	}

	#[test]
	fn test_new_records_start_at_the_initial_status() {
		let quote = NewQuote {
			status: Some(QuoteStatus::Approved),
			request_id: Some("req-1".to_string()),
			..Default::default()
		};
		let error = validate_new_quote(&quote, now()).unwrap_err();
		assert_eq!(error.field_codes(), vec![INVALID_FIELD]);
		assert!(error.field_errors[0].message.contains("'draft'"));

		let draft = NewQuote {
			status: Some(QuoteStatus::Draft),
			..quote
		};
		assert!(validate_new_quote(&draft, now()).is_ok());

		let project = NewProject {
			status: Some(ProjectStatus::Completed),
			title: Some("Porch".to_string()),
			..Default::default()
		};
		assert_eq!(
			validate_new_project(&project).unwrap_err().field_codes(),
			vec![INVALID_FIELD]
		);

		let request = NewRequest {
			status: Some(RequestStatus::Quoted),
			homeowner_contact_id: Some("contact-1".to_string()),
			..Default::default()
		};
		assert!(validate_new_request(&request).is_err());
	}
}
