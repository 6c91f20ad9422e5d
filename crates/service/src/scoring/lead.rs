//! Lead quality of an inbound request

use chrono::{DateTime, Duration, Utc};
use rb_types::{Request, RequestStatus};
use serde::Serialize;

const COMPLETENESS_WEIGHT: f64 = 0.25;
const SOURCE_WEIGHT: f64 = 0.25;
const ENGAGEMENT_WEIGHT: f64 = 0.30;
const BUDGET_WEIGHT: f64 = 0.20;

/// Budget band the business targets, in dollars
const TARGET_BUDGET_MIN: f64 = 25_000.0;
const TARGET_BUDGET_MAX: f64 = 150_000.0;

const UNKNOWN_SOURCE_QUALITY: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LeadGrade {
	A,
	B,
	C,
	D,
	F,
}

impl LeadGrade {
	pub fn from_score(score: f64) -> Self {
		match score {
			s if s >= 80.0 => LeadGrade::A,
			s if s >= 65.0 => LeadGrade::B,
			s if s >= 50.0 => LeadGrade::C,
			s if s >= 35.0 => LeadGrade::D,
			_ => LeadGrade::F,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadPriority {
	Low,
	Medium,
	High,
	Urgent,
}

impl LeadPriority {
	pub fn from_score(score: f64) -> Self {
		match score {
			s if s >= 85.0 => LeadPriority::Urgent,
			s if s >= 70.0 => LeadPriority::High,
			s if s >= 50.0 => LeadPriority::Medium,
			_ => LeadPriority::Low,
		}
	}
}

/// Sub-factors, each 0-100
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFactors {
	pub data_completeness: f64,
	pub source_quality: f64,
	pub engagement_level: f64,
	pub budget_alignment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadScore {
	/// Weighted factors, clamped to 0-100
	pub overall_score: f64,
	pub grade: LeadGrade,
	pub priority: LeadPriority,
	pub factors: LeadFactors,
	/// Chance the lead becomes a signed quote, 0.0 - 1.0
	pub conversion_probability: f64,
	pub recommendations: Vec<String>,
}

/// Relational fields a complete request carries
fn relational_fields(request: &Request) -> [(&'static str, bool); 4] {
	fn set(value: &Option<String>) -> bool {
		value.as_deref().is_some_and(|v| !v.trim().is_empty())
	}

	[
		("property address", set(&request.address_id)),
		("homeowner contact", set(&request.homeowner_contact_id)),
		("agent contact", set(&request.agent_contact_id)),
		("product", set(&request.product)),
	]
}

pub fn data_completeness(request: &Request) -> f64 {
	let fields = relational_fields(request);
	let present = fields.iter().filter(|(_, present)| *present).count();
	present as f64 / fields.len() as f64 * 100.0
}

/// Fixed quality per lead source; unknown sources score lowest
pub fn source_quality(lead_source: Option<&str>) -> f64 {
	let Some(source) = lead_source else {
		return UNKNOWN_SOURCE_QUALITY;
	};
	let normalized = source
		.trim()
		.to_lowercase()
		.replace(['_', '-'], " ");

	match normalized.as_str() {
		"referral" => 90.0,
		"repeat customer" => 85.0,
		"agent" | "agent referral" => 80.0,
		"website" | "web" => 70.0,
		"social" | "social media" => 55.0,
		"advertisement" | "ad" | "ads" => 50.0,
		"walk in" => 45.0,
		_ => UNKNOWN_SOURCE_QUALITY,
	}
}

/// Message richness, media and how soon a visit is wanted
pub fn engagement_level(request: &Request, now: DateTime<Utc>) -> f64 {
	let message_len = request
		.message
		.as_deref()
		.map(|m| m.trim().chars().count())
		.unwrap_or(0);
	let message = match message_len {
		0 => 0.0,
		1..=49 => 10.0,
		50..=149 => 25.0,
		_ => 40.0,
	};

	let media = match request.uploaded_media.len() {
		0 => 0.0,
		1 | 2 => 20.0,
		_ => 30.0,
	};

	let visit = match request.requested_visit_date_time {
		Some(visit) if visit < now => 0.0,
		Some(visit) if visit - now <= Duration::days(7) => 30.0,
		Some(visit) if visit - now <= Duration::days(30) => 20.0,
		Some(_) => 10.0,
		None => 0.0,
	};

	f64::min(message + media + visit, 100.0)
}

/// Parse a free-form budget such as `$45,000`, `60k` or `30000-50000`
///
/// A range scores by its midpoint.
pub fn parse_budget(budget: &str) -> Option<f64> {
	fn amount(part: &str) -> Option<f64> {
		let cleaned: String = part
			.trim()
			.to_lowercase()
			.chars()
			.filter(|c| !matches!(c, '$' | ',' | ' '))
			.collect();
		let (digits, multiplier) = match cleaned.strip_suffix('k') {
			Some(digits) => (digits, 1_000.0),
			None => match cleaned.strip_suffix('m') {
				Some(digits) => (digits, 1_000_000.0),
				None => (cleaned.as_str(), 1.0),
			},
		};
		digits
			.parse::<f64>()
			.ok()
			.filter(|v| v.is_finite() && *v >= 0.0)
			.map(|v| v * multiplier)
	}

	let parts: Vec<&str> = budget.split(['-', '–']).collect();
	match parts.as_slice() {
		[single] => amount(single),
		[low, high] => Some((amount(low)? + amount(high)?) / 2.0),
		_ => None,
	}
}

/// How far along the funnel a request in `status` has come
fn funnel_stage(status: RequestStatus) -> f64 {
	match status {
		RequestStatus::New | RequestStatus::NeedsInformation => 0.6,
		RequestStatus::Assigned => 0.7,
		RequestStatus::InProgress => 0.8,
		RequestStatus::Quoted => 0.9,
		RequestStatus::Expired => 0.1,
		RequestStatus::Cancelled | RequestStatus::Archived => 0.0,
	}
}

/// Lead quality scaled by funnel stage, rounded to 2 places
pub fn lead_conversion_probability(overall_score: f64, status: RequestStatus) -> f64 {
	let probability = overall_score / 100.0 * funnel_stage(status);
	super::round_to(probability.clamp(0.0, 1.0), 2)
}

pub fn budget_alignment(budget: Option<&str>) -> f64 {
	match budget.and_then(parse_budget) {
		None => 0.0,
		Some(amount) if amount <= 0.0 => 0.0,
		Some(amount) if amount < TARGET_BUDGET_MIN => amount / TARGET_BUDGET_MIN * 100.0,
		Some(amount) if amount <= TARGET_BUDGET_MAX => 100.0,
		Some(amount) => TARGET_BUDGET_MAX / amount * 100.0,
	}
}

/// Composite lead score for a request
pub fn lead_score(request: &Request, now: DateTime<Utc>) -> LeadScore {
	let factors = LeadFactors {
		data_completeness: data_completeness(request),
		source_quality: source_quality(request.lead_source.as_deref()),
		engagement_level: engagement_level(request, now),
		budget_alignment: budget_alignment(request.budget.as_deref()),
	};

	let weighted = factors.data_completeness * COMPLETENESS_WEIGHT
		+ factors.source_quality * SOURCE_WEIGHT
		+ factors.engagement_level * ENGAGEMENT_WEIGHT
		+ factors.budget_alignment * BUDGET_WEIGHT;
	let overall_score = super::round_to(weighted.clamp(0.0, 100.0), 1);

	let fresh = now - request.created_at < Duration::hours(24);
	let priority = if factors.source_quality >= 80.0 && factors.engagement_level >= 70.0 && fresh {
		LeadPriority::Urgent
	} else {
		LeadPriority::from_score(overall_score)
	};

	LeadScore {
		overall_score,
		grade: LeadGrade::from_score(overall_score),
		priority,
		factors,
		conversion_probability: lead_conversion_probability(overall_score, request.status),
		recommendations: recommendations(request, priority, &factors),
	}
}

fn recommendations(request: &Request, priority: LeadPriority, factors: &LeadFactors) -> Vec<String> {
	let mut out = Vec::new();

	if priority >= LeadPriority::High {
		out.push("Contact the homeowner within 24 hours".to_string());
	}
	if !request.has_contact() {
		out.push("Add a homeowner or agent contact before quoting".to_string());
	}
	let missing: Vec<&str> = relational_fields(request)
		.iter()
		.filter(|(_, present)| !present)
		.map(|(name, _)| *name)
		.collect();
	if !missing.is_empty() {
		out.push(format!("Collect missing details: {}", missing.join(", ")));
	}
	if request.uploaded_media.is_empty() {
		out.push("Ask for photos of the project area".to_string());
	}
	if factors.budget_alignment == 0.0 {
		out.push("Confirm the homeowner's budget".to_string());
	}
	if request.requested_visit_date_time.is_none() {
		out.push("Propose a site visit date".to_string());
	}
	out
}
