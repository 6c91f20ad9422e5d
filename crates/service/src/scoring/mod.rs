//! Business scores derived from entity snapshots
//!
//! Everything here is a pure function of the entity and an explicit `now`,
//! so scores are recomputed on every read instead of trusted from storage.

use serde::Serialize;

pub mod lead;
pub mod project;
pub mod quote;

pub use lead::{
	lead_conversion_probability, lead_score, LeadFactors, LeadGrade, LeadPriority, LeadScore,
};
pub use project::{budget_variance, progress_percentage, risk_level, ProjectMetrics, RiskLevel};
pub use quote::{conversion_probability, QuoteMetrics};

/// An entity with metrics computed for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scored<E, M> {
	pub entity: E,
	pub metrics: M,
}

fn round_to(value: f64, places: i32) -> f64 {
	let factor = 10f64.powi(places);
	(value * factor).round() / factor
}
