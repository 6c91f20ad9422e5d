//! Likelihood that a quote converts

use chrono::{DateTime, Duration, Utc};
use rb_types::{Quote, QuoteStatus};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteMetrics {
	/// 0.0 - 1.0, two decimals
	pub conversion_probability: f64,
	pub age_days: i64,
	pub days_until_expiry: Option<i64>,
}

impl QuoteMetrics {
	pub fn for_quote(quote: &Quote, now: DateTime<Utc>) -> Self {
		Self {
			conversion_probability: conversion_probability(quote, now),
			age_days: (now - quote.created_at).num_days(),
			days_until_expiry: quote.valid_until.map(|until| (until - now).num_days()),
		}
	}
}

fn base_probability(status: QuoteStatus) -> f64 {
	match status {
		QuoteStatus::Draft => 0.50,
		QuoteStatus::PendingReview => 0.55,
		QuoteStatus::Sent => 0.55,
		QuoteStatus::Viewed => 0.60,
		QuoteStatus::UnderNegotiation => 0.75,
		QuoteStatus::Approved => 1.0,
		QuoteStatus::Rejected | QuoteStatus::Expired | QuoteStatus::Cancelled => 0.0,
	}
}

fn age_factor(age: Duration) -> f64 {
	if age > Duration::days(30) {
		0.70
	} else if age > Duration::days(14) {
		0.85
	} else if age > Duration::days(7) {
		0.95
	} else {
		1.0
	}
}

fn amount_factor(total: Option<f64>) -> f64 {
	match total {
		Some(total) if total > 100_000.0 => 0.80,
		Some(total) if total > 50_000.0 => 0.90,
		_ => 1.0,
	}
}

/// Status base probability decayed by age and amount
///
/// Settled quotes (approved, rejected, expired, cancelled) keep their base.
pub fn conversion_probability(quote: &Quote, now: DateTime<Utc>) -> f64 {
	let base = base_probability(quote.status);
	if base == 0.0 || base == 1.0 {
		return base;
	}

	let probability =
		base * age_factor(now - quote.created_at) * amount_factor(quote.total_amount);
	super::round_to(probability.clamp(0.0, 1.0), 2)
}
