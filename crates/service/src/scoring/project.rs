//! Project progress and risk

use chrono::{DateTime, Utc};
use rb_types::{Project, ProjectStatus};
use serde::Serialize;

/// Overrun fraction above which a project is high risk
const HIGH_VARIANCE: f64 = 0.30;
const MEDIUM_VARIANCE: f64 = 0.10;
/// Remaining share of the schedule below which an unreviewed project is at risk
const SCHEDULE_BUFFER: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
	Low,
	Medium,
	High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetrics {
	pub progress_percentage: u32,
	pub risk_level: RiskLevel,
	pub budget_variance: Option<f64>,
	pub is_overdue: bool,
}

impl ProjectMetrics {
	pub fn for_project(project: &Project, now: DateTime<Utc>) -> Self {
		Self {
			progress_percentage: progress_percentage(project, now),
			risk_level: risk_level(project, now),
			budget_variance: budget_variance(project),
			is_overdue: is_overdue(project, now),
		}
	}
}

fn default_progress(status: ProjectStatus) -> u32 {
	match status {
		ProjectStatus::Planning => 0,
		ProjectStatus::Approved => 5,
		ProjectStatus::InProgress | ProjectStatus::OnHold => 50,
		ProjectStatus::UnderReview => 90,
		ProjectStatus::Completed => 100,
		ProjectStatus::Cancelled | ProjectStatus::Archived => 0,
	}
}

/// Share of the scheduled duration already elapsed, if the schedule is usable
fn elapsed_fraction(project: &Project, now: DateTime<Utc>) -> Option<f64> {
	let start = project.start_date?;
	let end = project.estimated_completion_date?;
	let total = (end - start).num_seconds();
	if total <= 0 {
		return None;
	}
	Some((now - start).num_seconds() as f64 / total as f64)
}

/// Completion estimate, 0-100
///
/// Scheduled work interpolates elapsed time over the planned duration;
/// everything else falls back to a per-status default.
pub fn progress_percentage(project: &Project, now: DateTime<Utc>) -> u32 {
	match project.status {
		ProjectStatus::Completed => 100,
		ProjectStatus::Planning => 0,
		ProjectStatus::Approved | ProjectStatus::InProgress | ProjectStatus::UnderReview => {
			match elapsed_fraction(project, now) {
				Some(fraction) => (fraction * 100.0).clamp(0.0, 100.0).round() as u32,
				None => default_progress(project.status),
			}
		},
		status => default_progress(status),
	}
}

/// Cost overrun as a fraction of budget; negative when under budget
pub fn budget_variance(project: &Project) -> Option<f64> {
	match (project.budget, project.actual_cost) {
		(Some(budget), Some(actual)) if budget > 0.0 => Some((actual - budget) / budget),
		_ => None,
	}
}

fn is_overdue(project: &Project, now: DateTime<Utc>) -> bool {
	project.status.is_active()
		&& project
			.estimated_completion_date
			.is_some_and(|due| due < now)
}

pub fn risk_level(project: &Project, now: DateTime<Utc>) -> RiskLevel {
	let variance = budget_variance(project).unwrap_or(0.0);
	if is_overdue(project, now) || variance > HIGH_VARIANCE {
		return RiskLevel::High;
	}

	let before_review = matches!(
		project.status,
		ProjectStatus::Planning
			| ProjectStatus::Approved
			| ProjectStatus::InProgress
			| ProjectStatus::OnHold
	);
	let schedule_at_risk = before_review
		&& elapsed_fraction(project, now).is_some_and(|fraction| 1.0 - fraction < SCHEDULE_BUFFER);

	if schedule_at_risk || variance > MEDIUM_VARIANCE {
		RiskLevel::Medium
	} else {
		RiskLevel::Low
	}
}
