//! Transition graphs and workflow actions per entity

use chrono::{DateTime, Utc};
use rb_types::{
	EntityModel, OperationError, Project, ProjectPatch, ProjectStatus, Quote, QuotePatch,
	QuoteStatus, Request, RequestStatus,
};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{Edge, WorkflowState};
use crate::validation::{validate_project_patch, validate_quote_patch};

const REOPEN_QUOTED: &str = "Reopening a quoted request; the existing quote may need to be revised";
const REOPEN_EXPIRED: &str = "Reopening an expired request; confirm the homeowner is still interested";
const REVISE_NEGOTIATION: &str = "Revising a quote under negotiation resets it to draft";
const REOPEN_REJECTED: &str = "Reopening a rejected quote; the homeowner already declined it";
const CANCEL_ACTIVE_PROJECT: &str =
	"Cancelling an active project without a cancellation reason";

impl WorkflowState for RequestStatus {
	const ENTITY: &'static str = "request";

	fn as_str(&self) -> &'static str {
		RequestStatus::as_str(self)
	}

	fn edges(&self) -> &'static [Edge<Self>] {
		use RequestStatus::*;

		const NEW: &[Edge<RequestStatus>] = &[
			Edge::to(Assigned).requires(&["assignedTo"]),
			Edge::to(Cancelled),
			Edge::to(Archived),
		];
		const ASSIGNED: &[Edge<RequestStatus>] = &[
			Edge::to(InProgress),
			Edge::to(Cancelled),
			Edge::to(Archived),
		];
		const IN_PROGRESS: &[Edge<RequestStatus>] = &[
			Edge::to(Quoted),
			Edge::to(NeedsInformation),
			Edge::to(Cancelled),
			Edge::to(Archived),
		];
		const NEEDS_INFORMATION: &[Edge<RequestStatus>] = &[
			Edge::to(InProgress),
			Edge::to(Expired),
			Edge::to(Cancelled),
			Edge::to(Archived),
		];
		const QUOTED: &[Edge<RequestStatus>] = &[
			Edge::to(Expired),
			Edge::to(InProgress).warns(REOPEN_QUOTED),
			Edge::to(Cancelled),
			Edge::to(Archived),
		];
		const EXPIRED: &[Edge<RequestStatus>] = &[
			Edge::to(New).warns(REOPEN_EXPIRED),
			Edge::to(Cancelled),
			Edge::to(Archived),
		];

		match self {
			New => NEW,
			Assigned => ASSIGNED,
			InProgress => IN_PROGRESS,
			NeedsInformation => NEEDS_INFORMATION,
			Quoted => QUOTED,
			Expired => EXPIRED,
			Cancelled | Archived => &[],
		}
	}
}

impl WorkflowState for QuoteStatus {
	const ENTITY: &'static str = "quote";

	fn as_str(&self) -> &'static str {
		QuoteStatus::as_str(self)
	}

	fn edges(&self) -> &'static [Edge<Self>] {
		use QuoteStatus::*;

		const DRAFT: &[Edge<QuoteStatus>] = &[Edge::to(PendingReview), Edge::to(Cancelled)];
		const PENDING_REVIEW: &[Edge<QuoteStatus>] = &[
			Edge::to(Sent).requires(&["totalAmount", "validUntil"]),
			Edge::to(Draft),
			Edge::to(Cancelled),
		];
		const SENT: &[Edge<QuoteStatus>] = &[
			Edge::to(Viewed),
			Edge::to(UnderNegotiation),
			Edge::to(Approved),
			Edge::to(Rejected),
			Edge::to(Expired),
			Edge::to(Cancelled),
		];
		const VIEWED: &[Edge<QuoteStatus>] = &[
			Edge::to(UnderNegotiation),
			Edge::to(Approved),
			Edge::to(Rejected),
			Edge::to(Expired),
			Edge::to(Cancelled),
		];
		const UNDER_NEGOTIATION: &[Edge<QuoteStatus>] = &[
			Edge::to(Approved),
			Edge::to(Rejected),
			Edge::to(Expired),
			Edge::to(Draft).warns(REVISE_NEGOTIATION),
			Edge::to(Cancelled),
		];
		const REJECTED: &[Edge<QuoteStatus>] = &[Edge::to(Draft).warns(REOPEN_REJECTED)];
		const EXPIRED: &[Edge<QuoteStatus>] = &[Edge::to(Draft)];

		match self {
			Draft => DRAFT,
			PendingReview => PENDING_REVIEW,
			Sent => SENT,
			Viewed => VIEWED,
			UnderNegotiation => UNDER_NEGOTIATION,
			Rejected => REJECTED,
			Expired => EXPIRED,
			Approved | Cancelled => &[],
		}
	}
}

impl WorkflowState for ProjectStatus {
	const ENTITY: &'static str = "project";

	fn as_str(&self) -> &'static str {
		ProjectStatus::as_str(self)
	}

	fn edges(&self) -> &'static [Edge<Self>] {
		use ProjectStatus::*;

		const PLANNING: &[Edge<ProjectStatus>] =
			&[Edge::to(Approved), Edge::to(Cancelled), Edge::to(Archived)];
		const APPROVED: &[Edge<ProjectStatus>] =
			&[Edge::to(InProgress), Edge::to(Cancelled), Edge::to(Archived)];
		const IN_PROGRESS: &[Edge<ProjectStatus>] = &[
			Edge::to(OnHold),
			Edge::to(UnderReview),
			Edge::to(Cancelled)
				.warns(CANCEL_ACTIVE_PROJECT)
				.unless("cancellationReason"),
			Edge::to(Archived),
		];
		const ON_HOLD: &[Edge<ProjectStatus>] = &[
			Edge::to(InProgress),
			Edge::to(Cancelled)
				.warns(CANCEL_ACTIVE_PROJECT)
				.unless("cancellationReason"),
			Edge::to(Archived),
		];
		const UNDER_REVIEW: &[Edge<ProjectStatus>] = &[
			Edge::to(Completed),
			Edge::to(InProgress),
			Edge::to(Cancelled),
			Edge::to(Archived),
		];

		match self {
			Planning => PLANNING,
			Approved => APPROVED,
			InProgress => IN_PROGRESS,
			OnHold => ON_HOLD,
			UnderReview => UNDER_REVIEW,
			Completed | Cancelled | Archived => &[],
		}
	}
}

/// Target status of a named action plus the fields it stamps
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowAction<S> {
	pub target: S,
	pub effects: Map<String, Value>,
}

impl<S> WorkflowAction<S> {
	pub fn new(target: S) -> Self {
		Self {
			target,
			effects: Map::new(),
		}
	}

	pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
		self.effects.insert(field.to_string(), value.into());
		self
	}

	fn stamp(self, field: &str, now: DateTime<Utc>) -> Self {
		self.set(field, now.to_rfc3339())
	}
}

/// An entity driven through a status graph by named actions
pub trait WorkflowEntity: EntityModel + Serialize {
	type State: WorkflowState;

	fn state(&self) -> Self::State;

	/// Resolve an action name against the current status
	fn action(name: &str, current: Self::State, now: DateTime<Utc>)
		-> Option<WorkflowAction<Self::State>>;

	/// Field rules for the patch an action writes
	fn validate_patch(_patch: &Self::Patch, _now: DateTime<Utc>) -> Result<(), OperationError> {
		Ok(())
	}
}

impl WorkflowEntity for Request {
	type State = RequestStatus;

	fn state(&self) -> RequestStatus {
		self.status
	}

	fn action(
		name: &str,
		current: RequestStatus,
		now: DateTime<Utc>,
	) -> Option<WorkflowAction<RequestStatus>> {
		let action = match name {
			"assign" => WorkflowAction::new(RequestStatus::Assigned).stamp("assignedDate", now),
			"startWork" => WorkflowAction::new(RequestStatus::InProgress),
			"requestInformation" => WorkflowAction::new(RequestStatus::NeedsInformation),
			"markQuoted" => {
				WorkflowAction::new(RequestStatus::Quoted).stamp("moveToQuotingDate", now)
			},
			"expire" => WorkflowAction::new(RequestStatus::Expired).stamp("expiredDate", now),
			"reopen" => match current {
				RequestStatus::Expired => WorkflowAction::new(RequestStatus::New),
				_ => WorkflowAction::new(RequestStatus::InProgress),
			},
			"cancel" => WorkflowAction::new(RequestStatus::Cancelled),
			"archive" => WorkflowAction::new(RequestStatus::Archived)
				.set("archived", true)
				.stamp("archivedDate", now),
			_ => return None,
		};
		Some(action)
	}
}

impl WorkflowEntity for Quote {
	type State = QuoteStatus;

	fn state(&self) -> QuoteStatus {
		self.status
	}

	fn action(
		name: &str,
		_current: QuoteStatus,
		now: DateTime<Utc>,
	) -> Option<WorkflowAction<QuoteStatus>> {
		let action = match name {
			"submitForReview" => WorkflowAction::new(QuoteStatus::PendingReview),
			"send" => WorkflowAction::new(QuoteStatus::Sent).stamp("sentDate", now),
			"markViewed" => WorkflowAction::new(QuoteStatus::Viewed).stamp("openedDate", now),
			"negotiate" => WorkflowAction::new(QuoteStatus::UnderNegotiation),
			"approve" => WorkflowAction::new(QuoteStatus::Approved).stamp("signedDate", now),
			"reject" => WorkflowAction::new(QuoteStatus::Rejected).stamp("rejectedDate", now),
			"expire" => WorkflowAction::new(QuoteStatus::Expired).stamp("expiredDate", now),
			"revise" => WorkflowAction::new(QuoteStatus::Draft),
			"cancel" => WorkflowAction::new(QuoteStatus::Cancelled),
			_ => return None,
		};
		Some(action)
	}

	fn validate_patch(patch: &QuotePatch, now: DateTime<Utc>) -> Result<(), OperationError> {
		validate_quote_patch(patch, now)
	}
}

impl WorkflowEntity for Project {
	type State = ProjectStatus;

	fn state(&self) -> ProjectStatus {
		self.status
	}

	fn action(
		name: &str,
		_current: ProjectStatus,
		now: DateTime<Utc>,
	) -> Option<WorkflowAction<ProjectStatus>> {
		let action = match name {
			"approve" => WorkflowAction::new(ProjectStatus::Approved),
			"startExecution" => WorkflowAction::new(ProjectStatus::InProgress).stamp("startDate", now),
			"hold" => WorkflowAction::new(ProjectStatus::OnHold),
			"resume" => WorkflowAction::new(ProjectStatus::InProgress),
			"submitForReview" => WorkflowAction::new(ProjectStatus::UnderReview),
			"complete" => WorkflowAction::new(ProjectStatus::Completed)
				.stamp("actualCompletionDate", now),
			"cancel" => WorkflowAction::new(ProjectStatus::Cancelled),
			"archive" => WorkflowAction::new(ProjectStatus::Archived).set("archived", true),
			_ => return None,
		};
		Some(action)
	}

	fn validate_patch(patch: &ProjectPatch, _now: DateTime<Utc>) -> Result<(), OperationError> {
		validate_project_patch(patch)
	}
}
