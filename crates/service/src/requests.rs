//! Request service
//!
//! Intake of homeowner requests, lead scoring and hand-off to quoting.

use std::sync::Arc;

use chrono::Utc;
use rb_storage::EntityStore;
use rb_types::{
	ErrorKind, ListOptions, NewQuote, NewRequest, OperationError, OperationResult, Outcome, Page,
	Quote, Request, RequestPatch, RequestStatus,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::guard::guarded;
use crate::scoring::{lead_score, LeadScore, Scored};
use crate::validation::{validate_new_quote, validate_new_request};
use crate::workflow::{WorkflowEngine, WorkflowOutcome};

pub type ScoredRequest = Scored<Request, LeadScore>;

/// Quote created from a request, with the request after `markQuoted`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteConversion {
	pub quote: Quote,
	pub request: Request,
}

#[derive(Clone)]
pub struct RequestService {
	requests: Arc<dyn EntityStore<Request>>,
	quotes: Arc<dyn EntityStore<Quote>>,
	workflow: WorkflowEngine,
}

impl RequestService {
	pub fn new(
		requests: Arc<dyn EntityStore<Request>>,
		quotes: Arc<dyn EntityStore<Quote>>,
		workflow: WorkflowEngine,
	) -> Self {
		Self {
			requests,
			quotes,
			workflow,
		}
	}

	fn scored(request: Request) -> ScoredRequest {
		let metrics = lead_score(&request, Utc::now());
		Scored {
			entity: request,
			metrics,
		}
	}

	/// Validate and create a request; nothing is written if validation fails
	pub async fn create_request(&self, input: NewRequest) -> OperationResult<ScoredRequest> {
		guarded("create_request", async {
			validate_new_request(&input)?;
			let outcome = self.requests.create(&input).await?;
			info!("Created request {}", outcome.data.id);
			Ok(outcome.map(Self::scored))
		})
		.await
	}

	pub async fn get_request(&self, id: &str) -> OperationResult<ScoredRequest> {
		guarded("get_request", async {
			Ok(self.requests.find_by_id(id).await?.map(Self::scored))
		})
		.await
	}

	pub async fn list_requests(&self, options: ListOptions) -> OperationResult<Page<ScoredRequest>> {
		guarded("list_requests", async {
			let outcome = self.requests.find_all(options).await?;
			Ok(outcome.map(|page| Page {
				items: page.items.into_iter().map(Self::scored).collect(),
				next_token: page.next_token,
			}))
		})
		.await
	}

	/// Field edits; status changes go through [`transition`](Self::transition)
	pub async fn update_request(&self, id: &str, patch: RequestPatch) -> OperationResult<ScoredRequest> {
		guarded("update_request", async {
			if patch.status.is_some() {
				return Err(status_via_workflow());
			}
			Ok(self.requests.update(id, &patch).await?.map(Self::scored))
		})
		.await
	}

	pub async fn transition(
		&self,
		id: &str,
		action: &str,
		params: Map<String, Value>,
	) -> OperationResult<WorkflowOutcome<Request>> {
		guarded("transition_request", async {
			self.workflow
				.process_workflow(self.requests.as_ref(), id, action, params)
				.await
		})
		.await
	}

	/// Create a quote for the request, then mark the request quoted
	///
	/// The two writes are not atomic. If marking the request fails after the
	/// quote exists, the error names the created quote.
	pub async fn convert_to_quote(
		&self,
		request_id: &str,
		input: NewQuote,
	) -> OperationResult<QuoteConversion> {
		guarded("convert_to_quote", async {
			let now = Utc::now();
			let request = self.requests.find_by_id(request_id).await?.into_data();

			let check = self
				.workflow
				.check(&request, RequestStatus::Quoted, &Map::new(), now);
			if !check.is_valid {
				return Err(OperationError::validation(check.errors.join("; ")));
			}

			let input = NewQuote {
				request_id: Some(request.id.clone()),
				address_id: input.address_id.or_else(|| request.address_id.clone()),
				homeowner_contact_id: input
					.homeowner_contact_id
					.or_else(|| request.homeowner_contact_id.clone()),
				agent_contact_id: input
					.agent_contact_id
					.or_else(|| request.agent_contact_id.clone()),
				assigned_to: input.assigned_to.or_else(|| request.assigned_to.clone()),
				..input
			};
			validate_new_quote(&input, now)?;

			let Outcome {
				data: quote,
				mut warnings,
				..
			} = self.quotes.create(&input).await?;

			let marked = self
				.workflow
				.process_workflow(self.requests.as_ref(), request_id, "markQuoted", Map::new())
				.await;
			match marked {
				Ok(outcome) => {
					info!("Request {} converted to quote {}", request_id, quote.id);
					warnings.extend(outcome.warnings);
					Ok(Outcome::with_warnings(
						QuoteConversion {
							quote,
							request: outcome.data.entity,
						},
						warnings,
					))
				},
				Err(e) => {
					warn!(
						"Quote {} created but request {} was not marked quoted: {}",
						quote.id, request_id, e
					);
					Err(OperationError::new(
						e.kind,
						format!(
							"Quote {} was created but request {} could not be marked quoted: {}",
							quote.id, request_id, e.message
						),
					))
				},
			}
		})
		.await
	}
}

pub(crate) fn status_via_workflow() -> OperationError {
	OperationError::new(
		ErrorKind::ValidationFailed,
		"Status changes must go through a workflow action",
	)
}
