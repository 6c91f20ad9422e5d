//! Quote service

use std::sync::Arc;

use chrono::Utc;
use rb_storage::EntityStore;
use rb_types::{
	FieldError, ListOptions, NewProject, NewQuote, OperationError, OperationResult, Outcome, Page,
	Project, Quote, QuotePatch, QuoteStatus, RemoteError,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::guard::guarded;
use crate::requests::status_via_workflow;
use crate::scoring::{QuoteMetrics, Scored};
use crate::validation::{validate_new_project, validate_new_quote, validate_quote_patch, INVALID_FIELD};
use crate::workflow::{WorkflowEngine, WorkflowOutcome};

pub type ScoredQuote = Scored<Quote, QuoteMetrics>;

/// Project started from an approved quote
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConversion {
	pub project: Project,
	pub quote: Quote,
}

#[derive(Clone)]
pub struct QuoteService {
	quotes: Arc<dyn EntityStore<Quote>>,
	projects: Arc<dyn EntityStore<Project>>,
	workflow: WorkflowEngine,
}

impl QuoteService {
	pub fn new(
		quotes: Arc<dyn EntityStore<Quote>>,
		projects: Arc<dyn EntityStore<Project>>,
		workflow: WorkflowEngine,
	) -> Self {
		Self {
			quotes,
			projects,
			workflow,
		}
	}

	fn scored(quote: Quote) -> ScoredQuote {
		let metrics = QuoteMetrics::for_quote(&quote, Utc::now());
		Scored {
			entity: quote,
			metrics,
		}
	}

	pub async fn create_quote(&self, input: NewQuote) -> OperationResult<ScoredQuote> {
		guarded("create_quote", async {
			validate_new_quote(&input, Utc::now())?;
			let outcome = self.quotes.create(&input).await?;
			info!("Created quote {}", outcome.data.id);
			Ok(outcome.map(Self::scored))
		})
		.await
	}

	pub async fn get_quote(&self, id: &str) -> OperationResult<ScoredQuote> {
		guarded("get_quote", async {
			Ok(self.quotes.find_by_id(id).await?.map(Self::scored))
		})
		.await
	}

	pub async fn list_quotes(&self, options: ListOptions) -> OperationResult<Page<ScoredQuote>> {
		guarded("list_quotes", async {
			let outcome = self.quotes.find_all(options).await?;
			Ok(outcome.map(|page| Page {
				items: page.items.into_iter().map(Self::scored).collect(),
				next_token: page.next_token,
			}))
		})
		.await
	}

	pub async fn update_quote(&self, id: &str, patch: QuotePatch) -> OperationResult<ScoredQuote> {
		guarded("update_quote", async {
			if patch.status.is_some() {
				return Err(status_via_workflow());
			}
			validate_quote_patch(&patch, Utc::now())?;
			Ok(self.quotes.update(id, &patch).await?.map(Self::scored))
		})
		.await
	}

	pub async fn transition(
		&self,
		id: &str,
		action: &str,
		params: Map<String, Value>,
	) -> OperationResult<WorkflowOutcome<Quote>> {
		guarded("transition_quote", async {
			self.workflow
				.process_workflow(self.quotes.as_ref(), id, action, params)
				.await
		})
		.await
	}

	/// Start a project from an approved quote
	///
	/// Contacts, address and budget are copied from the quote unless given.
	/// Linking the quote back to the project is best effort and reported as
	/// a warning when it fails.
	pub async fn convert_to_project(
		&self,
		quote_id: &str,
		input: NewProject,
	) -> OperationResult<ProjectConversion> {
		guarded("convert_to_project", async {
			let quote = self.quotes.find_by_id(quote_id).await?.into_data();
			if quote.status != QuoteStatus::Approved {
				return Err(OperationError::invalid_fields(vec![FieldError::new(
					"status",
					INVALID_FIELD,
					format!(
						"Only approved quotes can become projects; quote {} is {}",
						quote.id, quote.status
					),
				)]));
			}

			let input = NewProject {
				quote_id: Some(quote.id.clone()),
				request_id: input.request_id.or_else(|| quote.request_id.clone()),
				title: input.title.or_else(|| quote.title.clone()),
				address_id: input.address_id.or_else(|| quote.address_id.clone()),
				homeowner_contact_id: input
					.homeowner_contact_id
					.or_else(|| quote.homeowner_contact_id.clone()),
				agent_contact_id: input
					.agent_contact_id
					.or_else(|| quote.agent_contact_id.clone()),
				assigned_to: input.assigned_to.or_else(|| quote.assigned_to.clone()),
				budget: input.budget.or(quote.total_amount),
				..input
			};
			validate_new_project(&input)?;

			let Outcome {
				data: project,
				mut warnings,
				..
			} = self.projects.create(&input).await?;
			info!("Quote {} converted to project {}", quote.id, project.id);

			let link = QuotePatch {
				project_id: Some(project.id.clone()),
				..Default::default()
			};
			let quote = match self.quotes.update(&quote.id, &link).await {
				Ok(outcome) => {
					warnings.extend(outcome.warnings);
					outcome.data
				},
				Err(e) => {
					warn!("Failed to link quote {} to project {}: {}", quote.id, project.id, e);
					warnings.push(
						RemoteError::new(format!(
							"Quote {} was not linked to project {}: {}",
							quote.id, project.id, e.message
						))
						.with_type(e.code()),
					);
					quote
				},
			};

			Ok(Outcome::with_warnings(ProjectConversion { project, quote }, warnings))
		})
		.await
	}
}
