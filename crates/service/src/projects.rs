//! Project service

use std::sync::Arc;

use chrono::Utc;
use rb_storage::EntityStore;
use rb_types::{ListOptions, NewProject, OperationResult, Page, Project, ProjectPatch};
use serde_json::{Map, Value};
use tracing::info;

use crate::guard::guarded;
use crate::requests::status_via_workflow;
use crate::scoring::{ProjectMetrics, Scored};
use crate::validation::{validate_new_project, validate_project_patch};
use crate::workflow::{WorkflowEngine, WorkflowOutcome};

pub type ScoredProject = Scored<Project, ProjectMetrics>;

#[derive(Clone)]
pub struct ProjectService {
	projects: Arc<dyn EntityStore<Project>>,
	workflow: WorkflowEngine,
}

impl ProjectService {
	pub fn new(projects: Arc<dyn EntityStore<Project>>, workflow: WorkflowEngine) -> Self {
		Self { projects, workflow }
	}

	fn scored(project: Project) -> ScoredProject {
		let metrics = ProjectMetrics::for_project(&project, Utc::now());
		Scored {
			entity: project,
			metrics,
		}
	}

	pub async fn create_project(&self, input: NewProject) -> OperationResult<ScoredProject> {
		guarded("create_project", async {
			validate_new_project(&input)?;
			let outcome = self.projects.create(&input).await?;
			info!("Created project {}", outcome.data.id);
			Ok(outcome.map(Self::scored))
		})
		.await
	}

	pub async fn get_project(&self, id: &str) -> OperationResult<ScoredProject> {
		guarded("get_project", async {
			Ok(self.projects.find_by_id(id).await?.map(Self::scored))
		})
		.await
	}

	pub async fn list_projects(&self, options: ListOptions) -> OperationResult<Page<ScoredProject>> {
		guarded("list_projects", async {
			let outcome = self.projects.find_all(options).await?;
			Ok(outcome.map(|page| Page {
				items: page.items.into_iter().map(Self::scored).collect(),
				next_token: page.next_token,
			}))
		})
		.await
	}

	pub async fn update_project(&self, id: &str, patch: ProjectPatch) -> OperationResult<ScoredProject> {
		guarded("update_project", async {
			if patch.status.is_some() {
				return Err(status_via_workflow());
			}
			validate_project_patch(&patch)?;
			Ok(self.projects.update(id, &patch).await?.map(Self::scored))
		})
		.await
	}

	pub async fn transition(
		&self,
		id: &str,
		action: &str,
		params: Map<String, Value>,
	) -> OperationResult<WorkflowOutcome<Project>> {
		guarded("transition_project", async {
			self.workflow
				.process_workflow(self.projects.as_ref(), id, action, params)
				.await
		})
		.await
	}
}
