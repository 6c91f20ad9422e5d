//! Back-office services
//!
//! Workflow state machines, scoring heuristics and the request, quote and
//! project services built on the entity stores.

pub mod guard;
pub mod projects;
pub mod quotes;
pub mod requests;
pub mod scoring;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod test_support;

pub use guard::guarded;
pub use projects::{ProjectService, ScoredProject};
pub use quotes::{ProjectConversion, QuoteService, ScoredQuote};
pub use requests::{QuoteConversion, RequestService, ScoredRequest};
pub use scoring::{LeadScore, ProjectMetrics, QuoteMetrics, RiskLevel, Scored};
pub use workflow::{
	validate_transition, validate_transition_at, BusinessHours, TransitionContext,
	TransitionResult, WorkflowEngine, WorkflowEntity, WorkflowOutcome, WorkflowState,
};
