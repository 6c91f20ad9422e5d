//! Entity repositories and the lookups the services rely on

use rb_types::{
	Contact, ContactFilter, ListOptions, OperationResult, Page, Project, ProjectFilter, Property,
	Quote, QuoteFilter, Request, RequestFilter, RequestStatus,
};

use crate::repository::CachedRepository;
use crate::traits::EntityStore;

pub type RequestRepository = CachedRepository<Request>;
pub type QuoteRepository = CachedRepository<Quote>;
pub type ProjectRepository = CachedRepository<Project>;
pub type ContactRepository = CachedRepository<Contact>;
pub type PropertyRepository = CachedRepository<Property>;

impl CachedRepository<Request> {
	pub async fn find_by_status(
		&self,
		status: RequestStatus,
		limit: Option<u32>,
	) -> OperationResult<Page<Request>> {
		let mut options = ListOptions::new().with_filter(RequestFilter {
			status: Some(status),
			archived: Some(false),
			..Default::default()
		});
		options.limit = limit;
		self.find_all(options).await
	}

	pub async fn find_by_assignee(&self, assigned_to: &str) -> OperationResult<Page<Request>> {
		self.find_all(ListOptions::new().with_filter(RequestFilter {
			assigned_to: Some(assigned_to.to_string()),
			..Default::default()
		}))
		.await
	}
}

impl CachedRepository<Quote> {
	/// Quotes raised for a request
	pub async fn find_by_request(&self, request_id: &str) -> OperationResult<Page<Quote>> {
		self.find_all(ListOptions::new().with_filter(QuoteFilter {
			request_id: Some(request_id.to_string()),
			..Default::default()
		}))
		.await
	}
}

impl CachedRepository<Project> {
	pub async fn find_by_quote(&self, quote_id: &str) -> OperationResult<Project> {
		self.find_one(
			ProjectFilter {
				quote_id: Some(quote_id.to_string()),
				..Default::default()
			}
			.into(),
		)
		.await
	}
}

impl CachedRepository<Contact> {
	/// Lookup by email, compared in normalised form
	pub async fn find_by_email(&self, email: &str) -> OperationResult<Contact> {
		self.find_one(
			ContactFilter {
				email: Some(email.to_string()),
				..Default::default()
			}
			.into(),
		)
		.await
	}
}
