//! Query and mutation documents for a model
//!
//! Root fields follow the remote schema convention `getX`, `listX`,
//! `createX`, `updateX` and `deleteX`, where `X` is the model name.

use rb_types::{EntityModel, MetricsTag};
use std::fmt;

/// Repository operation, also used as the metrics tag operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
	Get,
	List,
	Create,
	Update,
	Delete,
}

impl RepositoryOperation {
	pub fn as_str(&self) -> &'static str {
		match self {
			RepositoryOperation::Get => "get",
			RepositoryOperation::List => "list",
			RepositoryOperation::Create => "create",
			RepositoryOperation::Update => "update",
			RepositoryOperation::Delete => "delete",
		}
	}

	pub fn is_mutation(&self) -> bool {
		matches!(
			self,
			RepositoryOperation::Create | RepositoryOperation::Update | RepositoryOperation::Delete
		)
	}

	pub fn metrics_tag(&self, model: &str) -> MetricsTag {
		MetricsTag::new(self.as_str(), model)
	}
}

impl fmt::Display for RepositoryOperation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Root field of `operation` on `model`, e.g. `listRequests`
pub fn root_field(operation: RepositoryOperation, model: &str) -> String {
	format!("{}{}", operation.as_str(), model)
}

/// Operation name used in the document, e.g. `ListRequests`
fn operation_name(operation: RepositoryOperation, model: &str) -> String {
	let verb = operation.as_str();
	let mut name = String::with_capacity(verb.len() + model.len());
	name.push_str(&verb[..1].to_ascii_uppercase());
	name.push_str(&verb[1..]);
	name.push_str(model);
	name
}

/// Document for `operation` on the entity's model
pub fn document<E: EntityModel>(operation: RepositoryOperation) -> String {
	let model = E::MODEL;
	let name = operation_name(operation, model);
	let field = root_field(operation, model);
	let selection = E::selection();

	match operation {
		RepositoryOperation::Get => format!(
			"query {name}($id: ID!) {{ {field}(id: $id) {{ {selection} }} }}"
		),
		RepositoryOperation::List => format!(
			"query {name}($filter: Model{model}FilterInput, $limit: Int, $nextToken: String) \
			 {{ {field}(filter: $filter, limit: $limit, nextToken: $nextToken) \
			 {{ items {{ {selection} }} nextToken }} }}"
		),
		RepositoryOperation::Create | RepositoryOperation::Update | RepositoryOperation::Delete => {
			let input_type = format!("{}Input", operation_name(operation, model));
			format!(
				"mutation {name}($input: {input_type}!) {{ {field}(input: $input) {{ {selection} }} }}"
			)
		},
	}
}
