//! HTTP executor for the remote query service
//!
//! Posts `{ query, variables }` as JSON and parses `{ data, errors }`.

use std::str::FromStr;

use async_trait::async_trait;
use rb_types::{AuthMode, RemoteExecutor, RemoteOperation, RemoteResponse, SecretString, TransportError};
use reqwest::{
	header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
	Client,
};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

const API_KEY_HEADER: &str = "x-api-key";

/// Production [`RemoteExecutor`] backed by reqwest
///
/// Performs exactly one HTTP round trip per call; retries and timeouts are
/// applied by the transport client.
pub struct HttpExecutor {
	client: Client,
	endpoint: Url,
	api_key: Option<SecretString>,
	/// Session token for user-pool calls, refreshed by the signed-in user flow
	id_token: RwLock<Option<SecretString>>,
}

impl HttpExecutor {
	pub fn new(endpoint: &str, api_key: Option<SecretString>) -> Result<Self, TransportError> {
		let endpoint = Url::parse(endpoint).map_err(|e| {
			TransportError::MalformedRequest(format!("Invalid endpoint '{}': {}", endpoint, e))
		})?;

		let mut headers = HeaderMap::new();
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		headers.insert(USER_AGENT, HeaderValue::from_static("Renovation-Backoffice/0.1"));

		let client = Client::builder()
			.default_headers(headers)
			.build()
			.map_err(TransportError::HttpError)?;

		Ok(Self {
			client,
			endpoint,
			api_key,
			id_token: RwLock::new(None),
		})
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Install or clear the signed-in user's token
	pub async fn set_id_token(&self, token: Option<SecretString>) {
		*self.id_token.write().await = token;
	}

	async fn auth_header(&self, auth_mode: AuthMode) -> Result<(HeaderName, HeaderValue), TransportError> {
		let (name, secret) = match auth_mode {
			AuthMode::ApiKey => (
				HeaderName::from_static(API_KEY_HEADER),
				self.api_key.clone().filter(|key| !key.is_blank()).ok_or_else(|| {
					TransportError::Unauthorized("No API key configured".to_string())
				})?,
			),
			AuthMode::UserPool => (
				AUTHORIZATION,
				self.id_token
					.read()
					.await
					.clone()
					.filter(|token| !token.is_blank())
					.ok_or_else(|| {
						TransportError::Unauthorized("No signed-in user session".to_string())
					})?,
			),
		};

		let mut value = HeaderValue::from_str(secret.expose_secret()).map_err(|_| {
			TransportError::Unauthorized(format!("Credential for {} is not a valid header", auth_mode))
		})?;
		value.set_sensitive(true);
		Ok((name, value))
	}
}

#[async_trait]
impl RemoteExecutor for HttpExecutor {
	async fn execute(
		&self,
		operation: &RemoteOperation,
		auth_mode: AuthMode,
	) -> Result<RemoteResponse, TransportError> {
		let (header_name, header_value) = self.auth_header(auth_mode).await?;
		let body = json!({
			"query": operation.payload,
			"variables": operation.variables_value(),
		});

		let response = self
			.client
			.post(self.endpoint.clone())
			.header(header_name, header_value)
			.json(&body)
			.send()
			.await
			.map_err(|e| {
				if e.is_connect() {
					TransportError::Connection(e.to_string())
				} else {
					TransportError::HttpError(e)
				}
			})?;

		let status = response.status();
		if !status.is_success() {
			return Err(TransportError::from_http_failure(status.as_u16()));
		}

		let text = response.text().await.map_err(TransportError::HttpError)?;
		debug!(
			"{} responded with {} bytes",
			operation.metrics_tag,
			text.len()
		);

		serde_json::from_str::<RemoteResponse>(&text).map_err(|e| TransportError::InvalidResponse {
			reason: format!("Failed to parse remote response: {}", e),
		})
	}

	fn name(&self) -> &str {
		"http"
	}
}

impl FromStr for HttpExecutor {
	type Err = TransportError;

	/// Executor without credentials, mostly useful for user-pool-only setups
	fn from_str(endpoint: &str) -> Result<Self, Self::Err> {
		Self::new(endpoint, None)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use mockito::{Matcher, Server};
	use rb_types::MetricsTag;

	fn operation() -> RemoteOperation {
		RemoteOperation::new(
			"query ListRequests($limit: Int) { listRequests(limit: $limit) { items { id } nextToken } }",
			MetricsTag::new("list", "Requests"),
		)
		.with_variable("limit", 10)
	}

	#[tokio::test]
	async fn test_posts_query_with_api_key() {
		let mut server = Server::new_async().await;
		let mock = server
			.mock("POST", "/graphql")
			.match_header("x-api-key", "da2-test")
			.match_body(Matcher::PartialJson(json!({"variables": {"limit": 10}})))
			.with_status(200)
			.with_header("content-type", "application/json")
			.with_body(r#"{"data":{"listRequests":{"items":[],"nextToken":null}}}"#)
			.create_async()
			.await;

		let executor = HttpExecutor::new(
			&format!("{}/graphql", server.url()),
			Some(SecretString::new("da2-test")),
		)
		.unwrap();
		let response = executor.execute(&operation(), AuthMode::ApiKey).await.unwrap();

		mock.assert_async().await;
		assert!(response.errors.is_empty());
		assert_eq!(response.data.unwrap()["listRequests"]["items"], json!([]));
	}

	#[tokio::test]
	async fn test_user_pool_sends_authorization_header() {
		let mut server = Server::new_async().await;
		let mock = server
			.mock("POST", "/graphql")
			.match_header("authorization", "eyJ.token")
			.with_status(200)
			.with_body(r#"{"data":null,"errors":[{"message":"Not Authorized to access listRequests"}]}"#)
			.create_async()
			.await;

		let executor = HttpExecutor::from_str(&format!("{}/graphql", server.url())).unwrap();
		executor
			.set_id_token(Some(SecretString::new("eyJ.token")))
			.await;
		let response = executor.execute(&operation(), AuthMode::UserPool).await.unwrap();

		mock.assert_async().await;
		assert!(response.data.is_none());
		assert_eq!(response.errors.len(), 1);
	}

	#[tokio::test]
	async fn test_missing_credentials_fail_before_sending() {
		let executor = HttpExecutor::new("http://127.0.0.1:9/graphql", None).unwrap();
		let error = executor.execute(&operation(), AuthMode::ApiKey).await.unwrap_err();
		assert!(matches!(error, TransportError::Unauthorized(_)));

		let error = executor.execute(&operation(), AuthMode::UserPool).await.unwrap_err();
		assert!(matches!(error, TransportError::Unauthorized(_)));
	}

	#[tokio::test]
	async fn test_http_status_and_body_failures() {
		let mut server = Server::new_async().await;
		server
			.mock("POST", "/unavailable")
			.with_status(503)
			.create_async()
			.await;
		server
			.mock("POST", "/garbled")
			.with_status(200)
			.with_body("<html>gateway</html>")
			.create_async()
			.await;

		let key = Some(SecretString::new("da2-test"));
		let executor = HttpExecutor::new(&format!("{}/unavailable", server.url()), key.clone()).unwrap();
		let error = executor.execute(&operation(), AuthMode::ApiKey).await.unwrap_err();
		assert_eq!(error.status_code(), Some(503));

		let executor = HttpExecutor::new(&format!("{}/garbled", server.url()), key).unwrap();
		let error = executor.execute(&operation(), AuthMode::ApiKey).await.unwrap_err();
		assert!(matches!(error, TransportError::InvalidResponse { .. }));
	}

	#[test]
	fn test_invalid_endpoint_is_rejected() {
		assert!(HttpExecutor::new("not a url", None).is_err());
	}
}
