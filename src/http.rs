//! Transport primitives for broker and portal calls.
//!
//! The module exposes [`PortalHttpClient`] together with the request/response pair it
//! exchanges, so embedders and tests can swap the HTTP stack without touching the credential
//! provider or the portal client. The default implementation, [`ReqwestHttpClient`], is
//! available behind the `reqwest` feature and applies the configured timeout to every call.

// self
use crate::{_prelude::*, auth::TokenSecret, error::TransportError};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Boxed future returned by [`PortalHttpClient::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<PortalResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports able to send one request and return its raw response.
///
/// Implementations must be `Debug + Send + Sync + 'static` so a single transport can be shared
/// by the credential provider and the portal client behind an `Arc`. A transport never retries on its
/// own: retry policy belongs to the portal client.
pub trait PortalHttpClient
where
	Self: 'static + Debug + Send + Sync,
{
	/// Sends `request` and resolves with the status and body, or a transport failure.
	fn execute(&self, request: PortalRequest) -> TransportFuture<'_>;
}

/// HTTP methods used by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
	/// `GET`, used by every portal endpoint.
	Get,
	/// `POST`, used by the token broker.
	Post,
}

/// Outbound request description.
#[derive(Clone, Debug)]
pub struct PortalRequest {
	/// HTTP method.
	pub method: HttpMethod,
	/// Fully-resolved URL including the query string.
	pub url: Url,
	/// Bearer credential sent in the `Authorization` header.
	pub bearer: Option<TokenSecret>,
	/// JSON body for `POST` requests.
	pub json_body: Option<Value>,
}
impl PortalRequest {
	/// Creates a `GET` request for `url`.
	pub fn get(url: Url) -> Self {
		Self { method: HttpMethod::Get, url, bearer: None, json_body: None }
	}

	/// Creates a `POST` request carrying a JSON body.
	pub fn post_json(url: Url, body: Value) -> Self {
		Self { method: HttpMethod::Post, url, bearer: None, json_body: Some(body) }
	}

	/// Attaches a bearer credential.
	pub fn with_bearer(mut self, bearer: TokenSecret) -> Self {
		self.bearer = Some(bearer);

		self
	}
}

/// Raw response returned by a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortalResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl PortalResponse {
	/// Creates a response from a status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` when the server refused the credential.
	pub fn is_auth_rejected(&self) -> bool {
		matches!(self.status, 401 | 403)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client whose requests are bounded by `timeout`.
	pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.connect_timeout(timeout)
			.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
			.build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl PortalHttpClient for ReqwestHttpClient {
	fn execute(&self, request: PortalRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = match request.method {
				HttpMethod::Get => client.get(request.url),
				HttpMethod::Post => client.post(request.url),
			};

			builder = builder.header(reqwest::header::ACCEPT, "application/json");

			if let Some(bearer) = &request.bearer {
				builder = builder.bearer_auth(bearer.expose());
			}
			if let Some(body) = &request.json_body {
				builder = builder
					.header(reqwest::header::CONTENT_TYPE, "application/json")
					.body(body.to_string());
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(PortalResponse { status, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn response_classification_covers_auth_statuses() {
		assert!(PortalResponse::new(200, "{}").is_success());
		assert!(!PortalResponse::new(302, "").is_success());
		assert!(PortalResponse::new(401, "").is_auth_rejected());
		assert!(PortalResponse::new(403, "").is_auth_rejected());
		assert!(!PortalResponse::new(500, "").is_auth_rejected());
	}

	#[test]
	fn request_builders_attach_bearer_and_body() {
		let url = Url::parse("https://apps.example.edu/academic/schoolCalendar")
			.expect("Fixture URL should parse.");
		let request = PortalRequest::post_json(url, serde_json::json!({ "studentId": "1" }))
			.with_bearer(TokenSecret::new("bearer-value"));

		assert_eq!(request.method, HttpMethod::Post);
		assert_eq!(request.bearer.as_ref().map(TokenSecret::expose), Some("bearer-value"));
		assert!(request.json_body.is_some());
	}
}
