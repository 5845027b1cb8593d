//! JSON relay to the upstream REST API.
//!
//! Success passes the upstream status and body through unchanged. A non-success
//! answer keeps its status and is reduced to `{"message": ...}`, preferring the
//! upstream message over the route's fallback. Transport failures become 500.

// crates.io
use axum::{
	Json,
	body::{Body, Bytes},
	http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
	response::{IntoResponse, Response},
};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::ReqwestHttpClient,
	middleware::UpstreamAuth,
};

/// Upstream API base used when none is configured.
pub const ZOOM_API_BASE_URL: &str = "https://api.zoom.us/v2";

/// Failure of one relayed upstream call.
#[derive(Debug, ThisError)]
pub enum RelayError {
	/// Upstream answered with a non-success status.
	#[error("Upstream answered {status}: {message}")]
	Upstream {
		/// Status returned upstream, relayed to the caller.
		status: StatusCode,
		/// Upstream message, or the route fallback when upstream gave none.
		message: String,
	},
	/// The upstream call did not produce a response.
	#[error("{message}")]
	Transport {
		/// Route fallback message returned to the caller.
		message: String,
		/// Underlying reqwest failure.
		#[source]
		source: ReqwestError,
	},
}
impl RelayError {
	/// Status returned to the inbound caller.
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Upstream { status, .. } => *status,
			Self::Transport { .. } => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Message returned to the inbound caller.
	pub fn message(&self) -> &str {
		match self {
			Self::Upstream { message, .. } | Self::Transport { message, .. } => message,
		}
	}
}
impl IntoResponse for RelayError {
	fn into_response(self) -> Response {
		if let Self::Transport { source, message } = &self {
			tracing::warn!(error = %source, %message, "upstream call failed without a response");
		}

		(self.status(), Json(serde_json::json!({ "message": self.message() }))).into_response()
	}
}

/// Successful upstream answer, relayed verbatim.
#[derive(Clone, Debug)]
pub struct Relayed {
	/// Upstream status.
	pub status: StatusCode,
	/// Raw JSON body; empty when upstream sent none.
	pub body: Bytes,
}
impl IntoResponse for Relayed {
	fn into_response(self) -> Response {
		if self.body.is_empty() {
			return self.status.into_response();
		}

		let mut response = Response::new(Body::from(self.body));

		*response.status_mut() = self.status;
		response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		response
	}
}

/// One outbound call: method, path segments, optional query and JSON body.
#[derive(Debug)]
pub struct UpstreamRequest<'a, Q = ()> {
	method: Method,
	segments: Vec<&'a str>,
	query: Option<&'a Q>,
	body: Option<serde_json::Value>,
	fallback: String,
}
impl<'a> UpstreamRequest<'a> {
	/// Starts a request for `segments` under the API base; `fallback` is reported when upstream
	/// gives no message.
	pub fn new(
		method: Method,
		segments: impl IntoIterator<Item = &'a str>,
		fallback: impl Into<String>,
	) -> Self {
		Self {
			method,
			segments: segments.into_iter().collect(),
			query: None,
			body: None,
			fallback: fallback.into(),
		}
	}

	/// `GET` shorthand.
	pub fn get(segments: impl IntoIterator<Item = &'a str>, fallback: impl Into<String>) -> Self {
		Self::new(Method::GET, segments, fallback)
	}

	/// `POST` shorthand.
	pub fn post(segments: impl IntoIterator<Item = &'a str>, fallback: impl Into<String>) -> Self {
		Self::new(Method::POST, segments, fallback)
	}

	/// `PATCH` shorthand.
	pub fn patch(segments: impl IntoIterator<Item = &'a str>, fallback: impl Into<String>) -> Self {
		Self::new(Method::PATCH, segments, fallback)
	}

	/// `PUT` shorthand.
	pub fn put(segments: impl IntoIterator<Item = &'a str>, fallback: impl Into<String>) -> Self {
		Self::new(Method::PUT, segments, fallback)
	}

	/// `DELETE` shorthand.
	pub fn delete(
		segments: impl IntoIterator<Item = &'a str>,
		fallback: impl Into<String>,
	) -> Self {
		Self::new(Method::DELETE, segments, fallback)
	}

	/// Attaches query parameters; `None` fields must be skipped by the serializer.
	pub fn query<T>(self, query: &'a T) -> UpstreamRequest<'a, T>
	where
		T: Serialize,
	{
		UpstreamRequest {
			method: self.method,
			segments: self.segments,
			query: Some(query),
			body: self.body,
			fallback: self.fallback,
		}
	}
}
impl<Q> UpstreamRequest<'_, Q> {
	/// Attaches a JSON body.
	pub fn json(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}
}

/// HTTP client bound to the upstream API base URL.
#[derive(Clone, Debug)]
pub struct UpstreamClient {
	http: ReqwestHttpClient,
	base_url: Url,
}
impl UpstreamClient {
	/// Builds a client for `base_url` with a request timeout.
	pub fn new(base_url: Url, timeout: StdDuration) -> Result<Self, ConfigError> {
		Self::with_client(ReqwestHttpClient::with_timeout(timeout)?, base_url)
	}

	/// Wraps an existing transport.
	pub fn with_client(http: ReqwestHttpClient, base_url: Url) -> Result<Self, ConfigError> {
		if base_url.cannot_be_a_base() {
			return Err(ConfigError::InvalidUrl {
				field: "ZOOM_API_BASE_URL",
				source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
			});
		}

		Ok(Self { http, base_url })
	}

	/// Base URL every request path is appended to.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Resolves path segments against the base, percent-encoding each segment.
	pub fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
		let mut url = self.base_url.clone();

		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}

		url
	}

	/// Performs the call with the request's authorization and relays the outcome.
	pub async fn relay<Q>(
		&self,
		auth: &UpstreamAuth,
		request: UpstreamRequest<'_, Q>,
	) -> Result<Relayed, RelayError>
	where
		Q: Serialize,
	{
		let UpstreamRequest { method, segments, query, body, fallback } = request;
		let url = self.endpoint(segments);
		let mut builder =
			self.http.request(method.clone(), url.clone()).headers(auth.headers().clone());

		if let Some(query) = query {
			builder = builder.query(query);
		}
		if let Some(body) = &body {
			builder = builder.json(body);
		}

		let response = match builder.send().await {
			Ok(response) => response,
			Err(source) => return Err(RelayError::Transport { message: fallback, source }),
		};
		let status = response.status();
		let bytes = match response.bytes().await {
			Ok(bytes) => bytes,
			Err(source) => return Err(RelayError::Transport { message: fallback, source }),
		};

		tracing::debug!(
			%method,
			path = url.path(),
			status = status.as_u16(),
			"upstream call completed"
		);

		if status.is_success() {
			return Ok(Relayed { status, body: bytes });
		}

		let message = serde_json::from_slice::<UpstreamFailure>(&bytes)
			.ok()
			.and_then(|failure| failure.message)
			.filter(|message| !message.is_empty())
			.unwrap_or(fallback);

		Err(RelayError::Upstream { status, message })
	}
}

#[derive(Deserialize)]
struct UpstreamFailure {
	#[serde(default)]
	message: Option<String>,
}
