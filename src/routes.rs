//! Inbound REST surface mirroring a fixed subset of the Zoom API.
//!
//! Every handler relays one upstream call using the
//! [`UpstreamAuth`](crate::middleware::UpstreamAuth) inserted by [`authorize`]; absent query
//! values are not forwarded.

pub mod meetings;
pub mod users;
pub mod webinars;

// crates.io
use axum::{
	Form, Json, Router,
	extract::{FromRequest, Request},
	http::header,
	middleware::from_fn_with_state,
	response::{IntoResponse, Response},
	routing::get,
};
// self
use crate::{
	_prelude::*,
	middleware::authorize,
	relay::{RelayError, Relayed},
	server::AppState,
};

type RelayResult = std::result::Result<Relayed, RelayError>;

/// Pagination cursor.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PageQuery {
	/// Cursor returned by a previous page.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub next_page_token: Option<String>,
}

/// Status filter with pagination.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatusPageQuery {
	/// Status filter understood upstream.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
	/// Cursor returned by a previous page.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub next_page_token: Option<String>,
}

/// Status filter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatusQuery {
	/// Status filter understood upstream.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
}

/// Deletion mode.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionQuery {
	/// Deletion action understood upstream.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
}

/// Date window with pagination.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RecordingsQuery {
	/// Start date.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub from: Option<String>,
	/// End date.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub to: Option<String>,
	/// Cursor returned by a previous page.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub next_page_token: Option<String>,
}

/// Request body relayed upstream, accepted as JSON or as an urlencoded form.
///
/// Form fields become a flat JSON object of strings; a repeated field keeps its last value.
#[derive(Clone, Debug, PartialEq)]
pub struct Payload(pub serde_json::Value);
impl<S> FromRequest<S> for Payload
where
	S: Send + Sync,
{
	type Rejection = Response;

	async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
		let is_form = req
			.headers()
			.get(header::CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

		if is_form {
			let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
				.await
				.map_err(IntoResponse::into_response)?;
			let object = fields
				.into_iter()
				.map(|(name, value)| (name, serde_json::Value::String(value)))
				.collect::<serde_json::Map<_, _>>();

			return Ok(Self(serde_json::Value::Object(object)));
		}

		let Json(body) = Json::<serde_json::Value>::from_request(req, state)
			.await
			.map_err(IntoResponse::into_response)?;

		Ok(Self(body))
	}
}

/// Builds the full inbound router: protected API namespaces plus the health probe.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.merge(protected(state))
}

fn protected(state: AppState) -> Router {
	Router::new()
		.merge(users::routes())
		.merge(meetings::routes())
		.merge(webinars::routes())
		.route_layer(from_fn_with_state(state.clone(), authorize))
		.with_state(state)
}

async fn health() -> Json<serde_json::Value> {
	Json(serde_json::json!({ "status": "ok" }))
}
