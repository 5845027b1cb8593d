//! `/api/webinars` handlers.
//!
//! `POST /api/webinars/{id}` takes a user id: it creates a webinar for that user.

// crates.io
use axum::{
	Extension, Router,
	extract::{Path, Query, State},
	routing::{get, put},
};
// self
use crate::{
	middleware::UpstreamAuth,
	relay::UpstreamRequest,
	routes::{PageQuery, Payload, RelayResult, StatusPageQuery},
	server::AppState,
};

pub(crate) fn routes() -> Router<AppState> {
	Router::new()
		.route("/api/webinars/{id}", get(read).post(create).patch(update).delete(remove))
		.route("/api/webinars/{id}/registrants", get(registrants).post(add_registrant))
		.route("/api/webinars/{id}/registrants/status", put(update_registrant_status))
		.route("/api/webinars/{id}/report/participants", get(participants))
}

async fn read(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
) -> RelayResult {
	let request =
		UpstreamRequest::get(["webinars", id.as_str()], format!("Error fetching webinar: {id}"));

	state.upstream().relay(&auth, request).await
}

async fn create(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(user_id): Path<String>,
	Payload(body): Payload,
) -> RelayResult {
	let request = UpstreamRequest::post(
		["users", user_id.as_str(), "webinars"],
		format!("Error creating webinar for user: {user_id}"),
	)
	.json(body);

	state.upstream().relay(&auth, request).await
}

async fn update(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
	Payload(body): Payload,
) -> RelayResult {
	let request = UpstreamRequest::patch(
		["webinars", id.as_str()],
		format!("Error updating webinar: {id}"),
	)
	.json(body);

	state.upstream().relay(&auth, request).await
}

async fn remove(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
) -> RelayResult {
	let request =
		UpstreamRequest::delete(["webinars", id.as_str()], format!("Error deleting webinar: {id}"));

	state.upstream().relay(&auth, request).await
}

async fn registrants(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
	Query(query): Query<StatusPageQuery>,
) -> RelayResult {
	let request = UpstreamRequest::get(
		["webinars", id.as_str(), "registrants"],
		format!("Error fetching registrants for webinar: {id}"),
	)
	.query(&query);

	state.upstream().relay(&auth, request).await
}

async fn add_registrant(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
	Payload(body): Payload,
) -> RelayResult {
	let request = UpstreamRequest::post(
		["webinars", id.as_str(), "registrants"],
		format!("Error creating registrant for webinar: {id}"),
	)
	.json(body);

	state.upstream().relay(&auth, request).await
}

async fn update_registrant_status(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
	Payload(body): Payload,
) -> RelayResult {
	let request = UpstreamRequest::put(
		["webinars", id.as_str(), "registrants", "status"],
		"Error updating webinar registrant status",
	)
	.json(body);

	state.upstream().relay(&auth, request).await
}

async fn participants(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
	Query(query): Query<PageQuery>,
) -> RelayResult {
	let request = UpstreamRequest::get(
		["report", "webinars", id.as_str(), "participants"],
		format!("Error fetching webinar participants for webinar: {id}"),
	)
	.query(&query);

	state.upstream().relay(&auth, request).await
}
