//! `/api/meetings` handlers.
//!
//! `POST /api/meetings/{id}` takes a user id: it creates a meeting for that user.

// crates.io
use axum::{
	Extension, Router,
	extract::{Path, Query, State},
	routing::{delete, get},
};
// self
use crate::{
	middleware::UpstreamAuth,
	relay::UpstreamRequest,
	routes::{ActionQuery, PageQuery, Payload, RelayResult},
	server::AppState,
};

pub(crate) fn routes() -> Router<AppState> {
	Router::new()
		.route("/api/meetings/{id}", get(read).post(create).patch(update).delete(remove))
		.route("/api/meetings/{id}/report/participants", get(participants))
		.route("/api/meetings/{id}/recordings", delete(remove_recordings))
}

async fn read(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
) -> RelayResult {
	let request =
		UpstreamRequest::get(["meetings", id.as_str()], format!("Error fetching meeting: {id}"));

	state.upstream().relay(&auth, request).await
}

async fn create(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(user_id): Path<String>,
	Payload(body): Payload,
) -> RelayResult {
	let request = UpstreamRequest::post(
		["users", user_id.as_str(), "meetings"],
		format!("Error creating meeting for user: {user_id}"),
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
		["meetings", id.as_str()],
		format!("Error updating meeting: {id}"),
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
		UpstreamRequest::delete(["meetings", id.as_str()], format!("Error deleting meeting: {id}"));

	state.upstream().relay(&auth, request).await
}

async fn participants(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
	Query(query): Query<PageQuery>,
) -> RelayResult {
	let request = UpstreamRequest::get(
		["report", "meetings", id.as_str(), "participants"],
		format!("Error fetching participants for meeting: {id}"),
	)
	.query(&query);

	state.upstream().relay(&auth, request).await
}

async fn remove_recordings(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
	Query(query): Query<ActionQuery>,
) -> RelayResult {
	let request = UpstreamRequest::delete(
		["meetings", id.as_str(), "recordings"],
		format!("Error deleting recordings for meeting: {id}"),
	)
	.query(&query);

	state.upstream().relay(&auth, request).await
}
