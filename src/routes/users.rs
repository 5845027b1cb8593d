//! `/api/users` handlers.

// crates.io
use axum::{
	Extension, Router,
	extract::{Path, Query, State},
	routing::{get, post},
};
// self
use crate::{
	middleware::UpstreamAuth,
	relay::UpstreamRequest,
	routes::{
		ActionQuery, PageQuery, Payload, RecordingsQuery, RelayResult, StatusPageQuery,
		StatusQuery,
	},
	server::AppState,
};

pub(crate) fn routes() -> Router<AppState> {
	Router::new()
		.route("/api/users", get(list))
		.route("/api/users/add", post(create))
		.route("/api/users/{id}", get(read).patch(update).delete(remove))
		.route("/api/users/{id}/settings", get(settings).patch(update_settings))
		.route("/api/users/{id}/meetings", get(meetings))
		.route("/api/users/{id}/webinars", get(webinars))
		.route("/api/users/{id}/recordings", get(recordings))
}

async fn list(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Query(query): Query<StatusPageQuery>,
) -> RelayResult {
	let request = UpstreamRequest::get(["users"], "Error fetching users").query(&query);

	state.upstream().relay(&auth, request).await
}

async fn create(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Payload(body): Payload,
) -> RelayResult {
	let request = UpstreamRequest::post(["users"], "Error creating user").json(body);

	state.upstream().relay(&auth, request).await
}

async fn read(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
	Query(query): Query<StatusQuery>,
) -> RelayResult {
	let request = UpstreamRequest::get(
		["users", id.as_str()],
		format!("Error fetching user: {id}"),
	)
	.query(&query);

	state.upstream().relay(&auth, request).await
}

async fn update(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
	Payload(body): Payload,
) -> RelayResult {
	let request = UpstreamRequest::patch(
		["users", id.as_str()],
		format!("Error updating user: {id}"),
	)
	.json(body);

	state.upstream().relay(&auth, request).await
}

async fn remove(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
	Query(query): Query<ActionQuery>,
) -> RelayResult {
	let request = UpstreamRequest::delete(
		["users", id.as_str()],
		format!("Error deleting user: {id}"),
	)
	.query(&query);

	state.upstream().relay(&auth, request).await
}

async fn settings(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
) -> RelayResult {
	let request = UpstreamRequest::get(
		["users", id.as_str(), "settings"],
		format!("Error fetching settings for user: {id}"),
	);

	state.upstream().relay(&auth, request).await
}

async fn update_settings(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
	Payload(body): Payload,
) -> RelayResult {
	let request = UpstreamRequest::patch(
		["users", id.as_str(), "settings"],
		format!("Error updating settings for user: {id}"),
	)
	.json(body);

	state.upstream().relay(&auth, request).await
}

async fn meetings(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
	Query(query): Query<PageQuery>,
) -> RelayResult {
	let request = UpstreamRequest::get(
		["users", id.as_str(), "meetings"],
		format!("Error fetching meetings for user: {id}"),
	)
	.query(&query);

	state.upstream().relay(&auth, request).await
}

async fn webinars(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
	Query(query): Query<PageQuery>,
) -> RelayResult {
	let request = UpstreamRequest::get(
		["users", id.as_str(), "webinars"],
		format!("Error fetching webinars for user: {id}"),
	)
	.query(&query);

	state.upstream().relay(&auth, request).await
}

async fn recordings(
	State(state): State<AppState>,
	Extension(auth): Extension<UpstreamAuth>,
	Path(id): Path<String>,
	Query(query): Query<RecordingsQuery>,
) -> RelayResult {
	let request = UpstreamRequest::get(
		["users", id.as_str(), "recordings"],
		format!("Error fetching recordings for user: {id}"),
	)
	.query(&query);

	state.upstream().relay(&auth, request).await
}
