// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use axum::{
	Extension, Router,
	body::{self, Body},
	http::{Request, StatusCode, header::AUTHORIZATION},
	middleware::from_fn_with_state,
	routing::get,
};
use tower::ServiceExt;
// self
use zoom_gateway::{
	_preludet::*,
	middleware::{UNAVAILABLE_CODE, UpstreamAuth, authorize},
	routes,
	server::AppState,
};

const UNUSED_UPSTREAM: &str = "http://127.0.0.1:9";

fn probe_router(state: AppState, hits: Arc<AtomicUsize>) -> Router {
	let handler = move |Extension(auth): Extension<UpstreamAuth>| {
		let hits = hits.clone();

		async move {
			hits.fetch_add(1, Ordering::SeqCst);

			auth.headers()
				.get(AUTHORIZATION)
				.and_then(|value| value.to_str().ok())
				.unwrap_or_default()
				.to_owned()
		}
	};

	Router::new()
		.route("/probe", get(handler))
		.route_layer(from_fn_with_state(state.clone(), authorize))
		.with_state(state)
}

fn get_request(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).expect("Request fixture should build.")
}

async fn body_json(body: Body) -> serde_json::Value {
	let bytes = body::to_bytes(body, usize::MAX).await.expect("Body should be readable.");

	serde_json::from_slice(&bytes).expect("Body should be JSON.")
}

#[tokio::test]
async fn authorized_request_carries_the_bearer_credential() {
	let provider = Arc::new(FakeProvider::issuing(StdDuration::ZERO));
	let (cache, _store) = build_memory_cache(provider.clone());
	let hits = Arc::new(AtomicUsize::new(0));
	let app = probe_router(build_app_state(cache, UNUSED_UPSTREAM), hits.clone());
	let response = app.oneshot(get_request("/probe")).await.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::OK);

	let bytes =
		body::to_bytes(response.into_body(), usize::MAX).await.expect("Body should be readable.");

	assert_eq!(&bytes[..], b"Bearer T1");
	assert_eq!(hits.load(Ordering::SeqCst), 1);
	assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn provider_timeout_skips_the_handler_with_service_unavailable() {
	let provider = Arc::new(FakeProvider::new(StdDuration::ZERO, FakeOutcome::Hang));
	let cache = build_cache(
		Arc::new(zoom_gateway::store::MemoryStore::default()),
		provider,
		Duration::milliseconds(100),
	);
	let hits = Arc::new(AtomicUsize::new(0));
	let app = probe_router(build_app_state(cache, UNUSED_UPSTREAM), hits.clone());
	let response = app.oneshot(get_request("/probe")).await.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

	let json = body_json(response.into_body()).await;

	assert_eq!(json["code"], UNAVAILABLE_CODE);
	assert_eq!(json["message"], "Upstream authorization is unavailable.");
	assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rejected_exchange_does_not_leak_provider_details() {
	let provider = Arc::new(FakeProvider::new(StdDuration::ZERO, FakeOutcome::Reject(401)));
	let (cache, _store) = build_memory_cache(provider);
	let app = routes::router(build_app_state(cache, UNUSED_UPSTREAM));
	let response = app.oneshot(get_request("/api/users")).await.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

	let json = body_json(response.into_body()).await;

	assert_eq!(json["code"], UNAVAILABLE_CODE);
	assert!(!json.to_string().contains("invalid_client"));
}

#[tokio::test]
async fn health_probe_is_not_protected() {
	let provider = Arc::new(FakeProvider::new(StdDuration::ZERO, FakeOutcome::Reject(401)));
	let (cache, _store) = build_memory_cache(provider.clone());
	let app = routes::router(build_app_state(cache, UNUSED_UPSTREAM));
	let response = app.oneshot(get_request("/health")).await.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_json(response.into_body()).await, serde_json::json!({ "status": "ok" }));
	assert_eq!(provider.calls(), 0);
}
