// crates.io
use clap::Parser;
use tokio::{net::TcpListener, sync::oneshot};
// self
use zoom_gateway::{
	_preludet::*,
	config::Config,
	error::Error,
	lifecycle::{self, Lifecycle},
	server,
	store::{CredentialStore, MemoryStore},
};

#[tokio::test]
async fn shutdown_signal_clears_the_cache_and_releases_the_store() {
	let provider = Arc::new(FakeProvider::issuing(StdDuration::ZERO));
	let (cache, store) = build_memory_cache(provider);

	cache.get_valid_credential().await.expect("Acquisition should succeed.");

	assert_eq!(store.len(), 1);

	let state = build_app_state(cache, "http://127.0.0.1:9");
	let lifecycle = Lifecycle::new(state.cache().clone());
	let listener =
		TcpListener::bind("127.0.0.1:0").await.expect("Loopback listener should bind.");
	let addr = listener.local_addr().expect("Listener should report its address.");
	let (trigger, signal) = oneshot::channel::<()>();
	let serving = tokio::spawn(lifecycle::serve(
		listener,
		server::router(state),
		lifecycle,
		async move {
			signal.await.ok();
		},
	));
	let response = test_reqwest_http_client()
		.get(format!("http://{addr}/health"))
		.send()
		.await
		.expect("Health probe should be served before shutdown.");

	assert!(response.status().is_success());

	trigger.send(()).expect("Server should still await the signal.");
	serving
		.await
		.expect("Server task should not panic.")
		.expect("Server should shut down cleanly.");

	assert!(store.is_empty());
	assert!(store.is_closed());
	assert!(store.fetch(&Default::default()).await.is_err());
}

#[tokio::test]
async fn credential_saved_during_drain_is_cleared() {
	let provider = Arc::new(FakeProvider::issuing(StdDuration::from_millis(300)));
	let (cache, store) = build_memory_cache(provider.clone());
	let state = build_app_state(cache, "http://127.0.0.1:9");
	let lifecycle = Lifecycle::new(state.cache().clone());
	let listener =
		TcpListener::bind("127.0.0.1:0").await.expect("Loopback listener should bind.");
	let addr = listener.local_addr().expect("Listener should report its address.");
	let (trigger, signal) = oneshot::channel::<()>();
	let serving = tokio::spawn(lifecycle::serve(
		listener,
		server::router(state),
		lifecycle,
		async move {
			signal.await.ok();
		},
	));
	let in_flight = tokio::spawn(async move {
		test_reqwest_http_client().get(format!("http://{addr}/api/users")).send().await
	});

	tokio::time::sleep(StdDuration::from_millis(100)).await;
	trigger.send(()).expect("Server should still await the signal.");
	serving
		.await
		.expect("Server task should not panic.")
		.expect("Server should shut down cleanly.");

	let response = in_flight
		.await
		.expect("Request task should not panic.")
		.expect("In-flight request should be answered while draining.");

	assert_eq!(response.status().as_u16(), 500);
	assert_eq!(provider.calls(), 1);
	assert!(store.is_empty());
	assert!(store.is_closed());
}

#[tokio::test]
async fn teardown_failures_are_logged_not_raised() {
	let provider = Arc::new(FakeProvider::issuing(StdDuration::ZERO));
	let store = Arc::new(FailingStore::default());
	let cache = build_cache(store.clone(), provider, Duration::seconds(1));
	let lifecycle = Lifecycle::new(Arc::new(cache));

	assert!(!lifecycle.invalidate().await);

	lifecycle.release().await;

	assert_eq!(store.attempts(), 2);
}

#[tokio::test]
async fn startup_failure_after_store_connect_is_reported() {
	let occupied = TcpListener::bind("0.0.0.0:0").await.expect("Listener should bind.");
	let port = occupied.local_addr().expect("Listener should report its address.").port();
	let port = port.to_string();
	let config = Config::try_parse_from([
		"zoom-gateway",
		"--zoom-account-id",
		"acct",
		"--zoom-client-id",
		"client",
		"--zoom-client-secret",
		"secret",
		"--credential-store",
		"memory",
		"--port",
		port.as_str(),
	])
	.expect("Flags should parse.");
	let store = Arc::new(MemoryStore::default());
	let error = server::run_with_store(config, store.clone())
		.await
		.expect_err("Binding a taken port should fail.");

	assert!(matches!(error, Error::Io(_)));
	assert!(store.is_closed());
}
