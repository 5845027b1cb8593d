// self
use zoom_gateway::{
	_preludet::*,
	auth::Credential,
	cache::{CachePolicy, CredentialCache},
	error::{AcquisitionError, ProviderError},
	store::{CredentialStore, MemoryStore},
};

const CONCURRENT_CALLERS: usize = 16;

async fn seed(store: &MemoryStore, cache: &CredentialCache, token: &str, lifetime: Duration) {
	store
		.save(cache.key(), credential(token, lifetime), Duration::hours(1))
		.await
		.expect("Seeding the memory store should succeed.");
}

async fn call_concurrently(
	cache: Arc<CredentialCache>,
) -> Vec<Result<Credential, AcquisitionError>> {
	let handles = (0..CONCURRENT_CALLERS)
		.map(|_| {
			let cache = cache.clone();

			tokio::spawn(async move { cache.get_valid_credential().await })
		})
		.collect::<Vec<_>>();
	let mut results = Vec::with_capacity(handles.len());

	for handle in handles {
		results.push(handle.await.expect("Caller task should not panic."));
	}

	results
}

#[tokio::test]
async fn concurrent_callers_share_one_acquisition() {
	let provider = Arc::new(FakeProvider::issuing(StdDuration::from_millis(100)));
	let (cache, store) = build_memory_cache(provider.clone());
	let cache = Arc::new(cache);
	let results = call_concurrently(cache.clone()).await;

	assert_eq!(provider.calls(), 1);

	for result in results {
		let credential = result.expect("Every concurrent caller should receive the credential.");

		assert_eq!(credential.access_token.expose(), "T1");
	}

	let stored = store
		.fetch(cache.key())
		.await
		.expect("Memory store fetch should succeed.")
		.expect("Acquired credential should be cached.");

	assert_eq!(stored.access_token.expose(), "T1");
	assert_eq!(cache.metrics().acquisitions(), 1);
}

#[tokio::test]
async fn concurrent_callers_share_one_failure() {
	let provider =
		Arc::new(FakeProvider::new(StdDuration::from_millis(100), FakeOutcome::Reject(401)));
	let (cache, store) = build_memory_cache(provider.clone());
	let results = call_concurrently(Arc::new(cache)).await;
	let errors = results
		.into_iter()
		.map(|result| result.expect_err("Every concurrent caller should observe the failure."))
		.collect::<Vec<_>>();

	assert_eq!(provider.calls(), 1);
	assert!(errors.iter().all(|error| error.same_attempt(&errors[0])));
	assert!(matches!(errors[0].provider_error(), ProviderError::Rejected { status: 401, .. }));
	assert!(store.is_empty());
}

#[tokio::test]
async fn expired_entry_triggers_acquisition() {
	let provider = Arc::new(FakeProvider::issuing(StdDuration::ZERO));
	let (cache, store) = build_memory_cache(provider.clone());

	seed(&store, &cache, "T0", Duration::seconds(-10)).await;

	let credential = cache.get_valid_credential().await.expect("Acquisition should succeed.");

	assert_eq!(credential.access_token.expose(), "T1");
	assert_eq!(provider.calls(), 1);

	let stored = store
		.fetch(cache.key())
		.await
		.expect("Memory store fetch should succeed.")
		.expect("Replacement credential should be cached.");

	assert_eq!(stored.access_token.expose(), "T1");
}

#[tokio::test]
async fn entry_inside_margin_is_refreshed() {
	let provider = Arc::new(FakeProvider::issuing(StdDuration::ZERO));
	let (cache, store) = build_memory_cache(provider.clone());

	assert_eq!(cache.policy().refresh_margin, CachePolicy::DEFAULT_REFRESH_MARGIN);

	seed(&store, &cache, "T0", Duration::seconds(30)).await;

	let credential = cache.get_valid_credential().await.expect("Acquisition should succeed.");

	assert_eq!(credential.access_token.expose(), "T1");
	assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn fresh_entry_is_served_without_provider() {
	let provider = Arc::new(FakeProvider::issuing(StdDuration::ZERO));
	let (cache, store) = build_memory_cache(provider.clone());

	seed(&store, &cache, "T0", Duration::minutes(30)).await;

	for _ in 0..3 {
		let credential =
			cache.get_valid_credential().await.expect("Cached credential should be served.");

		assert_eq!(credential.access_token.expose(), "T0");
	}

	assert_eq!(provider.calls(), 0);
	assert_eq!(cache.metrics().hits(), 3);
	assert_eq!(cache.metrics().misses(), 0);
}

#[tokio::test]
async fn failed_acquisition_writes_nothing_and_retries() {
	let provider = Arc::new(FakeProvider::new(StdDuration::ZERO, FakeOutcome::Reject(500)));
	let (cache, store) = build_memory_cache(provider.clone());
	let error = cache.get_valid_credential().await.expect_err("Rejected exchange should fail.");

	assert!(matches!(error.provider_error(), ProviderError::Rejected { status: 500, .. }));
	assert!(store.is_empty());

	provider.set_outcome(FakeOutcome::Issue(Duration::hours(1)));

	let credential = cache
		.get_valid_credential()
		.await
		.expect("A later caller should start a fresh acquisition.");

	assert_eq!(credential.access_token.expose(), "T2");
	assert_eq!(provider.calls(), 2);
	assert_eq!(cache.metrics().failures(), 1);
	assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn empty_store_acquires_then_serves_from_cache() {
	let provider = Arc::new(FakeProvider::issuing(StdDuration::ZERO));
	let (cache, store) = build_memory_cache(provider.clone());
	let before = OffsetDateTime::now_utc();
	let first = cache.get_valid_credential().await.expect("Acquisition should succeed.");
	let evicts_at = store.evicts_at(cache.key()).expect("Credential should be cached.");

	assert_eq!(first.access_token.expose(), "T1");
	assert!(evicts_at <= first.expires_at + Duration::seconds(1));
	assert!(evicts_at > before + Duration::minutes(59));

	let second = cache.get_valid_credential().await.expect("Cached credential should be served.");

	assert_eq!(second.access_token.expose(), "T1");
	assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn provider_timeout_surfaces_acquisition_error() {
	let provider = Arc::new(FakeProvider::new(StdDuration::ZERO, FakeOutcome::Hang));
	let store = Arc::new(MemoryStore::default());
	let cache = build_cache(store.clone(), provider.clone(), Duration::milliseconds(100));
	let error = cache.get_valid_credential().await.expect_err("Hung provider should time out.");

	assert!(matches!(error.provider_error(), ProviderError::Timeout { .. }));
	assert!(store.is_empty());

	cache.get_valid_credential().await.expect_err("The next caller should start a new attempt.");

	assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn store_failures_degrade_to_direct_acquisition() {
	let provider = Arc::new(FakeProvider::issuing(StdDuration::ZERO));
	let store = Arc::new(FailingStore::default());
	let cache =
		build_cache(store.clone(), provider.clone(), CachePolicy::DEFAULT_ACQUIRE_TIMEOUT);
	let first =
		cache.get_valid_credential().await.expect("Read failure should count as a miss.");
	let second =
		cache.get_valid_credential().await.expect("Write failure should not fail callers.");

	assert_eq!(first.access_token.expose(), "T1");
	assert_eq!(second.access_token.expose(), "T2");
	assert_eq!(provider.calls(), 2);
	assert!(cache.metrics().store_errors() >= 4);
	assert!(store.attempts() >= 4);
}

#[tokio::test]
async fn invalidate_removes_the_entry() {
	let provider = Arc::new(FakeProvider::issuing(StdDuration::ZERO));
	let (cache, store) = build_memory_cache(provider);

	cache.get_valid_credential().await.expect("Acquisition should succeed.");

	assert!(cache.invalidate().await.expect("Invalidation should succeed."));
	assert!(!cache.invalidate().await.expect("Second invalidation should succeed."));
	assert!(store.is_empty());
}
