//! Credential cache manager with store-backed caching and a single-flight acquisition guard.
//!
//! [`CredentialCache::get_valid_credential`] reads the shared store on every call
//! and serves the entry when it stays valid beyond the refresh margin. Otherwise
//! callers join the in-flight acquisition (or start one): the leader re-checks
//! the store, calls the provider under a bounded timeout, caches the result with
//! a TTL equal to its remaining validity, and every waiter of that flight
//! receives the same credential or the same error.

mod metrics;

pub use metrics::CacheMetrics;

// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::{AcquisitionError, ProviderError},
	obs::{self, FlowSpan, Operation, Outcome},
	provider::CredentialProvider,
	store::{CredentialStore, StoreError, StoreKey},
};

type Flight = AsyncOnceCell<Result<Credential, AcquisitionError>>;

/// Freshness and timeout policy applied by [`CredentialCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachePolicy {
	/// Credentials expiring within this window are treated as expired.
	pub refresh_margin: Duration,
	/// Upper bound for one provider exchange.
	pub acquire_timeout: Duration,
}
impl CachePolicy {
	/// Default refresh margin.
	pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::seconds(60);
	/// Default acquisition timeout.
	pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::seconds(10);

	/// Overrides the refresh margin; negative values become zero.
	pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Overrides the acquisition timeout; non-positive values keep the default.
	pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
		self.acquire_timeout =
			if timeout.is_positive() { timeout } else { Self::DEFAULT_ACQUIRE_TIMEOUT };

		self
	}
}
impl Default for CachePolicy {
	fn default() -> Self {
		Self {
			refresh_margin: Self::DEFAULT_REFRESH_MARGIN,
			acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
		}
	}
}

/// Mediates every read of the shared credential.
pub struct CredentialCache {
	store: Arc<dyn CredentialStore>,
	provider: Arc<dyn CredentialProvider>,
	key: StoreKey,
	policy: CachePolicy,
	metrics: Arc<CacheMetrics>,
	in_flight: Mutex<Option<Arc<Flight>>>,
}
impl CredentialCache {
	/// Creates a cache over the injected store and provider using the default key and policy.
	pub fn new(store: Arc<dyn CredentialStore>, provider: Arc<dyn CredentialProvider>) -> Self {
		Self {
			store,
			provider,
			key: StoreKey::default(),
			policy: CachePolicy::default(),
			metrics: Default::default(),
			in_flight: Mutex::new(None),
		}
	}

	/// Overrides the store key.
	pub fn with_key(mut self, key: StoreKey) -> Self {
		self.key = key;

		self
	}

	/// Overrides the freshness/timeout policy.
	pub fn with_policy(mut self, policy: CachePolicy) -> Self {
		self.policy = policy;

		self
	}

	/// Store key holding the credential.
	pub fn key(&self) -> &StoreKey {
		&self.key
	}

	/// Active policy.
	pub fn policy(&self) -> CachePolicy {
		self.policy
	}

	/// Lookup/acquisition counters.
	pub fn metrics(&self) -> &CacheMetrics {
		&self.metrics
	}

	/// Returns a credential whose expiry lies beyond the refresh margin.
	pub async fn get_valid_credential(&self) -> Result<Credential, AcquisitionError> {
		const OPERATION: Operation = Operation::Lookup;

		let span = FlowSpan::new(OPERATION, "get_valid_credential");

		obs::record_outcome(OPERATION, Outcome::Attempt);

		let result = span
			.wrap(async move {
				if let Some(credential) = self.cached(OffsetDateTime::now_utc()).await {
					obs::record_outcome(OPERATION, Outcome::Hit);

					return Ok(credential);
				}

				self.metrics.record_miss();
				self.acquire_shared().await
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(OPERATION, Outcome::Success),
			Err(_) => obs::record_outcome(OPERATION, Outcome::Failure),
		}

		result
	}

	/// Deletes the cached entry, returning whether one existed.
	pub async fn invalidate(&self) -> Result<bool, StoreError> {
		const OPERATION: Operation = Operation::Invalidate;

		let span = FlowSpan::new(OPERATION, "invalidate");
		let result =
			span.wrap(<dyn CredentialStore>::delete(self.store.as_ref(), &self.key)).await;

		match &result {
			Ok(_) => obs::record_outcome(OPERATION, Outcome::Success),
			Err(_) => obs::record_outcome(OPERATION, Outcome::Failure),
		}

		result
	}

	/// Releases the underlying store connection.
	pub async fn close_store(&self) -> Result<(), StoreError> {
		<dyn CredentialStore>::close(self.store.as_ref()).await
	}

	async fn cached(&self, now: OffsetDateTime) -> Option<Credential> {
		match <dyn CredentialStore>::fetch(self.store.as_ref(), &self.key).await {
			Ok(Some(credential)) if credential.is_fresh_at(now, self.policy.refresh_margin) => {
				self.metrics.record_hit();

				Some(credential)
			},
			Ok(Some(stale)) => {
				tracing::debug!(expires_at = %stale.expires_at, "cached credential is stale");

				None
			},
			Ok(None) => None,
			Err(e) => {
				self.metrics.record_store_error();
				tracing::warn!(error = %e, key = %self.key, "credential store read failed");

				None
			},
		}
	}

	async fn acquire_shared(&self) -> Result<Credential, AcquisitionError> {
		let flight = self.join_flight();

		flight.get_or_init(|| self.lead(&flight)).await.clone()
	}

	fn join_flight(&self) -> Arc<Flight> {
		self.in_flight.lock().get_or_insert_with(|| Arc::new(Flight::new())).clone()
	}

	fn release_flight(&self, flight: &Arc<Flight>) {
		let mut slot = self.in_flight.lock();

		if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, flight)) {
			*slot = None;
		}
	}

	async fn lead(&self, flight: &Arc<Flight>) -> Result<Credential, AcquisitionError> {
		const OPERATION: Operation = Operation::Acquire;

		let span = FlowSpan::new(OPERATION, "single_flight_leader");

		obs::record_outcome(OPERATION, Outcome::Attempt);

		let result = span.wrap(self.acquire_and_cache()).await;

		// Later callers must start a new flight instead of replaying this result.
		self.release_flight(flight);

		match &result {
			Ok(_) => obs::record_outcome(OPERATION, Outcome::Success),
			Err(_) => obs::record_outcome(OPERATION, Outcome::Failure),
		}

		result
	}

	async fn acquire_and_cache(&self) -> Result<Credential, AcquisitionError> {
		// A peer flight or another process may have refreshed the entry meanwhile.
		if let Some(credential) = self.cached(OffsetDateTime::now_utc()).await {
			return Ok(credential);
		}

		self.metrics.record_acquisition();

		let timeout = self.policy.acquire_timeout;
		let bound = StdDuration::try_from(timeout).unwrap_or(StdDuration::ZERO);
		let acquire = <dyn CredentialProvider>::acquire(self.provider.as_ref());
		let credential = match tokio::time::timeout(bound, acquire).await {
			Ok(Ok(credential)) => credential,
			Ok(Err(e)) => return Err(self.fail(e)),
			Err(_) => return Err(self.fail(ProviderError::Timeout { after: timeout })),
		};
		let now = OffsetDateTime::now_utc();

		if credential.is_expired_at(now) {
			return Err(self.fail(ProviderError::InvalidResponse {
				reason: "provider issued an already expired credential".into(),
			}));
		}

		let ttl = credential.remaining_at(now);

		match <dyn CredentialStore>::save(self.store.as_ref(), &self.key, credential.clone(), ttl)
			.await
		{
			Ok(()) => tracing::info!(
				expires_at = %credential.expires_at,
				ttl_secs = ttl.whole_seconds(),
				"acquired and cached a new credential"
			),
			Err(e) => {
				self.metrics.record_store_error();
				tracing::warn!(
					error = %e,
					key = %self.key,
					"acquired credential could not be cached"
				);
			},
		}

		Ok(credential)
	}

	fn fail(&self, e: ProviderError) -> AcquisitionError {
		self.metrics.record_failure();
		tracing::warn!(error = %e, kind = e.kind(), "credential acquisition failed");

		e.into()
	}
}
impl Debug for CredentialCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialCache")
			.field("key", &self.key)
			.field("policy", &self.policy)
			.field("acquisition_in_flight", &self.in_flight.lock().is_some())
			.finish()
	}
}
