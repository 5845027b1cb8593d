//! Zoom REST gateway: every protected request is relayed upstream with a bearer
//! credential served by a store-backed, single-flight credential cache.

#![deny(clippy::all, missing_docs)]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod obs;
pub mod provider;
pub mod relay;
pub mod routes;
pub mod server;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use crate::{
		auth::Credential,
		cache::{CachePolicy, CredentialCache},
		error::ProviderError,
		http::ReqwestHttpClient,
		provider::{CredentialProvider, ProviderFuture},
		relay::UpstreamClient,
		server::AppState,
		store::{CredentialStore, MemoryStore, StoreError, StoreFuture, StoreKey},
	};

	/// Scripted behavior of a [`FakeProvider`] call.
	#[derive(Clone, Debug)]
	pub enum FakeOutcome {
		/// Issue `T<n>` (n = call number) valid for the given lifetime.
		Issue(Duration),
		/// Fail with a rejection carrying the given status.
		Reject(u16),
		/// Never answer.
		Hang,
	}

	/// Credential provider double counting its calls.
	#[derive(Debug)]
	pub struct FakeProvider {
		calls: AtomicUsize,
		delay: StdDuration,
		outcome: Mutex<FakeOutcome>,
	}
	impl FakeProvider {
		/// Issues one-hour credentials after `delay`.
		pub fn issuing(delay: StdDuration) -> Self {
			Self::new(delay, FakeOutcome::Issue(Duration::hours(1)))
		}

		/// Answers every call with `outcome` after `delay`.
		pub fn new(delay: StdDuration, outcome: FakeOutcome) -> Self {
			Self { calls: AtomicUsize::new(0), delay, outcome: Mutex::new(outcome) }
		}

		/// Changes the outcome of later calls.
		pub fn set_outcome(&self, outcome: FakeOutcome) {
			*self.outcome.lock() = outcome;
		}

		/// Number of `acquire` calls so far.
		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl CredentialProvider for FakeProvider {
		fn acquire(&self) -> ProviderFuture<'_, Credential> {
			Box::pin(async move {
				let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
				let outcome = self.outcome.lock().clone();

				tokio::time::sleep(self.delay).await;

				match outcome {
					FakeOutcome::Issue(lifetime) => Ok(credential(&format!("T{call}"), lifetime)),
					FakeOutcome::Reject(status) => Err(ProviderError::Rejected {
						status,
						message: "invalid_client".into(),
						retry_after: None,
					}),
					FakeOutcome::Hang => std::future::pending().await,
				}
			})
		}
	}

	/// Store double whose every operation fails with a backend error.
	#[derive(Debug, Default)]
	pub struct FailingStore {
		attempts: AtomicUsize,
	}
	impl FailingStore {
		/// Number of operations attempted.
		pub fn attempts(&self) -> usize {
			self.attempts.load(Ordering::SeqCst)
		}

		fn fail<T>(&self) -> Result<T, StoreError> {
			self.attempts.fetch_add(1, Ordering::SeqCst);

			Err(StoreError::Backend { message: "store unreachable".into() })
		}
	}
	impl CredentialStore for FailingStore {
		fn fetch<'a>(&'a self, _: &'a StoreKey) -> StoreFuture<'a, Option<Credential>> {
			Box::pin(async move { self.fail() })
		}

		fn save<'a>(&'a self, _: &'a StoreKey, _: Credential, _: Duration) -> StoreFuture<'a, ()> {
			Box::pin(async move { self.fail() })
		}

		fn delete<'a>(&'a self, _: &'a StoreKey) -> StoreFuture<'a, bool> {
			Box::pin(async move { self.fail() })
		}

		fn close(&self) -> StoreFuture<'_, ()> {
			Box::pin(async move { self.fail() })
		}
	}

	/// Builds a bearer credential expiring `lifetime` from now.
	pub fn credential(token: &str, lifetime: Duration) -> Credential {
		let now = OffsetDateTime::now_utc();

		Credential::builder()
			.access_token(token)
			.issued_at(now - Duration::hours(1))
			.expires_at(now + lifetime)
			.build()
			.expect("Credential fixture should build.")
	}

	/// Cache over `store` and `provider` with a short acquisition bound.
	pub fn build_cache(
		store: Arc<dyn CredentialStore>,
		provider: Arc<dyn CredentialProvider>,
		acquire_timeout: Duration,
	) -> CredentialCache {
		CredentialCache::new(store, provider)
			.with_policy(CachePolicy::default().with_acquire_timeout(acquire_timeout))
	}

	/// Cache over a fresh [`MemoryStore`], returning the store for inspection.
	pub fn build_memory_cache(
		provider: Arc<dyn CredentialProvider>,
	) -> (CredentialCache, Arc<MemoryStore>) {
		let store = Arc::new(MemoryStore::default());
		let cache = build_cache(store.clone(), provider, CachePolicy::DEFAULT_ACQUIRE_TIMEOUT);

		(cache, store)
	}

	/// Application state relaying to `upstream_base`.
	pub fn build_app_state(cache: CredentialCache, upstream_base: &str) -> AppState {
		let base = Url::parse(upstream_base).expect("Upstream base URL fixture should parse.");
		let upstream = UpstreamClient::with_client(test_reqwest_http_client(), base)
			.expect("Upstream client fixture should build.");

		AppState::new(Arc::new(cache), Arc::new(upstream))
	}

	/// Reqwest client for talking to `httpmock` servers.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		ReqwestHttpClient::with_timeout(StdDuration::from_secs(5))
			.expect("Failed to build Reqwest client for tests.")
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::OnceCell as AsyncOnceCell;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
use color_eyre as _;
