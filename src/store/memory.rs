//! Thread-safe in-memory [`CredentialStore`] for local development and tests.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{CredentialStore, StoreError, StoreFuture, StoreKey},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, StoredEntry>>>;

#[derive(Clone, Debug)]
struct StoredEntry {
	credential: Credential,
	evict_at: OffsetDateTime,
}

/// In-process store that enforces TTLs the same way a shared cache would.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	map: StoreMap,
	closed: Arc<AtomicBool>,
}
impl MemoryStore {
	/// Returns `true` once [`CredentialStore::close`] has run.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}

	/// Returns the number of live (unexpired) entries.
	pub fn len(&self) -> usize {
		let now = OffsetDateTime::now_utc();

		self.map.read().values().filter(|entry| entry.evict_at > now).count()
	}

	/// Returns `true` when no live entry is held.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns the instant the backend will evict `key`, if present.
	pub fn evicts_at(&self, key: &StoreKey) -> Option<OffsetDateTime> {
		self.map.read().get(key).map(|entry| entry.evict_at)
	}

	fn ensure_open(&self) -> Result<(), StoreError> {
		if self.is_closed() { Err(StoreError::Closed) } else { Ok(()) }
	}

	fn fetch_now(map: &StoreMap, key: &StoreKey) -> Option<Credential> {
		let now = OffsetDateTime::now_utc();
		let mut guard = map.write();

		match guard.get(key) {
			Some(entry) if entry.evict_at > now => Some(entry.credential.clone()),
			Some(_) => {
				guard.remove(key);

				None
			},
			None => None,
		}
	}

	fn save_now(map: &StoreMap, key: &StoreKey, credential: Credential, ttl: Duration) {
		let evict_at = OffsetDateTime::now_utc()
			.checked_add(ttl)
			.unwrap_or(credential.expires_at);

		map.write().insert(key.to_owned(), StoredEntry { credential, evict_at });
	}
}
impl CredentialStore for MemoryStore {
	fn fetch<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<Credential>> {
		Box::pin(async move {
			self.ensure_open()?;

			Ok(Self::fetch_now(&self.map, key))
		})
	}

	fn save<'a>(
		&'a self,
		key: &'a StoreKey,
		credential: Credential,
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.ensure_open()?;
			Self::save_now(&self.map, key, credential, ttl);

			Ok(())
		})
	}

	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			self.ensure_open()?;

			Ok(self.map.write().remove(key).is_some())
		})
	}

	fn close(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.closed.store(true, Ordering::Release);

			Ok(())
		})
	}
}
