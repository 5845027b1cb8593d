//! Storage contract and built-in backends for the shared credential entry.

pub mod memory;
#[cfg(feature = "redis")] pub mod redis;

pub use memory::MemoryStore;
#[cfg(feature = "redis")] pub use self::redis::RedisStore;

// self
use crate::{_prelude::*, auth::Credential, error::ConfigError};

/// Boxed future returned by every [`CredentialStore`] operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Shared key-value store holding the cached credential.
///
/// The store may be remote and shared with other gateway processes, so callers
/// must re-validate whatever [`fetch`](CredentialStore::fetch) returns instead of
/// assuming they are the only writer.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches the credential stored under `key`, if present and not expired store-side.
	fn fetch<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<Credential>>;

	/// Stores `credential` under `key`, letting the backend expire it after `ttl`.
	fn save<'a>(
		&'a self,
		key: &'a StoreKey,
		credential: Credential,
		ttl: Duration,
	) -> StoreFuture<'a, ()>;

	/// Deletes the entry under `key`, returning whether one existed.
	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, bool>;

	/// Releases the backend connection; later operations fail with [`StoreError::Closed`].
	fn close(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// The store connection has already been released.
	#[error("Credential store is closed.")]
	Closed,
}

/// Well-known key the credential is stored under.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreKey(String);
impl StoreKey {
	/// Key used when none is configured.
	pub const DEFAULT: &'static str = "access_token";

	/// Builds a key after rejecting empty or whitespace-only values.
	pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
		let value = value.into();

		if value.trim().is_empty() {
			return Err(ConfigError::InvalidStoreKey);
		}

		Ok(Self(value))
	}

	/// Returns the raw key.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Default for StoreKey {
	fn default() -> Self {
		Self(Self::DEFAULT.into())
	}
}
impl AsRef<str> for StoreKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Display for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl From<StoreKey> for String {
	fn from(value: StoreKey) -> Self {
		value.0
	}
}
impl TryFrom<String> for StoreKey {
	type Error = ConfigError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

/// Converts a remaining validity into the whole-second TTL handed to backends (at least 1s).
pub fn ttl_seconds(ttl: Duration) -> u64 {
	u64::try_from(ttl.whole_seconds()).unwrap_or(0).max(1)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_key_rejects_blank_values() {
		assert!(matches!(StoreKey::new(""), Err(ConfigError::InvalidStoreKey)));
		assert!(matches!(StoreKey::new("   "), Err(ConfigError::InvalidStoreKey)));
		assert_eq!(StoreKey::default().as_str(), "access_token");

		let decoded: Result<StoreKey, _> = serde_json::from_str("\"\"");

		assert!(decoded.is_err());
	}

	#[test]
	fn ttl_is_whole_seconds_with_a_floor() {
		assert_eq!(ttl_seconds(Duration::seconds(3600)), 3600);
		assert_eq!(ttl_seconds(Duration::milliseconds(3_599_900)), 3599);
		assert_eq!(ttl_seconds(Duration::milliseconds(200)), 1);
		assert_eq!(ttl_seconds(Duration::seconds(-5)), 1);
	}
}
