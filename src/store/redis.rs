//! Redis-backed [`CredentialStore`] shared by every gateway process pointed at the same server.

// crates.io
use redis::{AsyncCommands, Client, RedisError, aio::ConnectionManager};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{self, CredentialStore, StoreError, StoreFuture, StoreKey},
};

/// Stores the credential as a JSON string under `SET key value EX ttl`.
pub struct RedisStore {
	connection: Mutex<Option<ConnectionManager>>,
	namespace: Option<Arc<str>>,
}
impl RedisStore {
	/// Connects to the server at `url` (e.g. `redis://redis:6379`).
	pub async fn connect(url: &str) -> Result<Self, StoreError> {
		let client = Client::open(url).map_err(backend_error)?;
		let manager = ConnectionManager::new(client).await.map_err(backend_error)?;

		tracing::info!(target: "zoom_gateway::store", "connected to redis credential store");

		Ok(Self::with_connection(manager))
	}

	/// Wraps an existing connection manager.
	pub fn with_connection(manager: ConnectionManager) -> Self {
		Self { connection: Mutex::new(Some(manager)), namespace: None }
	}

	/// Prefixes every key with `namespace:` so several deployments can share one server.
	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Some(Arc::from(namespace.into()));

		self
	}

	fn connection(&self) -> Result<ConnectionManager, StoreError> {
		self.connection.lock().clone().ok_or(StoreError::Closed)
	}

	fn redis_key(&self, key: &StoreKey) -> String {
		namespaced(self.namespace.as_deref(), key)
	}
}
impl CredentialStore for RedisStore {
	fn fetch<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<Credential>> {
		Box::pin(async move {
			let mut conn = self.connection()?;
			let value: Option<String> = conn.get(self.redis_key(key)).await.map_err(backend_error)?;

			value
				.map(|json| {
					serde_json::from_str(&json).map_err(|e| StoreError::Serialization {
						message: format!("Failed to decode cached credential: {e}"),
					})
				})
				.transpose()
		})
	}

	fn save<'a>(
		&'a self,
		key: &'a StoreKey,
		credential: Credential,
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut conn = self.connection()?;
			let payload = serde_json::to_string(&credential).map_err(|e| {
				StoreError::Serialization { message: format!("Failed to encode credential: {e}") }
			})?;

			conn.set_ex::<_, _, ()>(self.redis_key(key), payload, store::ttl_seconds(ttl))
				.await
				.map_err(backend_error)
		})
	}

	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			let mut conn = self.connection()?;
			let removed: usize = conn.del(self.redis_key(key)).await.map_err(backend_error)?;

			Ok(removed > 0)
		})
	}

	fn close(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			if self.connection.lock().take().is_some() {
				tracing::info!(target: "zoom_gateway::store", "released redis credential store");
			}

			Ok(())
		})
	}
}
impl Debug for RedisStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RedisStore")
			.field("connected", &self.connection.lock().is_some())
			.field("namespace", &self.namespace)
			.finish()
	}
}

fn namespaced(namespace: Option<&str>, key: &StoreKey) -> String {
	match namespace {
		Some(prefix) => format!("{prefix}:{key}"),
		None => key.as_str().to_owned(),
	}
}

fn backend_error(e: RedisError) -> StoreError {
	StoreError::Backend { message: e.to_string() }
}
