//! Application wiring: shared state, the HTTP stack, and process startup.

// crates.io
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
// self
use crate::{
	_prelude::*,
	cache::CredentialCache,
	config::{Config, StoreBackend},
	lifecycle::{self, Lifecycle},
	provider::OAuthProvider,
	relay::UpstreamClient,
	routes,
	store::{CredentialStore, MemoryStore, StoreKey},
};

/// State shared by the middleware and every handler.
#[derive(Clone, Debug)]
pub struct AppState {
	cache: Arc<CredentialCache>,
	upstream: Arc<UpstreamClient>,
}
impl AppState {
	/// Bundles the credential cache and the upstream client.
	pub fn new(cache: Arc<CredentialCache>, upstream: Arc<UpstreamClient>) -> Self {
		Self { cache, upstream }
	}

	/// Credential cache consulted by the authorization middleware.
	pub fn cache(&self) -> &Arc<CredentialCache> {
		&self.cache
	}

	/// Client for relayed upstream calls.
	pub fn upstream(&self) -> &UpstreamClient {
		&self.upstream
	}
}

/// Full HTTP stack: routes, authorization, request tracing, and permissive CORS.
pub fn router(state: AppState) -> Router {
	routes::router(state).layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive())
}

/// Connects the configured credential store backend.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn CredentialStore>> {
	match config.credential_store {
		StoreBackend::Memory => {
			tracing::warn!("using the process-local credential store; the cache is not shared");

			Ok(Arc::new(MemoryStore::default()))
		},
		#[cfg(feature = "redis")]
		StoreBackend::Redis =>
			Ok(Arc::new(crate::store::RedisStore::connect(&config.redis_url).await?)),
		#[cfg(not(feature = "redis"))]
		StoreBackend::Redis =>
			Err(crate::error::ConfigError::StoreBackendUnavailable("redis").into()),
	}
}

/// Runs the gateway until a shutdown signal arrives.
///
/// Everything that can fail without a store is built first. Once the store is
/// connected, its connection is released on every exit path.
pub async fn run(config: Config) -> Result<()> {
	let components = Components::build(&config)?;
	let store = connect_store(&config).await?;

	launch(&config, components, store).await
}

/// Runs the gateway over an already connected `store`, releasing it on every exit path.
pub async fn run_with_store(config: Config, store: Arc<dyn CredentialStore>) -> Result<()> {
	match Components::build(&config) {
		Ok(components) => launch(&config, components, store).await,
		Err(e) => {
			if let Err(close) = store.close().await {
				tracing::warn!(error = %close, "failed to release the credential store");
			}

			Err(e)
		},
	}
}

struct Components {
	provider: OAuthProvider,
	upstream: UpstreamClient,
	key: StoreKey,
}
impl Components {
	fn build(config: &Config) -> Result<Self> {
		let provider = OAuthProvider::new(
			config.provider_descriptor()?,
			&config.zoom_client_id,
			config.client_secret(),
		)?
		.with_timeout(config.acquire_timeout())?;
		let upstream =
			UpstreamClient::new(config.zoom_api_base_url.clone(), config.upstream_timeout())?;
		let key = config.store_key()?;

		Ok(Self { provider, upstream, key })
	}
}

async fn launch(
	config: &Config,
	components: Components,
	store: Arc<dyn CredentialStore>,
) -> Result<()> {
	let Components { provider, upstream, key } = components;
	let cache = Arc::new(
		CredentialCache::new(store, Arc::new(provider))
			.with_key(key)
			.with_policy(config.cache_policy()),
	);
	let lifecycle = Lifecycle::new(cache.clone());
	let listener = match TcpListener::bind(("0.0.0.0", config.port)).await {
		Ok(listener) => listener,
		Err(e) => {
			tracing::error!(port = config.port, error = %e, "failed to bind the HTTP listener");
			lifecycle.release().await;

			return Err(e.into());
		},
	};

	match listener.local_addr() {
		Ok(addr) => tracing::info!(%addr, "listening"),
		Err(e) => tracing::warn!(error = %e, "listening on an unknown address"),
	}

	let app = router(AppState::new(cache, Arc::new(upstream)));

	lifecycle::serve(listener, app, lifecycle, lifecycle::shutdown_signal()).await
}
