//! Shutdown handling: drop the cached credential, drain connections, release the store.

// crates.io
use axum::Router;
use tokio::net::TcpListener;
// self
use crate::{_prelude::*, cache::CredentialCache};

/// Owns the teardown steps run when the process stops.
#[derive(Clone, Debug)]
pub struct Lifecycle {
	cache: Arc<CredentialCache>,
}
impl Lifecycle {
	/// Creates a lifecycle manager over the cache whose entry and store it tears down.
	pub fn new(cache: Arc<CredentialCache>) -> Self {
		Self { cache }
	}

	/// Deletes the cached credential. Failures are logged, never propagated.
	pub async fn invalidate(&self) -> bool {
		match self.cache.invalidate().await {
			Ok(removed) => {
				tracing::info!(key = %self.cache.key(), removed, "cached credential invalidated");

				removed
			},
			Err(e) => {
				tracing::warn!(
					key = %self.cache.key(),
					error = %e,
					"failed to invalidate the cached credential"
				);

				false
			},
		}
	}

	/// Closes the store connection. Failures are logged, never propagated.
	pub async fn release(&self) {
		match self.cache.close_store().await {
			Ok(()) => tracing::info!("credential store released"),
			Err(e) => tracing::warn!(error = %e, "failed to release the credential store"),
		}
	}
}

/// Resolves on SIGINT (ctrl-c) or, on unix, SIGTERM.
pub async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "failed to listen for ctrl-c");
			std::future::pending::<()>().await;
		}
	};
	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			},
			Err(e) => {
				tracing::error!(error = %e, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			},
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => tracing::info!("received SIGINT"),
		_ = terminate => tracing::info!("received SIGTERM"),
	}
}

/// Serves `router` until `signal` resolves.
///
/// On signal the listener stops accepting and the cached credential is deleted.
/// A request still acquiring during the drain may save a fresh entry, so the
/// entry is deleted again once serving ends, right before the store is released.
pub async fn serve<S>(
	listener: TcpListener,
	router: Router,
	lifecycle: Lifecycle,
	signal: S,
) -> Result<()>
where
	S: 'static + Send + Future<Output = ()>,
{
	let on_signal = {
		let lifecycle = lifecycle.clone();

		async move {
			signal.await;
			tracing::info!("shutting down: no longer accepting connections");
			lifecycle.invalidate().await;
		}
	};
	let served = axum::serve(listener, router).with_graceful_shutdown(on_signal).await;

	tracing::info!("HTTP server closed");
	lifecycle.invalidate().await;
	lifecycle.release().await;

	Ok(served?)
}
