//! Process configuration read from flags or environment variables (`.env` supported).

// crates.io
use clap::{Parser, ValueEnum};
// self
use crate::{
	_prelude::*,
	cache::CachePolicy,
	error::ConfigError,
	provider::{GrantType, ProviderDescriptor, ZOOM_TOKEN_ENDPOINT},
	relay::ZOOM_API_BASE_URL,
	store::StoreKey,
};

/// Backend holding the shared credential.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
	/// Redis server shared by every gateway process.
	#[default]
	Redis,
	/// Process-local map, for development and tests.
	Memory,
}

/// Gateway settings.
#[derive(Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
	/// Port the HTTP listener binds to on all interfaces.
	#[arg(long, env, default_value_t = 8080)]
	pub port: u16,

	/// Zoom account the Server-to-Server OAuth app is installed on.
	#[arg(long, env)]
	pub zoom_account_id: String,

	/// OAuth client identifier.
	#[arg(long, env)]
	pub zoom_client_id: String,

	/// OAuth client secret.
	#[arg(long, env, hide_env_values = true)]
	zoom_client_secret: String,

	/// Token endpoint receiving the account_credentials exchange.
	#[arg(long, env, default_value = ZOOM_TOKEN_ENDPOINT)]
	pub zoom_token_url: Url,

	/// Base URL of the upstream REST API.
	#[arg(long, env, default_value = ZOOM_API_BASE_URL)]
	pub zoom_api_base_url: Url,

	/// Credential store backend.
	#[arg(long, env, value_enum, default_value_t = StoreBackend::Redis)]
	pub credential_store: StoreBackend,

	/// Redis connection URL, used by the `redis` backend.
	#[arg(long, env, default_value = "redis://redis:6379")]
	pub redis_url: String,

	/// Key under which the credential is cached.
	#[arg(long, env, default_value = "access_token")]
	pub credential_key: String,

	/// Seconds before expiry at which a cached credential is treated as expired.
	#[arg(long, env, default_value_t = 60)]
	pub credential_refresh_margin_secs: u64,

	/// Upper bound in seconds for one token endpoint exchange.
	#[arg(long, env, default_value_t = 10)]
	pub credential_acquire_timeout_secs: u64,

	/// Request timeout in seconds for relayed upstream calls.
	#[arg(long, env, default_value_t = 30)]
	pub upstream_timeout_secs: u64,
}
impl Config {
	/// Loads `.env` (if present), then parses flags and environment variables.
	pub fn load() -> Self {
		dotenvy::dotenv().ok();

		Self::parse()
	}

	/// Client secret used for the token exchange.
	pub fn client_secret(&self) -> &str {
		&self.zoom_client_secret
	}

	/// Validated descriptor for the configured token endpoint and account.
	pub fn provider_descriptor(&self) -> Result<ProviderDescriptor, ConfigError> {
		let descriptor = ProviderDescriptor::builder()
			.token_endpoint(self.zoom_token_url.clone())
			.grant(GrantType::AccountCredentials { account_id: self.zoom_account_id.clone() })
			.build()?;

		Ok(descriptor)
	}

	/// Validated store key.
	pub fn store_key(&self) -> Result<StoreKey, ConfigError> {
		StoreKey::new(self.credential_key.as_str())
	}

	/// Freshness and timeout policy for the credential cache.
	pub fn cache_policy(&self) -> CachePolicy {
		CachePolicy::default()
			.with_refresh_margin(seconds(self.credential_refresh_margin_secs))
			.with_acquire_timeout(seconds(self.credential_acquire_timeout_secs))
	}

	/// Acquisition bound as a std duration, for the token endpoint transport.
	pub fn acquire_timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.credential_acquire_timeout_secs.max(1))
	}

	/// Request timeout for relayed upstream calls.
	pub fn upstream_timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.upstream_timeout_secs.max(1))
	}
}
impl Debug for Config {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Config")
			.field("port", &self.port)
			.field("zoom_account_id", &self.zoom_account_id)
			.field("zoom_client_id", &self.zoom_client_id)
			.field("zoom_client_secret", &"<redacted>")
			.field("zoom_token_url", &self.zoom_token_url.as_str())
			.field("zoom_api_base_url", &self.zoom_api_base_url.as_str())
			.field("credential_store", &self.credential_store)
			.field("redis_url", &self.redis_url)
			.field("credential_key", &self.credential_key)
			.field("credential_refresh_margin_secs", &self.credential_refresh_margin_secs)
			.field("credential_acquire_timeout_secs", &self.credential_acquire_timeout_secs)
			.field("upstream_timeout_secs", &self.upstream_timeout_secs)
			.finish()
	}
}

fn seconds(value: u64) -> Duration {
	Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn parse(extra: &[&str]) -> Config {
		let base = [
			"zoom-gateway",
			"--zoom-account-id",
			"acct",
			"--zoom-client-id",
			"client",
			"--zoom-client-secret",
			"s3cr3t",
		];

		Config::try_parse_from(base.iter().chain(extra)).expect("Flags should parse.")
	}

	#[test]
	fn defaults_follow_the_documented_values() {
		let config = parse(&[]);

		assert_eq!(config.port, 8080);
		assert_eq!(config.zoom_token_url.as_str(), ZOOM_TOKEN_ENDPOINT);
		assert_eq!(config.zoom_api_base_url.as_str(), ZOOM_API_BASE_URL);
		assert_eq!(config.credential_store, StoreBackend::Redis);
		assert_eq!(config.redis_url, "redis://redis:6379");
		assert_eq!(
			config.store_key().expect("Default key should be valid.").as_str(),
			"access_token"
		);
		assert_eq!(config.cache_policy(), CachePolicy::default());
		assert_eq!(config.upstream_timeout(), StdDuration::from_secs(30));
	}

	#[test]
	fn debug_output_redacts_the_client_secret() {
		let rendered = format!("{:?}", parse(&[]));

		assert!(!rendered.contains("s3cr3t"));
		assert!(rendered.contains("<redacted>"));
	}

	#[test]
	fn descriptor_uses_account_credentials_grant() {
		let config = parse(&["--credential-store", "memory"]);
		let descriptor = config.provider_descriptor().expect("Descriptor should validate.");

		assert_eq!(config.credential_store, StoreBackend::Memory);
		assert_eq!(descriptor.grant, GrantType::AccountCredentials { account_id: "acct".into() });
	}

	#[test]
	fn blank_account_id_is_rejected() {
		let config = Config::try_parse_from([
			"zoom-gateway",
			"--zoom-account-id",
			" ",
			"--zoom-client-id",
			"client",
			"--zoom-client-secret",
			"s",
		])
		.expect("Flags should parse.");

		assert!(matches!(config.provider_descriptor(), Err(ConfigError::InvalidDescriptor(_))));
	}
}
