//! Gateway-level error types shared by the cache, providers, stores, and relay.

// self
use crate::{
	_prelude::*,
	auth::CredentialBuilderError,
	provider::ProviderDescriptorError,
	relay::RelayError,
	store::StoreError,
};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Upstream authorization exchange failed.
	#[error(transparent)]
	Provider(#[from] ProviderError),
	/// No valid credential could be produced for the current request cycle.
	#[error(transparent)]
	Acquisition(#[from] AcquisitionError),
	/// Upstream API call failed.
	#[error(transparent)]
	Relay(#[from] RelayError),
	/// Listener or socket failure.
	#[error("I/O error: {0}.")]
	Io(#[from] std::io::Error),
}

/// Configuration and validation failures raised while wiring the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	InvalidDescriptor(#[from] ProviderDescriptorError),
	/// A configured URL cannot be parsed.
	#[error("The {field} URL is invalid.")]
	InvalidUrl {
		/// Which setting carried the URL.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Credential store key is empty.
	#[error("Credential store key must not be empty.")]
	InvalidStoreKey,
	/// The selected credential store backend is not compiled into this build.
	#[error("Credential store backend `{0}` is not enabled in this build.")]
	StoreBackendUnavailable(&'static str),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures of the upstream authorization exchange. Never retried by the gateway itself.
#[derive(Debug, ThisError)]
pub enum ProviderError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The exchange did not complete within the configured bound.
	#[error("Token endpoint did not answer within {after}.")]
	Timeout {
		/// Bound that elapsed.
		after: Duration,
	},
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint rejected the request with status {status}: {message}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Provider-supplied message summarizing the failure.
		message: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	Malformed {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// Token endpoint responded with a well-formed but unusable payload.
	#[error("Token endpoint returned an unusable credential: {reason}.")]
	InvalidResponse {
		/// Why the payload was refused.
		reason: String,
	},
}
impl ProviderError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Stable label for logs and metrics.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Transport { .. } => "transport",
			Self::Timeout { .. } => "timeout",
			Self::Rejected { .. } => "rejected",
			Self::Malformed { .. } => "malformed",
			Self::InvalidResponse { .. } => "invalid_response",
		}
	}
}
impl From<CredentialBuilderError> for ProviderError {
	fn from(e: CredentialBuilderError) -> Self {
		Self::InvalidResponse { reason: e.to_string() }
	}
}

/// No valid credential could be produced; shared verbatim by every waiter of one acquisition.
#[derive(Clone, Debug, ThisError)]
#[error("Upstream authorization is unavailable.")]
pub struct AcquisitionError {
	#[source]
	source: Arc<ProviderError>,
}
impl AcquisitionError {
	/// Returns the provider failure that caused the acquisition to fail.
	pub fn provider_error(&self) -> &ProviderError {
		&self.source
	}

	/// Stable label of the underlying provider failure.
	pub fn kind(&self) -> &'static str {
		self.source.kind()
	}

	/// Returns `true` when both errors originate from the same acquisition attempt.
	pub fn same_attempt(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.source, &other.source)
	}
}
impl From<ProviderError> for AcquisitionError {
	fn from(e: ProviderError) -> Self {
		Self { source: Arc::new(e) }
	}
}
