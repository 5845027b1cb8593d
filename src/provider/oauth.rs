//! Token endpoint adapter performing one OAuth-style exchange per acquisition.

// crates.io
use reqwest::{
	StatusCode,
	header::{ACCEPT, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenKind, TokenSecret},
	error::{ConfigError, ProviderError},
	http::{ReqwestHttpClient, ResponseMetadata},
	provider::{ClientAuthMethod, CredentialProvider, ProviderDescriptor, ProviderFuture},
};

const BODY_PREVIEW_LIMIT: usize = 256;

/// [`CredentialProvider`] that calls the descriptor's token endpoint with a fixed client identity.
#[derive(Clone)]
pub struct OAuthProvider {
	descriptor: ProviderDescriptor,
	client_id: String,
	client_secret: TokenSecret,
	http_client: ReqwestHttpClient,
	timeout: StdDuration,
}
impl OAuthProvider {
	/// Creates a provider using a redirect-free client bounded by
	/// [`ReqwestHttpClient::DEFAULT_TIMEOUT`].
	pub fn new(
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, ConfigError> {
		let timeout = ReqwestHttpClient::DEFAULT_TIMEOUT;

		Ok(Self {
			descriptor,
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
			http_client: ReqwestHttpClient::with_timeout(timeout)?,
			timeout,
		})
	}

	/// Rebuilds the transport with a different request timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Result<Self, ConfigError> {
		self.http_client = ReqwestHttpClient::with_timeout(timeout)?;
		self.timeout = timeout;

		Ok(self)
	}

	/// Returns the descriptor driving the exchange.
	pub fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	async fn exchange(&self) -> Result<Credential, ProviderError> {
		let issued_at = OffsetDateTime::now_utc();
		let mut form = self.descriptor.grant.form_params();
		let mut request = self
			.http_client
			.post(self.descriptor.token_endpoint.clone())
			.header(ACCEPT, HeaderValue::from_static("application/json"));

		match self.descriptor.client_auth_method {
			ClientAuthMethod::ClientSecretBasic => {
				request = request.basic_auth(&self.client_id, Some(self.client_secret.expose()));
			},
			ClientAuthMethod::ClientSecretPost => {
				form.push(("client_id", self.client_id.clone()));
				form.push(("client_secret", self.client_secret.expose().to_owned()));
			},
		}

		let response = request.form(&form).send().await.map_err(|e| self.map_reqwest_error(e))?;
		let meta = ResponseMetadata::from_response(&response);
		let status = response.status();
		let body = response.bytes().await.map_err(|e| self.map_reqwest_error(e))?;

		if !status.is_success() {
			return Err(rejected(status, meta, &body));
		}

		let payload: TokenResponse =
			serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_slice(&body))
				.map_err(|source| ProviderError::Malformed { source, status: status.as_u16() })?;
		let credential = payload.into_credential(issued_at)?;

		tracing::debug!(
			target: "zoom_gateway::provider",
			grant = %self.descriptor.grant,
			expires_at = %credential.expires_at,
			"token endpoint issued a credential"
		);

		Ok(credential)
	}

	fn map_reqwest_error(&self, err: ReqwestError) -> ProviderError {
		if err.is_timeout() {
			return ProviderError::Timeout {
				after: Duration::try_from(self.timeout).unwrap_or(Duration::MAX),
			};
		}

		ProviderError::transport(err)
	}
}
impl CredentialProvider for OAuthProvider {
	fn acquire(&self) -> ProviderFuture<'_, Credential> {
		Box::pin(self.exchange())
	}
}
impl Debug for OAuthProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthProvider")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_blank())
			.field("timeout", &self.timeout)
			.finish()
	}
}

#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
	token_type: String,
	expires_in: i64,
	#[serde(default)]
	scope: Option<String>,
}
impl TokenResponse {
	fn into_credential(self, issued_at: OffsetDateTime) -> Result<Credential, ProviderError> {
		let kind = TokenKind::parse(&self.token_type).ok_or_else(|| {
			ProviderError::InvalidResponse {
				reason: format!("unsupported token type `{}`", self.token_type),
			}
		})?;
		let mut builder = Credential::builder()
			.access_token(self.access_token)
			.token_kind(kind)
			.issued_at(issued_at)
			.expires_in(Duration::seconds(self.expires_in));

		if let Some(scope) = self.scope.filter(|value| !value.is_empty()) {
			builder = builder.scope(scope);
		}

		Ok(builder.build()?)
	}
}

#[derive(Default, Deserialize)]
struct ErrorResponse {
	error: Option<String>,
	error_description: Option<String>,
	reason: Option<String>,
}
impl ErrorResponse {
	fn message(self) -> Option<String> {
		self.error_description.or(self.reason).or(self.error).filter(|value| !value.is_empty())
	}
}

fn rejected(status: StatusCode, meta: ResponseMetadata, body: &[u8]) -> ProviderError {
	let message = serde_json::from_slice::<ErrorResponse>(body)
		.ok()
		.and_then(ErrorResponse::message)
		.or_else(|| body_preview(body))
		.unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_owned());

	ProviderError::Rejected { status: status.as_u16(), message, retry_after: meta.retry_after }
}

fn body_preview(body: &[u8]) -> Option<String> {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return None;
	}

	Some(trimmed.chars().take(BODY_PREVIEW_LIMIT).collect())
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn token_response_computes_absolute_expiry() {
		let payload: TokenResponse = serde_json::from_str(
			"{\"access_token\":\"T1\",\"token_type\":\"bearer\",\"expires_in\":3600,\"scope\":\"meeting:read\"}",
		)
		.expect("Token response fixture should parse.");
		let credential = payload
			.into_credential(macros::datetime!(2025-01-01 00:00 UTC))
			.expect("Token response should convert into a credential.");

		assert_eq!(credential.expires_at, macros::datetime!(2025-01-01 01:00 UTC));
		assert_eq!(credential.scope.as_deref(), Some("meeting:read"));
	}

	#[test]
	fn token_response_rejects_unusable_payloads() {
		let wrong_kind = TokenResponse {
			access_token: "T1".into(),
			token_type: "mac".into(),
			expires_in: 3600,
			scope: None,
		};
		let no_lifetime = TokenResponse {
			access_token: "T1".into(),
			token_type: "bearer".into(),
			expires_in: 0,
			scope: None,
		};
		let now = OffsetDateTime::now_utc();

		assert!(matches!(
			wrong_kind.into_credential(now),
			Err(ProviderError::InvalidResponse { .. })
		));
		assert!(matches!(
			no_lifetime.into_credential(now),
			Err(ProviderError::InvalidResponse { .. })
		));
	}

	#[test]
	fn rejection_message_prefers_oauth_fields() {
		let meta = ResponseMetadata::default();
		let err = rejected(
			StatusCode::UNAUTHORIZED,
			meta.clone(),
			b"{\"reason\":\"Invalid client_id or client_secret\",\"error\":\"invalid_client\"}",
		);

		assert!(matches!(
			err,
			ProviderError::Rejected { status: 401, ref message, .. }
				if message == "Invalid client_id or client_secret"
		));

		let err = rejected(StatusCode::BAD_GATEWAY, meta, b"");

		assert!(matches!(
			err,
			ProviderError::Rejected { status: 502, ref message, .. } if message == "Bad Gateway"
		));
	}

	#[test]
	fn debug_output_hides_the_client_secret() {
		let descriptor = ProviderDescriptor::zoom("acct").expect("Zoom preset should build.");
		let provider = OAuthProvider::new(descriptor, "client", "very-secret")
			.expect("Provider should build with the default transport.");

		assert!(!format!("{provider:?}").contains("very-secret"));
	}
}
