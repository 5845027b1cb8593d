//! Bearer credential record, lifecycle helpers, and builder.

// self
use crate::{_prelude::*, auth::secret::TokenSecret};

/// Lifecycle status for a credential at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
	/// Expiry is strictly after the evaluated instant.
	Active,
	/// Expiry is at or before the evaluated instant.
	Expired,
}

/// Token kinds the gateway knows how to attach to upstream calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
	#[default]
	/// RFC 6750 bearer token.
	Bearer,
}
impl TokenKind {
	/// Returns the authorization scheme used in the `Authorization` header.
	pub const fn scheme(self) -> &'static str {
		match self {
			TokenKind::Bearer => "Bearer",
		}
	}

	/// Parses the provider's `token_type` field (case-insensitive).
	pub fn parse(raw: &str) -> Option<Self> {
		raw.trim().eq_ignore_ascii_case("bearer").then_some(TokenKind::Bearer)
	}
}
impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.scheme())
	}
}

/// Errors produced by [`CredentialBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CredentialBuilderError {
	/// Issued when no (or a blank) access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Issued when the expiry does not fall after the issue instant.
	#[error("Credential lifetime must be positive.")]
	NonPositiveLifetime,
	/// Issued when the lifetime pushes the expiry past the representable range.
	#[error("Credential lifetime is out of range.")]
	LifetimeOutOfRange,
}

/// The single bearer credential used to authorize upstream API calls.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Token kind, always [`TokenKind::Bearer`] for this gateway.
	pub token_kind: TokenKind,
	/// Scope string reported by the provider, if any.
	pub scope: Option<String>,
	/// Issued-at instant recorded when the provider answered.
	#[serde(with = "time::serde::rfc3339")]
	pub issued_at: OffsetDateTime,
	/// Absolute expiry derived from issued_at plus the provider-reported lifetime.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Returns a builder for constructing credentials.
	pub fn builder() -> CredentialBuilder {
		CredentialBuilder::default()
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> CredentialStatus {
		if instant >= self.expires_at {
			return CredentialStatus::Expired;
		}

		CredentialStatus::Active
	}

	/// Returns `true` if the credential has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), CredentialStatus::Expired)
	}

	/// Returns `true` if the credential is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` when the credential stays valid for longer than `margin` after `instant`.
	pub fn is_fresh_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		let margin = if margin.is_negative() { Duration::ZERO } else { margin };

		match self.expires_at.checked_sub(margin) {
			Some(refresh_at) => refresh_at > instant,
			None => false,
		}
	}

	/// Remaining validity at `instant`, clamped to zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}

	/// Formats the `Authorization` header value (`Bearer <token>`).
	pub fn authorization_value(&self) -> String {
		format!("{} {}", self.token_kind.scheme(), self.access_token.expose())
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("token_kind", &self.token_kind)
			.field("scope", &self.scope)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Credential`].
#[derive(Clone, Debug, Default)]
pub struct CredentialBuilder {
	access_token: Option<TokenSecret>,
	token_kind: TokenKind,
	scope: Option<String>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl CredentialBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Overrides the token kind.
	pub fn token_kind(mut self, kind: TokenKind) -> Self {
		self.token_kind = kind;

		self
	}

	/// Records the provider-reported scope string.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the issued-at instant (defaults to now).
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a lifetime relative to the issued-at instant.
	pub fn expires_in(mut self, lifetime: Duration) -> Self {
		self.expires_in = Some(lifetime);

		self
	}

	/// Consumes the builder and produces a [`Credential`].
	pub fn build(self) -> Result<Credential, CredentialBuilderError> {
		let access_token = self
			.access_token
			.filter(|secret| !secret.is_blank())
			.ok_or(CredentialBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) if delta.is_positive() => issued_at
				.checked_add(delta)
				.ok_or(CredentialBuilderError::LifetimeOutOfRange)?,
			(None, Some(_)) => return Err(CredentialBuilderError::NonPositiveLifetime),
			(None, None) => return Err(CredentialBuilderError::MissingExpiry),
		};

		Ok(Credential {
			access_token,
			token_kind: self.token_kind,
			scope: self.scope,
			issued_at,
			expires_at,
		})
	}
}
