//! Shared reqwest transport for the token endpoint and the upstream API.
//!
//! Token requests must not follow redirects: token endpoints answer directly, and
//! a redirect would forward client credentials to another origin. Every client
//! built here carries a request timeout so a hung upstream cannot stall callers.

// std
use std::ops::Deref;
// crates.io
use reqwest::{
	header::{HeaderMap, RETRY_AFTER},
	redirect::Policy,
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::ConfigError};

/// Metadata captured from an upstream response for error reporting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code returned upstream.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}
impl ResponseMetadata {
	/// Captures the status and Retry-After hint of a response.
	pub fn from_response(response: &reqwest::Response) -> Self {
		Self {
			status: Some(response.status().as_u16()),
			retry_after: parse_retry_after(response.headers()),
		}
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Timeout applied by [`ReqwestHttpClient::default`].
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

	/// Wraps an existing reqwest [`ReqwestClient`]. Configure it to not follow redirects.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with redirects disabled and the provided request timeout.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(Policy::none())
			.timeout(timeout)
			.build()
			.map_err(ConfigError::from)?;

		Ok(Self(client))
	}
}
impl Default for ReqwestHttpClient {
	fn default() -> Self {
		Self::with_timeout(Self::DEFAULT_TIMEOUT)
			.unwrap_or_else(|_| Self(ReqwestClient::new()))
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Parses a `Retry-After` header given either as delta-seconds or an HTTP date.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	#[test]
	fn retry_after_accepts_delta_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("120"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(120)));
	}

	#[test]
	fn retry_after_ignores_past_dates_and_garbage() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));

		assert_eq!(parse_retry_after(&headers), None);

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
	}
}
