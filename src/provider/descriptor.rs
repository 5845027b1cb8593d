//! Provider descriptor data structures and their validating builder.

// self
use crate::_prelude::*;

/// Token endpoint used by Zoom's Server-to-Server OAuth apps.
pub const ZOOM_TOKEN_ENDPOINT: &str = "https://zoom.us/oauth/token";

/// Grant requested from the token endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "grant_type")]
pub enum GrantType {
	/// Zoom Server-to-Server OAuth grant scoped to one account.
	AccountCredentials {
		/// Account the app is installed on.
		account_id: String,
	},
	/// RFC 6749 client credentials grant.
	ClientCredentials,
}
impl GrantType {
	/// Returns the `grant_type` form value.
	pub fn as_str(&self) -> &'static str {
		match self {
			GrantType::AccountCredentials { .. } => "account_credentials",
			GrantType::ClientCredentials => "client_credentials",
		}
	}

	/// Form parameters identifying the grant.
	pub fn form_params(&self) -> Vec<(&'static str, String)> {
		let mut params = vec![("grant_type", self.as_str().to_owned())];

		if let GrantType::AccountCredentials { account_id } = self {
			params.push(("account_id", account_id.clone()));
		}

		params
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How the client proves its identity to the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Grant is mandatory.
	#[error("Missing grant type.")]
	MissingGrant,
	/// Account credentials need the account identifier.
	#[error("The account_credentials grant requires a non-empty account id.")]
	MissingAccountId,
	/// Endpoints must use HTTPS unless they target the local machine.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
}

/// Immutable description of the upstream authorization endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Token endpoint receiving the exchange.
	pub token_endpoint: Url,
	/// Grant requested on every exchange.
	pub grant: GrantType,
	/// Client authentication mechanism.
	pub client_auth_method: ClientAuthMethod,
}
impl ProviderDescriptor {
	/// Creates a new builder.
	pub fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::default()
	}

	/// Descriptor for Zoom Server-to-Server OAuth against the public token endpoint.
	pub fn zoom(account_id: impl Into<String>) -> Result<Self, ProviderDescriptorError> {
		let token_endpoint = Url::parse(ZOOM_TOKEN_ENDPOINT).map_err(|_| {
			ProviderDescriptorError::InsecureEndpoint {
				endpoint: "token",
				url: ZOOM_TOKEN_ENDPOINT.into(),
			}
		})?;

		Self::builder()
			.token_endpoint(token_endpoint)
			.grant(GrantType::AccountCredentials { account_id: account_id.into() })
			.build()
	}

	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		if matches!(
			&self.grant,
			GrantType::AccountCredentials { account_id } if account_id.trim().is_empty()
		) {
			return Err(ProviderDescriptorError::MissingAccountId);
		}

		validate_endpoint("token", &self.token_endpoint)
	}
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug, Default)]
pub struct ProviderDescriptorBuilder {
	token_endpoint: Option<Url>,
	grant: Option<GrantType>,
	client_auth_method: ClientAuthMethod,
}
impl ProviderDescriptorBuilder {
	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the grant requested on every exchange.
	pub fn grant(mut self, grant: GrantType) -> Self {
		self.grant = Some(grant);

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let token_endpoint =
			self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let grant = self.grant.ok_or(ProviderDescriptorError::MissingGrant)?;
		let descriptor =
			ProviderDescriptor { token_endpoint, grant, client_auth_method: self.client_auth_method };

		descriptor.validate()?;

		Ok(descriptor)
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	if url.scheme() == "https" || (url.scheme() == "http" && loopback) {
		Ok(())
	} else {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse descriptor fixture URL.")
	}

	#[test]
	fn zoom_preset_uses_account_credentials() {
		let descriptor = ProviderDescriptor::zoom("acct-1").expect("Zoom preset should build.");

		assert_eq!(descriptor.token_endpoint.as_str(), ZOOM_TOKEN_ENDPOINT);
		assert_eq!(descriptor.client_auth_method, ClientAuthMethod::ClientSecretBasic);
		assert_eq!(
			descriptor.grant.form_params(),
			vec![("grant_type", "account_credentials".into()), ("account_id", "acct-1".into())]
		);
	}

	#[test]
	fn builder_rejects_insecure_and_incomplete_descriptors() {
		let err = ProviderDescriptor::builder()
			.token_endpoint(url("http://example.com/token"))
			.grant(GrantType::ClientCredentials)
			.build()
			.expect_err("Plain HTTP endpoints on remote hosts should be rejected.");

		assert!(matches!(err, ProviderDescriptorError::InsecureEndpoint { endpoint: "token", .. }));
		assert_eq!(
			ProviderDescriptor::builder().grant(GrantType::ClientCredentials).build(),
			Err(ProviderDescriptorError::MissingTokenEndpoint)
		);
		assert_eq!(
			ProviderDescriptor::zoom("  "),
			Err(ProviderDescriptorError::MissingAccountId)
		);
	}

	#[test]
	fn loopback_http_endpoints_are_allowed() {
		let descriptor = ProviderDescriptor::builder()
			.token_endpoint(url("http://127.0.0.1:8080/oauth/token"))
			.grant(GrantType::ClientCredentials)
			.client_auth_method(ClientAuthMethod::ClientSecretPost)
			.build()
			.expect("Loopback endpoints should be accepted for local testing.");

		assert_eq!(descriptor.grant.form_params(), vec![("grant_type", "client_credentials".into())]);
	}
}
