//! Authorization middleware attaching the shared bearer credential to every protected request.
//!
//! Handlers receive an [`UpstreamAuth`] through request extensions and never see
//! the cache. When no valid credential can be produced the handler is skipped and
//! the caller gets `503` with a stable `code` so it can tell this apart from
//! relayed upstream errors.

// crates.io
use axum::{
	Json,
	extract::{Request, State},
	http::{
		HeaderMap, HeaderValue, StatusCode,
		header::{ACCEPT, AUTHORIZATION},
	},
	middleware::Next,
	response::{IntoResponse, Response},
};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::{AcquisitionError, ProviderError},
	server::AppState,
};

/// Error code returned when upstream authorization is unavailable.
pub const UNAVAILABLE_CODE: &str = "upstream_authorization_unavailable";

/// Outbound-call configuration derived from the current credential.
#[derive(Clone, Debug)]
pub struct UpstreamAuth {
	headers: HeaderMap,
}
impl UpstreamAuth {
	/// Builds the outbound headers; the `Authorization` value is marked sensitive.
	pub fn from_credential(credential: &Credential) -> Result<Self, ProviderError> {
		let mut authorization = HeaderValue::from_str(&credential.authorization_value())
			.map_err(|_| ProviderError::InvalidResponse {
				reason: "access token is not a valid header value".into(),
			})?;

		authorization.set_sensitive(true);

		let mut headers = HeaderMap::with_capacity(2);

		headers.insert(AUTHORIZATION, authorization);
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		Ok(Self { headers })
	}

	/// Headers to attach to the upstream call.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}
}

/// Obtains a valid credential before the handler runs.
pub async fn authorize(
	State(state): State<AppState>,
	mut request: Request,
	next: Next,
) -> Response {
	let auth = match state.cache().get_valid_credential().await {
		Ok(credential) =>
			UpstreamAuth::from_credential(&credential).map_err(AcquisitionError::from),
		Err(e) => Err(e),
	};

	match auth {
		Ok(auth) => {
			request.extensions_mut().insert(auth);

			next.run(request).await
		},
		Err(e) => {
			tracing::warn!(
				method = %request.method(),
				path = request.uri().path(),
				kind = e.kind(),
				"rejecting request without upstream authorization"
			);

			e.into_response()
		},
	}
}

impl IntoResponse for AcquisitionError {
	fn into_response(self) -> Response {
		let body = serde_json::json!({ "code": UNAVAILABLE_CODE, "message": self.to_string() });

		(StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
	}
}
