//! Credential providers: descriptors (data) and the token endpoint adapter (behavior).
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering the token
//! endpoint, the grant to request, and how the client proves its identity.
//! `oauth` implements [`CredentialProvider`] over reqwest for OAuth-style token
//! endpoints such as Zoom's Server-to-Server OAuth.

pub mod descriptor;
pub mod oauth;

pub use descriptor::*;
pub use oauth::*;

// self
use crate::{_prelude::*, auth::Credential, error::ProviderError};

/// Boxed future returned by [`CredentialProvider::acquire`].
pub type ProviderFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, ProviderError>> + 'a + Send>>;

/// Issues fresh credentials from the upstream authorization endpoint.
///
/// Implementations perform exactly one exchange per call and never retry; retry
/// policy belongs to the caller.
pub trait CredentialProvider
where
	Self: Send + Sync,
{
	/// Performs one authorization exchange and returns the resulting credential.
	fn acquire(&self) -> ProviderFuture<'_, Credential>;
}
