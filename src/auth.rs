//! Credential model shared by the cache, the stores, and the provider adapters.

pub mod credential;
pub mod secret;

pub use credential::*;
pub use secret::*;
