//! Observability helpers for credential operations.
//!
//! - Every cache operation runs inside a `zoom_gateway.credential` span carrying
//!   `operation` and `stage` fields.
//! - Enable the `metrics` feature to increment the `zoom_gateway_credential_total`
//!   counter for each attempt/hit/success/failure, labeled by `operation` + `outcome`.

mod counter;
mod span;

pub use counter::*;
pub use span::*;

// crates.io
use tracing_subscriber::{EnvFilter, fmt};
// self
use crate::_prelude::*;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "zoom_gateway=info,tower_http=info";

/// Credential operations observed by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Cache lookup that may fall through to acquisition.
	Lookup,
	/// Single-flight acquisition from the provider.
	Acquire,
	/// Removal of the cached entry.
	Invalidate,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Lookup => "lookup",
			Operation::Acquire => "acquire",
			Operation::Invalidate => "invalidate",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an operation.
	Attempt,
	/// Served from the store without contacting the provider.
	Hit,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Hit => "hit",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Installs the global `fmt` subscriber filtered by `RUST_LOG` (or [`DEFAULT_LOG_FILTER`]).
///
/// Returns `false` when a subscriber was already installed.
pub fn init_subscriber() -> bool {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

	fmt().with_env_filter(filter).with_target(true).try_init().is_ok()
}
