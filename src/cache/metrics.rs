// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing how credential lookups were served.
#[derive(Debug, Default)]
pub struct CacheMetrics {
	hits: AtomicU64,
	misses: AtomicU64,
	acquisitions: AtomicU64,
	failures: AtomicU64,
	store_errors: AtomicU64,
}
impl CacheMetrics {
	/// Lookups answered from the store.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Lookups that found nothing usable in the store.
	pub fn misses(&self) -> u64 {
		self.misses.load(Ordering::Relaxed)
	}

	/// Provider exchanges started (one per single-flight leader).
	pub fn acquisitions(&self) -> u64 {
		self.acquisitions.load(Ordering::Relaxed)
	}

	/// Provider exchanges that failed or timed out.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Store reads or writes that failed and were tolerated.
	pub fn store_errors(&self) -> u64 {
		self.store_errors.load(Ordering::Relaxed)
	}

	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_miss(&self) {
		self.misses.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_acquisition(&self) {
		self.acquisitions.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_store_error(&self) {
		self.store_errors.fetch_add(1, Ordering::Relaxed);
	}
}
