//! Bounded in-memory [`ResponseCache`] for tests and long-lived processes.

// crates.io
use moka::{Expiry, future::Cache};
// self
use crate::{
	_prelude::*,
	cache::{CacheFuture, CacheKey, CachedResponse, ResponseCache},
	transport::{ApiRequest, ApiResponse},
};

/// Cache backend that keeps responses in-process.
///
/// Entries expire on their own freshness deadline and the least recently used ones are
/// evicted once `max_capacity` is reached, so a long-lived client never grows without bound.
#[derive(Clone, Debug)]
pub struct MemoryCache(Cache<CacheKey, Arc<CachedResponse>>);
impl MemoryCache {
	/// Entry limit applied by [`MemoryCache::default`].
	pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

	/// Creates a cache holding at most `max_capacity` responses.
	pub fn with_max_capacity(max_capacity: u64) -> Self {
		Self(Cache::builder().max_capacity(max_capacity).expire_after(EntryExpiry).build())
	}

	/// Number of live entries after pending evictions are applied.
	pub async fn entry_count(&self) -> u64 {
		self.0.run_pending_tasks().await;

		self.0.entry_count()
	}

	/// Returns `true` when no live entry remains.
	pub async fn is_empty(&self) -> bool {
		self.entry_count().await == 0
	}
}
impl Default for MemoryCache {
	fn default() -> Self {
		Self::with_max_capacity(Self::DEFAULT_MAX_CAPACITY)
	}
}
impl ResponseCache for MemoryCache {
	fn lookup<'a>(
		&'a self,
		request: &'a ApiRequest,
		max_age: Duration,
	) -> CacheFuture<'a, Option<ApiResponse>> {
		let key = CacheKey::for_request(request);

		Box::pin(async move {
			match self.0.get(&key).await {
				// Too old for this caller but possibly still valid for wider windows.
				Some(entry) if entry.is_fresh_at(OffsetDateTime::now_utc(), max_age) =>
					entry.to_response().map(Some),
				_ => Ok(None),
			}
		})
	}

	fn store<'a>(
		&'a self,
		request: &'a ApiRequest,
		response: &'a ApiResponse,
		max_age: Duration,
	) -> CacheFuture<'a, ()> {
		let key = CacheKey::for_request(request);
		let entry = CachedResponse::capture(response, OffsetDateTime::now_utc(), max_age);

		Box::pin(async move {
			self.0.insert(key, Arc::new(entry)).await;

			Ok(())
		})
	}
}

/// Expires each entry at its own `expires_at`, including when a store replaces it.
struct EntryExpiry;
impl EntryExpiry {
	fn time_to_live(entry: &CachedResponse) -> std::time::Duration {
		std::time::Duration::try_from(entry.expires_at - entry.stored_at).unwrap_or_default()
	}
}
impl Expiry<CacheKey, Arc<CachedResponse>> for EntryExpiry {
	fn expire_after_create(
		&self,
		_key: &CacheKey,
		entry: &Arc<CachedResponse>,
		_created_at: std::time::Instant,
	) -> Option<std::time::Duration> {
		Some(Self::time_to_live(entry))
	}

	fn expire_after_update(
		&self,
		_key: &CacheKey,
		entry: &Arc<CachedResponse>,
		_updated_at: std::time::Instant,
		_duration_until_expiry: Option<std::time::Duration>,
	) -> Option<std::time::Duration> {
		Some(Self::time_to_live(entry))
	}
}
