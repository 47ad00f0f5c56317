//! Response cache contract and built-in cache stores.
//!
//! The client only consumes [`ResponseCache::lookup`] and [`ResponseCache::store`]; key
//! derivation, serialization, and expiry bookkeeping belong to the store. Built-in stores
//! key entries by [`CacheKey`] and persist [`CachedResponse`] snapshots.

pub mod file;
pub mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	transport::{ApiRequest, ApiResponse},
};

/// Boxed future returned by [`ResponseCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Storage contract implemented by response caches.
///
/// Implementations must be safe for concurrent use; the client adds no locking around them.
pub trait ResponseCache
where
	Self: Send + Sync,
{
	/// Returns a stored response for `request` no older than `max_age`, if any.
	fn lookup<'a>(
		&'a self,
		request: &'a ApiRequest,
		max_age: Duration,
	) -> CacheFuture<'a, Option<ApiResponse>>;

	/// Persists `response` for `request`, fresh until `now + max_age`.
	fn store<'a>(
		&'a self,
		request: &'a ApiRequest,
		response: &'a ApiResponse,
		max_age: Duration,
	) -> CacheFuture<'a, ()>;
}

/// Error type produced by [`ResponseCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Serialization failures (e.g., serde) surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Cache that never hits and never stores.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;
impl ResponseCache for NoCache {
	fn lookup<'a>(
		&'a self,
		_request: &'a ApiRequest,
		_max_age: Duration,
	) -> CacheFuture<'a, Option<ApiResponse>> {
		Box::pin(async { Ok(None) })
	}

	fn store<'a>(
		&'a self,
		_request: &'a ApiRequest,
		_response: &'a ApiResponse,
		_max_age: Duration,
	) -> CacheFuture<'a, ()> {
		Box::pin(async { Ok(()) })
	}
}

/// Unique, file-name-safe key identifying a cached request.
///
/// Derived from the method, the full URL (query included), and the `Authorization` header,
/// so differently authenticated requests never share an entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);
impl CacheKey {
	/// Derives the key for `request`.
	pub fn for_request(request: &ApiRequest) -> Self {
		let mut hasher = Sha256::new();

		hasher.update(request.method.as_str().as_bytes());
		hasher.update(b"\n");
		hasher.update(request.url.as_str().as_bytes());
		hasher.update(b"\n");

		if let Some(auth) = request.authorization() {
			hasher.update(auth.as_bytes());
		}

		Self(URL_SAFE_NO_PAD.encode(hasher.finalize()))
	}

	/// Returns the encoded key.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Serializable snapshot of a stored response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
	/// HTTP status code.
	pub status: u16,
	/// Header name/value pairs in their original order.
	pub headers: Vec<(String, String)>,
	/// Body bytes, base64 encoded on the wire.
	#[serde(with = "body_base64")]
	pub body: Vec<u8>,
	/// Instant the response was stored.
	pub stored_at: OffsetDateTime,
	/// Instant after which the entry must not be served.
	pub expires_at: OffsetDateTime,
}
impl CachedResponse {
	/// Snapshots `response` at `now`, fresh for `max_age`.
	///
	/// Header values that are not visible ASCII are dropped.
	pub fn capture(response: &ApiResponse, now: OffsetDateTime, max_age: Duration) -> Self {
		let headers = response
			.headers
			.iter()
			.filter_map(|(name, value)| {
				value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
			})
			.collect();

		Self {
			status: response.status.as_u16(),
			headers,
			body: response.body.clone(),
			stored_at: now,
			expires_at: now.saturating_add(max_age),
		}
	}

	/// Whether the entry may be served at `now` to a caller accepting `max_age`.
	pub fn is_fresh_at(&self, now: OffsetDateTime, max_age: Duration) -> bool {
		now < self.expires_at && now - self.stored_at < max_age
	}

	/// Rebuilds a cache-origin [`ApiResponse`].
	pub fn to_response(&self) -> Result<ApiResponse, CacheError> {
		let status = StatusCode::from_u16(self.status).map_err(|e| CacheError::Serialization {
			message: format!("Stored status {} is invalid: {e}", self.status),
		})?;
		let mut headers = HeaderMap::with_capacity(self.headers.len());

		for (name, value) in &self.headers {
			let invalid = |e: &dyn Display| CacheError::Serialization {
				message: format!("Stored header {name} is invalid: {e}"),
			};
			let header_name = HeaderName::try_from(name.as_str()).map_err(|e| invalid(&e))?;
			let header_value = HeaderValue::try_from(value.as_str()).map_err(|e| invalid(&e))?;

			headers.append(header_name, header_value);
		}

		Ok(ApiResponse::new(status, headers, self.body.clone()).served_from_cache())
	}
}

mod body_base64 {
	// crates.io
	use base64::{Engine, engine::general_purpose::STANDARD};
	use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

	pub(super) fn serialize<S>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&STANDARD.encode(body))
	}

	pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let encoded = String::deserialize(deserializer)?;

		STANDARD.decode(encoded).map_err(D::Error::custom)
	}
}
