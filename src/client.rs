//! API client orchestrating authentication, caching, and rate-limited dispatch.
//!
//! Every call runs the same ordered pipeline: the request is authenticated, the cache is
//! consulted, a miss is dispatched through the [`RateLimitedTransport`], and a successful
//! response is handed back to the cache before it reaches the caller. Cache hits never
//! touch the limiter. Cache failures never fail a call: a failed lookup is treated as a
//! miss and a failed store is reported through [`ApiResponse::cache_warning`].

pub mod options;
pub mod request;

pub use options::*;
pub use request::*;

// self
use crate::{
	_prelude::*,
	auth::Authenticator,
	cache::ResponseCache,
	obs::{self, CacheEvent, CallKind, CallOutcome, CallSpan},
	rate_limit::RateLimitedTransport,
	transport::{ApiRequest, ApiResponse, HttpTransport},
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Long-lived client bound to one API base endpoint.
///
/// Clones share the transport, the rate limiter, the cache, and the authenticator, so one
/// client (or any number of its clones) can serve concurrent callers while keeping a single
/// global dispatch spacing.
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	base_url: Url,
	max_cache_age: Duration,
	authenticator: Option<Arc<dyn Authenticator>>,
	cache: Arc<dyn ResponseCache>,
	transport: RateLimitedTransport<T>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Assembles a client from already-validated parts.
	///
	/// Prefer [`ApiClientOptions`] unless the transport or limiter needs to be shared.
	pub fn with_parts(
		base_url: Url,
		transport: RateLimitedTransport<T>,
		cache: Arc<dyn ResponseCache>,
	) -> Self {
		Self {
			base_url,
			max_cache_age: ApiClientOptions::DEFAULT_MAX_CACHE_AGE,
			authenticator: None,
			cache,
			transport,
		}
	}

	/// Sets or replaces the authenticator applied by [`ApiClient::get`].
	pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
		self.authenticator = Some(authenticator);

		self
	}

	/// Overrides the freshness window used for cache lookups and stores.
	pub fn with_max_cache_age(mut self, max_cache_age: Duration) -> Self {
		self.max_cache_age = max_cache_age;

		self
	}

	/// Base URL resources are resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Freshness window for cached responses.
	pub fn max_cache_age(&self) -> Duration {
		self.max_cache_age
	}

	/// Rate-limited transport used for cache misses.
	pub fn transport(&self) -> &RateLimitedTransport<T> {
		&self.transport
	}

	/// Cache consulted before every eligible dispatch.
	pub fn cache(&self) -> &Arc<dyn ResponseCache> {
		&self.cache
	}

	/// Configured authenticator, if any.
	pub fn authenticator(&self) -> Option<&Arc<dyn Authenticator>> {
		self.authenticator.as_ref()
	}

	/// Runs `request` through the cache and, on a miss, the rate-limited transport.
	///
	/// The request is sent as given; callers building requests by hand apply
	/// authentication themselves (see [`ApiClient::authenticate`]).
	pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Execute;

		let span = CallSpan::new(KIND, "execute");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.pipeline(KIND, request)).await;

		record_result(KIND, &result);

		result
	}

	/// Applies the configured authenticator (if any) to `request`.
	pub fn authenticate(&self, request: &mut ApiRequest) -> Result<()> {
		if let Some(authenticator) = self.authenticator.as_deref() {
			authenticator.authenticate_request(request)?;
		}

		Ok(())
	}

	pub(crate) async fn pipeline(
		&self,
		kind: CallKind,
		request: ApiRequest,
	) -> Result<ApiResponse> {
		let cacheable = request.is_cacheable();

		if cacheable {
			match self.cache.lookup(&request, self.max_cache_age).await {
				Ok(Some(hit)) => {
					obs::cache_hit(&request.url);
					obs::record_cache_event(CacheEvent::Hit);
					obs::record_call_outcome(kind, CallOutcome::CacheHit);

					return Ok(hit);
				},
				Ok(None) => obs::record_cache_event(CacheEvent::Miss),
				Err(e) => {
					obs::cache_lookup_failed(&request.url, &e);
					obs::record_cache_event(CacheEvent::LookupFailed);
				},
			}
		}

		let cache_request = cacheable.then(|| request.clone());
		let response = self.transport.send(request).await?;

		let Some(cache_request) = cache_request.filter(|_| response.status.is_success()) else {
			return Ok(response);
		};

		match self.cache.store(&cache_request, &response, self.max_cache_age).await {
			Ok(()) => {
				obs::record_cache_event(CacheEvent::Stored);

				Ok(response)
			},
			Err(e) => {
				obs::cache_store_failed(&cache_request.url, &e);
				obs::record_cache_event(CacheEvent::StoreFailed);

				Ok(response.with_cache_warning(e))
			},
		}
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			base_url: self.base_url.clone(),
			max_cache_age: self.max_cache_age,
			authenticator: self.authenticator.clone(),
			cache: self.cache.clone(),
			transport: self.transport.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.base_url.as_str())
			.field("max_cache_age", &self.max_cache_age)
			.field("authenticator_set", &self.authenticator.is_some())
			.field("transport", &self.transport)
			.finish()
	}
}

pub(crate) fn record_result<V>(kind: CallKind, result: &Result<V>) {
	match result {
		Ok(_) => obs::record_call_outcome(kind, CallOutcome::Success),
		Err(_) => obs::record_call_outcome(kind, CallOutcome::Failure),
	}
}
