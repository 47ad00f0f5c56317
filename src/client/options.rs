//! Construction options for [`ApiClient`].

// self
use crate::{
	_prelude::*,
	auth::Authenticator,
	cache::{FileCache, ResponseCache},
	client::ApiClient,
	error::ConfigError,
	rate_limit::RateLimitedTransport,
	transport::HttpTransport,
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestTransport;

/// Options describing one API endpoint and how calls to it are shaped.
///
/// Unset fields fall back to the `DEFAULT_*` constants. A `max_requests_per_second` of zero or
/// less disables rate limiting; leaving it unset applies
/// [`ApiClientOptions::DEFAULT_MAX_REQUESTS_PER_SECOND`].
pub struct ApiClientOptions {
	/// Absolute base URL resources are resolved against.
	pub base_url: String,
	/// Per-request timeout applied by the default transport.
	pub request_timeout: Option<Duration>,
	/// Response cache; defaults to a [`FileCache`] under `./var/cache`.
	pub cache: Option<Arc<dyn ResponseCache>>,
	/// Freshness window for cached responses.
	pub max_cache_age: Option<Duration>,
	/// Upper bound on network dispatches per second.
	pub max_requests_per_second: Option<f64>,
	/// Authenticator applied by resource-oriented calls.
	pub authenticator: Option<Arc<dyn Authenticator>>,
}
impl ApiClientOptions {
	/// Timeout applied when none is configured.
	pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::seconds(5);
	/// Cache freshness window applied when none is configured.
	pub const DEFAULT_MAX_CACHE_AGE: Duration = Duration::hours(24);
	/// Dispatch rate applied when none is configured.
	pub const DEFAULT_MAX_REQUESTS_PER_SECOND: f64 = 10.;

	/// Creates options for the endpoint at `base_url` with every other field unset.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			request_timeout: None,
			cache: None,
			max_cache_age: None,
			max_requests_per_second: None,
			authenticator: None,
		}
	}

	/// Sets the per-request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Sets the response cache.
	pub fn cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
		self.cache = Some(cache);

		self
	}

	/// Sets the cache freshness window.
	pub fn max_cache_age(mut self, max_cache_age: Duration) -> Self {
		self.max_cache_age = Some(max_cache_age);

		self
	}

	/// Sets the dispatch rate; zero or less disables limiting.
	pub fn max_requests_per_second(mut self, rate: f64) -> Self {
		self.max_requests_per_second = Some(rate);

		self
	}

	/// Sets the authenticator.
	pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
		self.authenticator = Some(authenticator);

		self
	}

	/// Effective request timeout after defaults.
	pub fn effective_request_timeout(&self) -> Duration {
		self.request_timeout.unwrap_or(Self::DEFAULT_REQUEST_TIMEOUT)
	}

	/// Effective cache freshness window after defaults.
	pub fn effective_max_cache_age(&self) -> Duration {
		self.max_cache_age.unwrap_or(Self::DEFAULT_MAX_CACHE_AGE)
	}

	/// Effective dispatch rate after defaults.
	pub fn effective_max_requests_per_second(&self) -> f64 {
		self.max_requests_per_second.unwrap_or(Self::DEFAULT_MAX_REQUESTS_PER_SECOND)
	}

	/// Builds a client on the default reqwest transport, honoring `request_timeout`.
	#[cfg(feature = "reqwest")]
	pub fn build(self) -> Result<ApiClient<ReqwestTransport>> {
		let timeout = self.effective_request_timeout();

		if !timeout.is_positive() {
			return Err(ConfigError::NonPositiveTimeout.into());
		}

		let transport = ReqwestTransport::new(timeout.unsigned_abs())?;

		self.build_with_transport(transport)
	}

	/// Builds a client around a caller-supplied transport.
	///
	/// `request_timeout` is the transport's concern here and is not consulted.
	pub fn build_with_transport<T>(self, transport: T) -> Result<ApiClient<T>>
	where
		T: HttpTransport,
	{
		let base_url = parse_base_url(&self.base_url)?;
		let max_cache_age = self.effective_max_cache_age();
		let rate = self.effective_max_requests_per_second();
		let cache = match self.cache {
			Some(cache) => cache,
			None => default_cache()?,
		};
		let client = ApiClient::with_parts(base_url, RateLimitedTransport::new(transport, rate), cache)
			.with_max_cache_age(max_cache_age);

		Ok(match self.authenticator {
			Some(authenticator) => client.with_authenticator(authenticator),
			None => client,
		})
	}
}
impl Debug for ApiClientOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClientOptions")
			.field("base_url", &self.base_url)
			.field("request_timeout", &self.request_timeout)
			.field("cache_set", &self.cache.is_some())
			.field("max_cache_age", &self.max_cache_age)
			.field("max_requests_per_second", &self.max_requests_per_second)
			.field("authenticator_set", &self.authenticator.is_some())
			.finish()
	}
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw)
		.map_err(|source| ConfigError::InvalidBaseUrl { url: raw.to_owned(), source })?;

	if url.cannot_be_a_base() {
		return Err(ConfigError::CannotBeABase { url: raw.to_owned() });
	}

	Ok(url)
}

fn default_cache() -> Result<Arc<dyn ResponseCache>, ConfigError> {
	let dir = FileCache::default_dir().map_err(ConfigError::CacheStore)?;
	let cache = FileCache::open(dir).map_err(ConfigError::CacheStore)?;

	Ok(Arc::new(cache))
}
