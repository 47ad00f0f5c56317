//! Transport primitives for API exchanges.
//!
//! The module exposes [`HttpTransport`] alongside the owned [`ApiRequest`] and
//! [`ApiResponse`] values that flow through the client pipeline, so downstream crates can
//! plug in custom HTTP stacks (or fakes in tests) without touching rate limiting, caching,
//! or authentication. Responses are fully buffered before a transport returns them, which
//! releases the underlying connection on every path.

pub mod query;

pub use query::*;

// crates.io
use http::{
	HeaderMap, HeaderValue, Method, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{_prelude::*, cache::CacheError, error::TransportError};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing one request.
///
/// The trait is the client's only dependency on an HTTP implementation. Implementations
/// must be `Send + Sync + 'static` so one transport can be shared by every clone of a
/// client, and must buffer the complete body before resolving.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the buffered response or a transport failure.
	fn send(&self, request: ApiRequest) -> TransportFuture<'_>;
}
impl<T> HttpTransport for Arc<T>
where
	T: ?Sized + HttpTransport,
{
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		T::send(&**self, request)
	}
}

/// Outgoing request owned by the client for the duration of one call.
///
/// Query injection and authenticators mutate it in place before dispatch.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL, including the query string.
	pub url: Url,
	/// Request headers.
	pub headers: HeaderMap,
	/// Optional request payload.
	pub body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a body-less request.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None }
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Attaches a payload.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Replaces (or inserts) a header.
	pub fn set_header(&mut self, name: http::header::HeaderName, value: HeaderValue) {
		self.headers.insert(name, value);
	}

	/// Returns the `Authorization` header value, if any.
	pub fn authorization(&self) -> Option<&HeaderValue> {
		self.headers.get(AUTHORIZATION)
	}

	/// Whether responses to this request may be served from or stored in a cache.
	pub fn is_cacheable(&self) -> bool {
		self.method == Method::GET || self.method == Method::HEAD
	}
}

/// Where a response came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseOrigin {
	/// Served from the response cache without touching the network.
	Cache,
	/// Fetched over the network.
	Network,
}

/// Buffered response returned to callers.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Fully read response body.
	pub body: Vec<u8>,
	origin: ResponseOrigin,
	cache_warning: Option<CacheError>,
}
impl ApiResponse {
	/// Builds a network-origin response.
	pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
		Self {
			status,
			headers,
			body: body.into(),
			origin: ResponseOrigin::Network,
			cache_warning: None,
		}
	}

	/// Returns where the response came from.
	pub fn origin(&self) -> ResponseOrigin {
		self.origin
	}

	/// Returns `true` when the response was served from the cache.
	pub fn is_cached(&self) -> bool {
		self.origin == ResponseOrigin::Cache
	}

	/// Non-fatal cache-store failure recorded after a successful fetch.
	pub fn cache_warning(&self) -> Option<&CacheError> {
		self.cache_warning.as_ref()
	}

	/// Returns the raw `Content-Type` header (empty when absent or not visible ASCII).
	pub fn content_type(&self) -> &str {
		self.headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()).unwrap_or_default()
	}

	/// Lossy UTF-8 view of the body.
	pub fn text(&self) -> std::borrow::Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}

	/// Consumes the response, returning the body bytes.
	pub fn into_body(self) -> Vec<u8> {
		self.body
	}

	pub(crate) fn served_from_cache(mut self) -> Self {
		self.origin = ResponseOrigin::Cache;
		self.cache_warning = None;

		self
	}

	pub(crate) fn with_cache_warning(mut self, warning: CacheError) -> Self {
		self.cache_warning = Some(warning);

		self
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// [`ReqwestTransport::new`] enables reqwest's cookie store, which keeps cookies scoped by
/// the public-suffix rules of its jar, and applies the request timeout to every call.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with a cookie jar and the provided request timeout.
	pub fn new(timeout: std::time::Duration) -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder().cookie_store(true).timeout(timeout).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	async fn execute(
		client: ReqwestClient,
		request: ApiRequest,
	) -> Result<ApiResponse, TransportError> {
		let ApiRequest { method, url, headers, body } = request;
		let mut outgoing = reqwest::Request::new(method.clone(), url.clone());

		*outgoing.headers_mut() = headers;

		if let Some(body) = body {
			*outgoing.body_mut() = Some(body.into());
		}

		// reqwest errors embed the full URL; the query may carry credentials.
		let map_err = |e: ReqwestError| {
			let e = e.without_url();

			if e.is_timeout() {
				TransportError::timeout(method.clone(), url.clone(), e)
			} else {
				TransportError::network(method.clone(), url.clone(), e)
			}
		};
		let response = client.execute(outgoing).await.map_err(map_err)?;
		let status = response.status();
		let headers = response.headers().to_owned();
		let body = response.bytes().await.map_err(map_err)?;

		Ok(ApiResponse::new(status, headers, body.to_vec()))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(Self::execute(self.0.clone(), request))
	}
}
