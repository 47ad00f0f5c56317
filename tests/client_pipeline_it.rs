// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use time::Duration;
// self
use apiclient::{
	auth::{AuthError, Authenticator, BearerAuth, QueryArgAuth},
	cache::{CacheError, CacheFuture, MemoryCache, NoCache, ResponseCache},
	client::{ApiClient, ApiClientOptions},
	error::{Error, TransportError},
	http::{HeaderMap, HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
	transport::{ApiRequest, ApiResponse, HttpTransport, TransportFuture},
	url::Url,
};

const BASE_URL: &str = "https://api.example.com/v1/";

/// Transport answering every request with a fixed status and counting dispatches.
struct CountingTransport {
	status: StatusCode,
	calls: AtomicUsize,
}
impl CountingTransport {
	fn new(status: StatusCode) -> Self {
		Self { status, calls: AtomicUsize::new(0) }
	}

	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl HttpTransport for CountingTransport {
	fn send(&self, _request: ApiRequest) -> TransportFuture<'_> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let status = self.status;

		Box::pin(async move {
			let mut headers = HeaderMap::new();

			headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

			Ok(ApiResponse::new(status, headers, b"{\"x\":1}".to_vec()))
		})
	}
}

/// Transport that always fails at the network layer.
struct RefusingTransport;
impl HttpTransport for RefusingTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			Err(TransportError::network(
				request.method,
				request.url,
				std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
			))
		})
	}
}

/// Cache whose lookups and/or stores fail on demand.
#[derive(Default)]
struct FlakyCache {
	fail_lookup: bool,
	fail_store: bool,
	stores: AtomicUsize,
}
impl ResponseCache for FlakyCache {
	fn lookup<'a>(
		&'a self,
		_request: &'a ApiRequest,
		_max_age: Duration,
	) -> CacheFuture<'a, Option<ApiResponse>> {
		let fail = self.fail_lookup;

		Box::pin(async move {
			if fail {
				Err(CacheError::Backend { message: "lookup unavailable".into() })
			} else {
				Ok(None)
			}
		})
	}

	fn store<'a>(
		&'a self,
		_request: &'a ApiRequest,
		_response: &'a ApiResponse,
		_max_age: Duration,
	) -> CacheFuture<'a, ()> {
		self.stores.fetch_add(1, Ordering::SeqCst);

		let fail = self.fail_store;

		Box::pin(async move {
			if fail { Err(CacheError::Backend { message: "disk full".into() }) } else { Ok(()) }
		})
	}
}

struct RejectingAuth;
impl Authenticator for RejectingAuth {
	fn authenticate_request(&self, _request: &mut ApiRequest) -> Result<(), AuthError> {
		Err(AuthError::InvalidCredential { scheme: "test", reason: "revoked".into() })
	}
}

fn build_client<T>(transport: T, cache: Arc<dyn ResponseCache>, rate: f64) -> ApiClient<T>
where
	T: HttpTransport,
{
	ApiClientOptions::new(BASE_URL)
		.cache(cache)
		.max_requests_per_second(rate)
		.build_with_transport(transport)
		.expect("Test client should build from a valid base URL.")
}

#[tokio::test]
async fn second_get_is_served_from_cache() {
	let cache = Arc::new(MemoryCache::default());
	let client = build_client(CountingTransport::new(StatusCode::OK), cache.clone(), 0.);
	let first = client.get("items", None).await.expect("First fetch should succeed.");
	let second = client.get("items", None).await.expect("Second fetch should succeed.");

	assert!(!first.is_cached());
	assert!(second.is_cached());
	assert_eq!(second.body, first.body);
	assert_eq!(client.transport().inner().calls(), 1);
	assert_eq!(cache.entry_count().await, 1);
}

#[tokio::test]
async fn concurrent_cache_hits_never_dispatch_or_touch_limiter() {
	let cache = Arc::new(MemoryCache::default());
	let client = build_client(CountingTransport::new(StatusCode::OK), cache.clone(), 1.);
	let request = client.build_get("items", None).expect("Request should build.");
	let mut headers = HeaderMap::new();

	headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
	cache
		.store(
			&request,
			&ApiResponse::new(StatusCode::OK, headers, b"{\"x\":7}".to_vec()),
			Duration::hours(1),
		)
		.await
		.expect("Pre-populating the memory cache should succeed.");

	let handles = (0..8)
		.map(|_| {
			let client = client.clone();

			tokio::spawn(async move { client.get("items", None).await })
		})
		.collect::<Vec<_>>();

	for handle in handles {
		let response = handle
			.await
			.expect("Cache-hit task should not panic.")
			.expect("Cache-hit call should succeed.");

		assert!(response.is_cached());
		assert_eq!(response.body, b"{\"x\":7}");
	}

	assert_eq!(client.transport().inner().calls(), 0);
	assert_eq!(client.transport().limiter().last_request(), None);
}

#[tokio::test]
async fn failed_store_still_returns_fetched_response() {
	let cache = Arc::new(FlakyCache { fail_store: true, ..Default::default() });
	let client = build_client(CountingTransport::new(StatusCode::OK), cache.clone(), 0.);
	let response =
		client.get("items", None).await.expect("A cache store failure must not fail the call.");

	assert_eq!(response.status, StatusCode::OK);
	assert!(matches!(response.cache_warning(), Some(CacheError::Backend { .. })));
	assert_eq!(cache.stores.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_lookup_falls_through_to_network() {
	let cache = Arc::new(FlakyCache { fail_lookup: true, ..Default::default() });
	let client = build_client(CountingTransport::new(StatusCode::OK), cache.clone(), 0.);
	let response =
		client.get("items", None).await.expect("A cache lookup failure must not fail the call.");

	assert!(!response.is_cached());
	assert!(response.cache_warning().is_none());
	assert_eq!(client.transport().inner().calls(), 1);
}

#[tokio::test]
async fn authenticator_error_aborts_before_dispatch() {
	let client = build_client(CountingTransport::new(StatusCode::OK), Arc::new(NoCache), 0.)
		.with_authenticator(Arc::new(RejectingAuth));
	let err = client
		.get("items", None)
		.await
		.expect_err("A rejecting authenticator should fail the call.");

	assert!(matches!(err, Error::Auth(AuthError::InvalidCredential { .. })));
	assert_eq!(client.transport().inner().calls(), 0);
	assert_eq!(client.transport().limiter().last_request(), None);
}

#[tokio::test]
async fn credentials_partition_cache_entries() {
	let cache = Arc::new(MemoryCache::default());
	let client = build_client(CountingTransport::new(StatusCode::OK), cache.clone(), 0.);
	let alice = client.clone().with_authenticator(Arc::new(
		BearerAuth::new("alice-token").expect("Bearer token should be a valid header value."),
	));
	let bob = client.clone().with_authenticator(Arc::new(
		BearerAuth::new("bob-token").expect("Bearer token should be a valid header value."),
	));

	alice.get("me", None).await.expect("Alice's fetch should succeed.");
	bob.get("me", None).await.expect("Bob's fetch should succeed.");

	let repeat = alice.get("me", None).await.expect("Alice's repeat fetch should succeed.");

	assert!(repeat.is_cached());
	assert_eq!(client.transport().inner().calls(), 2);
	assert_eq!(cache.entry_count().await, 2);
}

#[tokio::test]
async fn unsafe_methods_bypass_cache() {
	let cache = Arc::new(MemoryCache::default());
	let client = build_client(CountingTransport::new(StatusCode::OK), cache.clone(), 0.);
	let url = client.resolve("items").expect("Resource should resolve.");

	for _ in 0..2 {
		let response = client
			.execute(ApiRequest::new(Method::POST, url.clone()).with_body(b"{}".to_vec()))
			.await
			.expect("POST should be dispatched.");

		assert!(!response.is_cached());
	}

	assert_eq!(client.transport().inner().calls(), 2);
	assert!(cache.is_empty().await);
}

#[tokio::test]
async fn error_statuses_are_returned_but_not_cached() {
	let cache = Arc::new(MemoryCache::default());
	let client =
		build_client(CountingTransport::new(StatusCode::INTERNAL_SERVER_ERROR), cache.clone(), 0.);

	for _ in 0..2 {
		let response = client.get("items", None).await.expect("A 500 is still a response.");

		assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
	}

	assert_eq!(client.transport().inner().calls(), 2);
	assert!(cache.is_empty().await);

	let err = client
		.get_obj::<serde_json::Value>("items", None)
		.await
		.expect_err("Typed decoding requires a 200 status.");

	assert!(matches!(
		err,
		Error::Response(ref e) if e.status() == Some(StatusCode::INTERNAL_SERVER_ERROR)
	));
}

#[tokio::test]
async fn transport_failures_surface_with_context() {
	let client = build_client(RefusingTransport, Arc::new(NoCache), 0.);
	let err =
		client.get("items", None).await.expect_err("A refused connection should fail the call.");

	match err {
		Error::Transport(TransportError::Network { method, url, .. }) => {
			assert_eq!(method, Method::GET);
			assert_eq!(
				url,
				Url::parse("https://api.example.com/v1/items").expect("URL should parse.")
			);
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn get_obj_into_leaves_destination_untouched_on_failure() {
	#[derive(Debug, Default, serde::Deserialize, PartialEq)]
	struct Point {
		x: i64,
	}

	let ok = build_client(CountingTransport::new(StatusCode::OK), Arc::new(NoCache), 0.);
	let failing =
		build_client(CountingTransport::new(StatusCode::NOT_FOUND), Arc::new(NoCache), 0.);
	let mut point = Point { x: -1 };

	failing
		.get_obj_into("point", None, &mut point)
		.await
		.expect_err("A 404 should not decode.");

	assert_eq!(point, Point { x: -1 });

	ok.get_obj_into("point", None, &mut point).await.expect("A 200 JSON body should decode.");

	assert_eq!(point, Point { x: 1 });
}

#[tokio::test]
async fn transport_errors_do_not_leak_query_credentials() {
	let client = build_client(RefusingTransport, Arc::new(NoCache), 0.)
		.with_authenticator(Arc::new(QueryArgAuth::new("key", "TOPSECRET")));
	let err =
		client.get("items", None).await.expect_err("A refused connection should fail the call.");
	let mut messages = vec![err.to_string()];
	let mut source = std::error::Error::source(&err);

	while let Some(e) = source {
		messages.push(e.to_string());
		source = e.source();
	}

	assert_eq!(messages[0], "Network error occurred during GET https://api.example.com/v1/items.");

	for message in messages {
		assert!(!message.contains("TOPSECRET"), "Error message leaked the API key: {message}.");
	}
}
