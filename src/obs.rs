//! Optional observability helpers for client calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `apiclient.call` with the `call`
//!   (entry point) and `stage` (call site) fields, plus debug/warn events for rate-limit
//!   delays, cache hits, and degraded cache operations.
//! - Enable `metrics` to increment the `apiclient_call_total` counter for every
//!   attempt/cache hit/success/failure, labeled by `call` + `outcome`; the
//!   `apiclient_cache_total` counter labeled by cache `event`; and the
//!   `apiclient_rate_limit_delay_seconds` histogram. Call [`describe_metrics`] once after
//!   installing a recorder to attach descriptions.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Client entry points observed by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// Raw [`ApiClient::execute`](crate::client::ApiClient::execute).
	Execute,
	/// [`ApiClient::get`](crate::client::ApiClient::get).
	Get,
	/// [`ApiClient::get_obj`](crate::client::ApiClient::get_obj).
	GetObj,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Execute => "execute",
			CallKind::Get => "get",
			CallKind::GetObj => "get_obj",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a client helper.
	Attempt,
	/// Response served from the cache.
	CacheHit,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::CacheHit => "cache_hit",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Cache events recorded by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheEvent {
	/// Fresh entry served without dispatching.
	Hit,
	/// No usable entry; the request went to the transport.
	Miss,
	/// Lookup failed and was treated as a miss.
	LookupFailed,
	/// Successful response written to the cache.
	Stored,
	/// Write failed; the response was still returned.
	StoreFailed,
}
impl CacheEvent {
	/// Returns a stable label suitable for metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheEvent::Hit => "hit",
			CacheEvent::Miss => "miss",
			CacheEvent::LookupFailed => "lookup_failed",
			CacheEvent::Stored => "stored",
			CacheEvent::StoreFailed => "store_failed",
		}
	}
}
impl Display for CacheEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
