// self
use crate::obs::{CacheEvent, CallKind, CallOutcome};

#[cfg(feature = "metrics")]
const CALL_TOTAL: &str = "apiclient_call_total";
#[cfg(feature = "metrics")]
const CACHE_TOTAL: &str = "apiclient_cache_total";
#[cfg(feature = "metrics")]
const RATE_LIMIT_DELAY_SECONDS: &str = "apiclient_rate_limit_delay_seconds";

/// Attaches descriptions to every metric the client emits.
///
/// Call once after installing the global recorder; a no-op without the `metrics` feature.
pub fn describe_metrics() {
	#[cfg(feature = "metrics")]
	{
		metrics::describe_counter!(CALL_TOTAL, "Client calls by entry point and outcome");
		metrics::describe_counter!(CACHE_TOTAL, "Response cache lookups and stores by event");
		metrics::describe_histogram!(
			RATE_LIMIT_DELAY_SECONDS,
			metrics::Unit::Seconds,
			"Time a dispatch waited for its rate-limit slot"
		);
	}
}

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(CALL_TOTAL, "call" => kind.as_str(), "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records one cache lookup or store result.
pub fn record_cache_event(event: CacheEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(CACHE_TOTAL, "event" => event.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = event;
	}
}

/// Records how long a dispatch slept before its slot opened.
pub fn record_rate_limit_delay(delay: std::time::Duration) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!(RATE_LIMIT_DELAY_SECONDS).record(delay.as_secs_f64());
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = delay;
	}
}
