// self
use crate::{_prelude::*, cache::CacheError, obs::CallKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by client entry points.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("apiclient.call", call = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

pub(crate) fn rate_limit_delay(delay: std::time::Duration) {
	#[cfg(feature = "tracing")]
	tracing::debug!(delay_ms = delay.as_millis() as u64, "rate limiting");
	#[cfg(not(feature = "tracing"))]
	let _ = delay;
}

pub(crate) fn dispatch(method: &http::Method, url: &Url) {
	#[cfg(feature = "tracing")]
	tracing::debug!(%method, host = url.host_str(), path = url.path(), "dispatching request");
	#[cfg(not(feature = "tracing"))]
	let _ = (method, url);
}

pub(crate) fn cache_hit(url: &Url) {
	#[cfg(feature = "tracing")]
	tracing::debug!(host = url.host_str(), path = url.path(), "served from cache");
	#[cfg(not(feature = "tracing"))]
	let _ = url;
}

pub(crate) fn cache_lookup_failed(url: &Url, error: &CacheError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		host = url.host_str(),
		path = url.path(),
		%error,
		"cache lookup failed; treating as a miss"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (url, error);
}

pub(crate) fn cache_store_failed(url: &Url, error: &CacheError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		host = url.host_str(),
		path = url.path(),
		%error,
		"cache store failed; returning fetched response"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (url, error);
}
