//! Minimum-interval rate limiting for outbound dispatches.
//!
//! A [`MinIntervalLimiter`] keeps a single `last_request` instant per client. Each dispatch
//! reserves the next free slot (`max(now, last_request + interval)`) inside a short critical
//! section, releases the lock, and only then sleeps until its slot. Concurrent callers
//! therefore receive distinct, evenly spaced slots and nobody sleeps while holding the lock.
//! [`RateLimitedTransport`] applies the limiter in front of any [`HttpTransport`].

// crates.io
use tokio::time::{self, Instant};
// self
use crate::{
	_prelude::*,
	obs,
	transport::{ApiRequest, HttpTransport, TransportFuture},
};

/// Longest spacing the limiter enforces (tokio's far-future horizon of 30 years).
pub const MAX_INTERVAL: std::time::Duration = std::time::Duration::from_secs(86_400 * 365 * 30);

/// Result of a slot reservation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// The request may be dispatched immediately.
	Allow,
	/// The request must wait before it is dispatched.
	Delay(RetryDirective),
}

/// Advises callers when a delayed dispatch may proceed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Instant reserved for the dispatch.
	pub earliest_dispatch_at: Instant,
	/// Time left until `earliest_dispatch_at`, measured at reservation.
	pub delay: std::time::Duration,
}

/// Enforces a minimum wall-clock interval between consecutive dispatches.
#[derive(Debug)]
pub struct MinIntervalLimiter {
	interval: Option<std::time::Duration>,
	last_request: Mutex<Option<Instant>>,
}
impl MinIntervalLimiter {
	/// Creates a limiter allowing at most `max_requests_per_second` dispatches per second.
	///
	/// Rates that are zero, negative, or not finite disable limiting entirely. Positive rates
	/// too small to represent are clamped to [`MAX_INTERVAL`].
	pub fn new(max_requests_per_second: f64) -> Self {
		let interval = (max_requests_per_second.is_finite() && max_requests_per_second > 0.)
			.then(|| {
				std::time::Duration::try_from_secs_f64(max_requests_per_second.recip())
					.map_or(MAX_INTERVAL, |interval| interval.min(MAX_INTERVAL))
			});

		Self { interval, last_request: Mutex::new(None) }
	}

	/// Creates a limiter that never delays.
	pub fn disabled() -> Self {
		Self { interval: None, last_request: Mutex::new(None) }
	}

	/// Minimum spacing between dispatches, or `None` when limiting is disabled.
	pub fn interval(&self) -> Option<std::time::Duration> {
		self.interval
	}

	/// Instant of the most recent reserved dispatch.
	pub fn last_request(&self) -> Option<Instant> {
		*self.last_request.lock()
	}

	/// Reserves the next dispatch slot as observed at `now`.
	///
	/// `last_request` never moves backwards: a caller observing an older `now` than the
	/// recorded instant is scheduled after it. A disabled limiter always allows and keeps no
	/// state.
	pub fn reserve(&self, now: Instant) -> RateLimitDecision {
		let Some(interval) = self.interval else {
			return RateLimitDecision::Allow;
		};
		let mut last = self.last_request.lock();
		let slot = match *last {
			// Saturates instead of overflowing the clock.
			Some(prev) => prev.checked_add(interval).unwrap_or(prev).max(now),
			None => now,
		};

		*last = Some(slot);

		if slot > now {
			RateLimitDecision::Delay(RetryDirective {
				earliest_dispatch_at: slot,
				delay: slot - now,
			})
		} else {
			RateLimitDecision::Allow
		}
	}

	/// Waits until the caller may dispatch. Never fails.
	pub async fn acquire(&self) {
		if let RateLimitDecision::Delay(directive) = self.reserve(Instant::now()) {
			obs::rate_limit_delay(directive.delay);
			obs::record_rate_limit_delay(directive.delay);
			time::sleep_until(directive.earliest_dispatch_at).await;
		}
	}
}
impl Default for MinIntervalLimiter {
	fn default() -> Self {
		Self::disabled()
	}
}

/// Wraps an [`HttpTransport`] so dispatches honor a [`MinIntervalLimiter`].
///
/// Clones share both the inner transport and the limiter.
pub struct RateLimitedTransport<T>
where
	T: ?Sized + HttpTransport,
{
	inner: Arc<T>,
	limiter: Arc<MinIntervalLimiter>,
}
impl<T> RateLimitedTransport<T>
where
	T: ?Sized + HttpTransport,
{
	/// Wraps `inner`, allowing at most `max_requests_per_second` dispatches per second.
	pub fn new(inner: impl Into<Arc<T>>, max_requests_per_second: f64) -> Self {
		Self::with_limiter(inner, Arc::new(MinIntervalLimiter::new(max_requests_per_second)))
	}

	/// Wraps `inner` with an existing (possibly shared) limiter.
	pub fn with_limiter(inner: impl Into<Arc<T>>, limiter: Arc<MinIntervalLimiter>) -> Self {
		Self { inner: inner.into(), limiter }
	}

	/// Returns the wrapped transport.
	pub fn inner(&self) -> &Arc<T> {
		&self.inner
	}

	/// Returns the limiter guarding dispatches.
	pub fn limiter(&self) -> &MinIntervalLimiter {
		&self.limiter
	}
}
impl<T> Clone for RateLimitedTransport<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone(), limiter: self.limiter.clone() }
	}
}
impl<T> Debug for RateLimitedTransport<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimitedTransport").field("limiter", &self.limiter).finish()
	}
}
impl<T> HttpTransport for RateLimitedTransport<T>
where
	T: ?Sized + HttpTransport,
{
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			self.limiter.acquire().await;
			obs::dispatch(&request.method, &request.url);

			self.inner.send(request).await
		})
	}
}
