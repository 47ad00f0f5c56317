//! Pluggable request authentication.
//!
//! Every strategy implements [`Authenticator`], whose single operation mutates an outgoing
//! [`ApiRequest`] in place. Strategies hold only their own immutable credential, so one
//! instance can sign any number of concurrent requests.

pub mod basic;
pub mod bearer;
pub mod query_arg;
pub mod secret;

pub use basic::*;
pub use bearer::*;
pub use query_arg::*;
pub use secret::*;

// self
use crate::{_prelude::*, transport::ApiRequest};

/// Strategy that attaches credentials to an outgoing request.
///
/// The client calls [`Authenticator::authenticate_request`] exactly once per request,
/// before the cache lookup and before any rate-limit delay, so cache identity reflects the
/// signed request. A returned error aborts the call before anything is dispatched.
pub trait Authenticator
where
	Self: Send + Sync,
{
	/// Mutates `request` to carry credentials.
	fn authenticate_request(&self, request: &mut ApiRequest) -> Result<(), AuthError>;
}
impl<A> Authenticator for Arc<A>
where
	A: ?Sized + Authenticator,
{
	fn authenticate_request(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
		A::authenticate_request(&**self, request)
	}
}

/// Failure raised by an [`Authenticator`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthError {
	/// Credential material cannot be encoded into the request.
	#[error("Credential for {scheme} authentication cannot be encoded: {reason}.")]
	InvalidCredential {
		/// Authentication scheme label.
		scheme: &'static str,
		/// Human-readable failure detail.
		reason: String,
	},
}
