//! Bearer-token authentication.

// crates.io
use http::{HeaderValue, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::{AuthError, Authenticator, Secret},
	transport::ApiRequest,
};

/// Sets `Authorization: Bearer <token>`.
#[derive(Clone, Debug)]
pub struct BearerAuth {
	header: HeaderValue,
}
impl BearerAuth {
	/// Creates a bearer authenticator for `token`.
	///
	/// Tokens containing bytes that are invalid in a header value are rejected here so the
	/// per-request path stays infallible.
	pub fn new(token: impl Into<Secret>) -> Result<Self, AuthError> {
		let token = token.into();
		let mut header = HeaderValue::from_str(&format!("Bearer {}", token.expose())).map_err(
			|e| AuthError::InvalidCredential { scheme: "bearer", reason: e.to_string() },
		)?;

		header.set_sensitive(true);

		Ok(Self { header })
	}
}
impl Authenticator for BearerAuth {
	fn authenticate_request(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
		request.set_header(AUTHORIZATION, self.header.clone());

		Ok(())
	}
}
