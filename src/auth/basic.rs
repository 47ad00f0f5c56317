//! HTTP basic authentication.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use http::{HeaderValue, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::{AuthError, Authenticator, Secret},
	transport::ApiRequest,
};

/// Sets standard basic credentials (`Authorization: Basic base64(user:password)`).
#[derive(Clone, Debug)]
pub struct BasicAuth {
	user: String,
	password: Secret,
	encoded: Secret,
}
impl BasicAuth {
	/// Creates a basic authenticator for the user/password pair.
	pub fn new(user: impl Into<String>, password: impl Into<Secret>) -> Self {
		let user = user.into();
		let password = password.into();
		let encoded = Secret::new(STANDARD.encode(format!("{user}:{}", password.expose())));

		Self { user, password, encoded }
	}

	/// Configured user name.
	pub fn user(&self) -> &str {
		&self.user
	}

	/// Configured password; callers must avoid logging it.
	pub fn password(&self) -> &Secret {
		&self.password
	}
}
impl Authenticator for BasicAuth {
	fn authenticate_request(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
		let mut header = HeaderValue::from_str(&format!("Basic {}", self.encoded.expose()))
			.map_err(|e| AuthError::InvalidCredential { scheme: "basic", reason: e.to_string() })?;

		header.set_sensitive(true);
		request.set_header(AUTHORIZATION, header);

		Ok(())
	}
}
