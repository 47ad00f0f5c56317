//! API-key authentication through a query parameter.

// self
use crate::{
	_prelude::*,
	auth::{AuthError, Authenticator, Secret},
	transport::{ApiRequest, QueryArgs},
};

/// Sets a named query parameter to a fixed key.
///
/// Existing parameters survive; any previous values for the same parameter are replaced
/// and the whole query is re-encoded with sorted keys.
#[derive(Clone, Debug)]
pub struct QueryArgAuth {
	arg: String,
	key: Secret,
}
impl QueryArgAuth {
	/// Creates an authenticator that writes `key` into the `arg` query parameter.
	pub fn new(arg: impl Into<String>, key: impl Into<Secret>) -> Self {
		Self { arg: arg.into(), key: key.into() }
	}

	/// Name of the query parameter carrying the key.
	pub fn arg(&self) -> &str {
		&self.arg
	}
}
impl Authenticator for QueryArgAuth {
	fn authenticate_request(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
		let mut args = QueryArgs::from_url(&request.url);

		args.set(self.arg.as_str(), self.key.expose());
		args.apply_to(&mut request.url);

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn key_is_added_next_to_existing_args() {
		let url = Url::parse("https://api.example.com/v1/items?a=1")
			.expect("Fixture URL should parse successfully.");
		let mut request = ApiRequest::get(url);

		QueryArgAuth::new("key", "secret")
			.authenticate_request(&mut request)
			.expect("Query-arg authentication should never fail.");

		let pairs = QueryArgs::from_url(&request.url);

		assert_eq!(pairs.get("a"), Some("1"));
		assert_eq!(pairs.get("key"), Some("secret"));
	}

	#[test]
	fn key_overwrites_previous_value() {
		let url = Url::parse("https://api.example.com/v1/items?key=stale&z=9")
			.expect("Fixture URL should parse successfully.");
		let mut request = ApiRequest::get(url);

		QueryArgAuth::new("key", "fresh")
			.authenticate_request(&mut request)
			.expect("Query-arg authentication should never fail.");

		assert_eq!(request.url.query(), Some("key=fresh&z=9"));
	}

	#[test]
	fn debug_output_redacts_key() {
		let auth = QueryArgAuth::new("api_key", "hunter2");

		assert!(!format!("{auth:?}").contains("hunter2"));
		assert_eq!(auth.arg(), "api_key");
	}
}
