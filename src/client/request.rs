//! Resource-oriented helpers layered on [`ApiClient::execute`]'s pipeline.

// crates.io
use http::StatusCode;
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	client::{self, ApiClient},
	error::ResponseError,
	obs::{self, CallKind, CallOutcome, CallSpan},
	transport::{ApiRequest, ApiResponse, HttpTransport, QueryArgs},
};

/// Content type [`ApiClient::get_obj`] accepts, compared verbatim.
pub const JSON_CONTENT_TYPE: &str = "application/json";

const BODY_PREVIEW_LIMIT: usize = 256;

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Resolves `resource` against the base URL using RFC 3986 reference resolution.
	///
	/// A relative path is appended to the base's directory (so a base ending in `/` keeps
	/// its last segment), an absolute path replaces the base path, and an absolute URL
	/// replaces the base entirely.
	pub fn resolve(&self, resource: &str) -> Result<Url> {
		self.base_url.join(resource).map_err(|source| Error::InvalidResource {
			resource: resource.to_owned(),
			source,
		})
	}

	/// Builds the authenticated `GET` request [`ApiClient::get`] would send.
	///
	/// When `query_args` is provided, its encoding replaces any query carried by `resource`.
	pub fn build_get(&self, resource: &str, query_args: Option<&QueryArgs>) -> Result<ApiRequest> {
		let mut url = self.resolve(resource)?;

		if let Some(args) = query_args {
			args.apply_to(&mut url);
		}

		let mut request = ApiRequest::get(url);

		self.authenticate(&mut request)?;

		Ok(request)
	}

	/// Fetches `resource` relative to the base URL.
	///
	/// Any status is returned as a response; only resolution, authentication, and transport
	/// failures are errors.
	pub async fn get(&self, resource: &str, query_args: Option<&QueryArgs>) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Get;

		let span = CallSpan::new(KIND, "get");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = self.build_get(resource, query_args)?;

				self.pipeline(KIND, request).await
			})
			.await;

		client::record_result(KIND, &result);

		result
	}

	/// Fetches `resource` and decodes its JSON body into `D`.
	///
	/// The response must carry status `200` and `Content-Type: application/json` exactly;
	/// anything else is a [`ResponseError`] and nothing is retried.
	pub async fn get_obj<D>(&self, resource: &str, query_args: Option<&QueryArgs>) -> Result<D>
	where
		D: DeserializeOwned,
	{
		const KIND: CallKind = CallKind::GetObj;

		let span = CallSpan::new(KIND, "get_obj");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = self.build_get(resource, query_args)?;
				let response = self.pipeline(KIND, request).await?;

				decode_json(&response).map_err(Error::from)
			})
			.await;

		client::record_result(KIND, &result);

		result
	}

	/// [`ApiClient::get_obj`] writing into a caller-supplied destination.
	///
	/// `destination` is left untouched when the call fails.
	pub async fn get_obj_into<D>(
		&self,
		resource: &str,
		query_args: Option<&QueryArgs>,
		destination: &mut D,
	) -> Result<()>
	where
		D: DeserializeOwned,
	{
		*destination = self.get_obj(resource, query_args).await?;

		Ok(())
	}
}

/// Validates status and content type, then decodes the body of `response` into `D`.
///
/// The status is checked first, so a non-`200` body is never parsed.
pub fn decode_json<D>(response: &ApiResponse) -> Result<D, ResponseError>
where
	D: DeserializeOwned,
{
	if response.status != StatusCode::OK {
		return Err(ResponseError::UnexpectedStatus {
			status: response.status,
			body_preview: body_preview(&response.body),
		});
	}

	let content_type = response.content_type();

	if content_type != JSON_CONTENT_TYPE {
		return Err(ResponseError::NotJson { content_type: content_type.to_owned() });
	}

	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ResponseError::Decode { target: std::any::type_name::<D>(), source })
}

fn body_preview(body: &[u8]) -> String {
	let end = body.len().min(BODY_PREVIEW_LIMIT);

	String::from_utf8_lossy(&body[..end]).into_owned()
}
