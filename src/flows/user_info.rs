// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest,
	http::{Method, Request},
};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, UserInfoError},
	http::{ResponseMetadataSlot, TokenHttpClient},
	oauth::TransportErrorMapper,
	provider::{Endpoint, ProviderStrategy, strategy::truncate_preview},
};

/// Hook that adjusts the user-info request before it is sent.
///
/// Runs synchronously, exactly once, after the driver has set its own headers and parameters.
pub type RequestCustomizer = dyn Fn(&mut ApiRequest) + Send + Sync;

/// Authenticated GET request sent to the user-info endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	url: Url,
	headers: Vec<(String, String)>,
}
impl ApiRequest {
	pub(crate) fn get(url: Url) -> Self {
		Self { url, headers: Vec::new() }
	}

	/// Sets a header, replacing any previous value (names compare case-insensitively).
	pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
		let name = name.into();
		let value = value.into();

		match self.headers.iter_mut().find(|(existing, _)| existing.eq_ignore_ascii_case(&name)) {
			Some(slot) => slot.1 = value,
			None => self.headers.push((name, value)),
		}

		self
	}

	/// Removes a header.
	pub fn clear_header(&mut self, name: &str) -> &mut Self {
		self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));

		self
	}

	/// Sets a query parameter, replacing any previous value for `key`.
	pub fn param(&mut self, key: &str, value: &str) -> &mut Self {
		let mut pairs = self.query_without(key);

		pairs.push((key.to_owned(), value.to_owned()));
		self.set_query(pairs);

		self
	}

	/// Removes a query parameter.
	pub fn clear_param(&mut self, key: &str) -> &mut Self {
		let pairs = self.query_without(key);

		self.set_query(pairs);

		self
	}

	/// Target URL, including query parameters.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Current value of a header.
	pub fn header_value(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(existing, _)| existing.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	pub(crate) fn into_http_request(self) -> Result<HttpRequest, ConfigError> {
		let mut builder = Request::builder().method(Method::GET).uri(self.url.as_str());

		for (name, value) in &self.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}

		Ok(builder.body(Vec::new())?)
	}

	fn query_without(&self, key: &str) -> Vec<(String, String)> {
		self.url.query_pairs().into_owned().filter(|(existing, _)| existing != key).collect()
	}

	fn set_query(&mut self, pairs: Vec<(String, String)>) {
		if pairs.is_empty() {
			self.url.set_query(None);
		} else {
			self.url.query_pairs_mut().clear().extend_pairs(pairs);
		}
	}
}

/// Sends `request` and parses the response body as JSON.
pub(crate) async fn fetch_json<C, M>(
	http_client: &C,
	mapper: &M,
	strategy: &dyn ProviderStrategy,
	request: ApiRequest,
) -> Result<Value>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let request = request.into_http_request()?;
	let meta = ResponseMetadataSlot::default();
	let handle = http_client.with_metadata(meta.clone());
	let response = handle.call(request).await.map_err(|err| {
		mapper.map_transport_error(strategy, Endpoint::UserInfo, meta.take().as_ref(), err)
	})?;
	let status = response.status();

	if !status.is_success() {
		let body_preview = truncate_preview(String::from_utf8_lossy(response.body()).into_owned());

		return Err(UserInfoError::Status { status: status.as_u16(), body_preview }.into());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(response.body());
	let payload = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| UserInfoError::Parse { source })?;

	Ok(payload)
}
