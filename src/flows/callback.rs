// crates.io
use url::form_urlencoded;
// self
use crate::_prelude::*;

/// Inbound callback data for a single HTTP request: query parameters plus cookies.
///
/// Hosts build one context per request and hand it to the driver factory. Values are kept as
/// received; cookie signing or encryption is the host's concern.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
	params: BTreeMap<String, String>,
	cookies: BTreeMap<String, String>,
}
impl RequestContext {
	/// Creates an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Captures the query string of the URL the provider redirected to.
	pub fn from_callback_url(url: &Url) -> Self {
		url.query().map(Self::from_query).unwrap_or_default()
	}

	/// Parses a raw `application/x-www-form-urlencoded` query string.
	///
	/// Repeated keys keep the last value.
	pub fn from_query(query: &str) -> Self {
		let params = form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
			.map(|(key, value)| (key.into_owned(), value.into_owned()))
			.collect();

		Self { params, cookies: BTreeMap::new() }
	}

	/// Adds or replaces a callback parameter.
	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(name.into(), value.into());

		self
	}

	/// Adds or replaces a request cookie.
	pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.cookies.insert(name.into(), value.into());

		self
	}

	/// Reads every pair from a raw `Cookie` request header.
	pub fn with_cookie_header(mut self, header: &str) -> Self {
		for pair in header.split(';') {
			if let Some((name, value)) = pair.trim().split_once('=') {
				let name = name.trim();

				if !name.is_empty() {
					self.cookies.insert(name.to_owned(), value.trim().trim_matches('"').to_owned());
				}
			}
		}

		self
	}

	/// Returns a callback parameter by name.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.get(name).map(String::as_str)
	}

	/// Returns a request cookie by name.
	pub fn cookie(&self, name: &str) -> Option<&str> {
		self.cookies.get(name).map(String::as_str)
	}
}

/// `Set-Cookie` directive the host must attach to its response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateCookie {
	/// Cookie name.
	pub name: String,
	/// Cookie value; `None` clears the cookie.
	pub value: Option<String>,
}
impl StateCookie {
	/// Directive that stores `value` under `name`.
	pub fn set(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self { name: name.into(), value: Some(value.into()) }
	}

	/// Directive that expires `name` immediately.
	pub fn clear(name: impl Into<String>) -> Self {
		Self { name: name.into(), value: None }
	}

	/// Renders the directive as a `Set-Cookie` header value.
	pub fn to_header_value(&self) -> String {
		match &self.value {
			Some(value) => format!("{}={value}; Path=/; HttpOnly; SameSite=Lax", self.name),
			None => format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.name),
		}
	}
}
impl Display for StateCookie {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.to_header_value())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn callback_url_params_are_decoded() {
		let url = Url::parse("https://app.example.com/callback?code=abc%20123&state=xyz")
			.expect("Callback URL fixture should parse.");
		let ctx = RequestContext::from_callback_url(&url);

		assert_eq!(ctx.param("code"), Some("abc 123"));
		assert_eq!(ctx.param("state"), Some("xyz"));
		assert_eq!(ctx.param("error"), None);
	}

	#[test]
	fn cookie_header_is_split_into_pairs() {
		let ctx = RequestContext::new()
			.with_cookie_header("session=1; strava_oauth_state=\"abc\" ; malformed; =skip");

		assert_eq!(ctx.cookie("session"), Some("1"));
		assert_eq!(ctx.cookie("strava_oauth_state"), Some("abc"));
		assert_eq!(ctx.cookie("malformed"), None);
	}

	#[test]
	fn state_cookie_directives_render() {
		assert_eq!(
			StateCookie::set("strava_oauth_state", "abc").to_header_value(),
			"strava_oauth_state=abc; Path=/; HttpOnly; SameSite=Lax"
		);
		assert!(StateCookie::clear("strava_oauth_state").to_string().ends_with("Max-Age=0"));
	}
}
