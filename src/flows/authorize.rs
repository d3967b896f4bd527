// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{ProviderScope, ScopeList},
	flows::StateCookie,
	provider::ProviderDescriptor,
};

const STATE_LEN: usize = 32;

/// Hook that adjusts the authorize request before the redirect URL is rendered.
pub type AuthorizeCustomizer<S> = dyn Fn(&mut AuthorizeRequest<S>) + Send + Sync;

/// Mutable view over the authorize request handed to redirect customizers.
///
/// `response_type`, `client_id`, and `redirect_uri` are seeded by the flow and may be
/// overwritten through [`AuthorizeRequest::param`]. The scope and state parameters are always
/// rendered by the flow itself.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthorizeRequest<S>
where
	S: ProviderScope,
{
	scopes: ScopeList<S>,
	params: Vec<(String, String)>,
}
impl<S> AuthorizeRequest<S>
where
	S: ProviderScope,
{
	pub(crate) fn new(client_id: &str, redirect_uri: &Url, scopes: ScopeList<S>) -> Self {
		let params = vec![
			("response_type".into(), "code".into()),
			("client_id".into(), client_id.into()),
			("redirect_uri".into(), redirect_uri.to_string()),
		];

		Self { scopes, params }
	}

	/// Replaces the requested scopes.
	pub fn scopes<I>(&mut self, scopes: I) -> &mut Self
	where
		I: IntoIterator<Item = S>,
	{
		self.scopes = ScopeList::new(scopes);

		self
	}

	/// Appends scopes to the configured ones.
	pub fn merge_scopes<I>(&mut self, scopes: I) -> &mut Self
	where
		I: IntoIterator<Item = S>,
	{
		self.scopes.extend(scopes);

		self
	}

	/// Drops every requested scope; the scope parameter is then omitted.
	pub fn clear_scopes(&mut self) -> &mut Self {
		self.scopes = ScopeList::default();

		self
	}

	/// Sets a query parameter, replacing any previous value for `key`.
	pub fn param(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
		let key = key.into();
		let value = value.into();

		match self.params.iter_mut().find(|(existing, _)| *existing == key) {
			Some(slot) => slot.1 = value,
			None => self.params.push((key, value)),
		}

		self
	}

	/// Removes a query parameter.
	pub fn clear_param(&mut self, key: &str) -> &mut Self {
		self.params.retain(|(existing, _)| existing != key);

		self
	}

	/// Scopes that will be requested.
	pub fn requested_scopes(&self) -> &ScopeList<S> {
		&self.scopes
	}

	/// Returns the current value of a query parameter.
	pub fn param_value(&self, key: &str) -> Option<&str> {
		self.params.iter().find(|(existing, _)| existing == key).map(|(_, value)| value.as_str())
	}

	pub(crate) fn into_url(self, descriptor: &ProviderDescriptor, state: Option<&str>) -> Url {
		let quirks = &descriptor.quirks;
		let mut url = descriptor.endpoints.authorization.clone();
		let mut pairs = url.query_pairs_mut();

		for (key, value) in &self.params {
			if *key == quirks.scope_param || *key == quirks.state_param {
				continue;
			}

			pairs.append_pair(key, value);
		}

		if let Some(scope) = self.scopes.join(quirks.scope_delimiter) {
			pairs.append_pair(&quirks.scope_param, &scope);
		}
		if let Some(state) = state {
			pairs.append_pair(&quirks.state_param, state);
		}

		drop(pairs);

		url
	}
}

/// Redirect produced by [`AuthorizationCodeFlow::redirect_url`](crate::flows::AuthorizationCodeFlow::redirect_url).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRedirect {
	/// Authorize URL the user agent should be sent to.
	pub url: Url,
	/// Generated state value; `None` for stateless flows.
	pub state: Option<String>,
	/// Cookie carrying the state back to the callback; `None` for stateless flows.
	pub cookie: Option<StateCookie>,
}

pub(crate) fn generate_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::ProviderId;

	fn descriptor(delimiter: char) -> ProviderDescriptor {
		let quirks = crate::provider::ProviderQuirks {
			scope_delimiter: delimiter,
			..Default::default()
		};

		ProviderDescriptor::builder(
			ProviderId::new("demo").expect("Provider identifier fixture should be valid."),
		)
		.authorization_endpoint(
			Url::parse("https://example.com/authorize").expect("Authorize URL should parse."),
		)
		.token_endpoint(Url::parse("https://example.com/token").expect("Token URL should parse."))
		.user_info_endpoint(Url::parse("https://example.com/me").expect("User URL should parse."))
		.quirks(quirks)
		.build()
		.expect("Descriptor fixture should build.")
	}

	fn request() -> AuthorizeRequest<String> {
		AuthorizeRequest::new(
			"client-1",
			&Url::parse("https://app.example.com/cb").expect("Redirect URI should parse."),
			ScopeList::new(["read".to_owned(), "activity:read".to_owned()]),
		)
	}

	#[test]
	fn url_carries_standard_params_in_order() {
		let url = request().into_url(&descriptor(','), Some("s1"));

		assert_eq!(
			url.query(),
			Some(
				"response_type=code&client_id=client-1&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb&scope=read%2Cactivity%3Aread&state=s1"
			)
		);
	}

	#[test]
	fn customizers_replace_and_clear() {
		let mut req = request();

		req.clear_scopes().param("approval_prompt", "force").param("client_id", "other");

		let url = req.into_url(&descriptor(','), None);
		let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();

		assert!(pairs.contains(&("client_id".into(), "other".into())));
		assert!(pairs.contains(&("approval_prompt".into(), "force".into())));
		assert!(pairs.iter().all(|(key, _)| key != "scope" && key != "state"));
	}

	#[test]
	fn merged_scopes_skip_duplicates() {
		let mut req = request();

		req.merge_scopes(["read".to_owned(), "profile:read_all".to_owned()]);

		assert_eq!(req.requested_scopes().join(','), Some("read,activity:read,profile:read_all".into()));
	}

	#[test]
	fn states_are_random_alphanumerics() {
		let first = generate_state();
		let second = generate_state();

		assert_eq!(first.len(), STATE_LEN);
		assert!(first.chars().all(|ch| ch.is_ascii_alphanumeric()));
		assert_ne!(first, second);
	}
}
