//! Driver configuration supplied by the embedding application.

// self
use crate::{_prelude::*, auth::ProviderScope, strava::StravaScope};

/// Static client registration and endpoint overrides for one driver.
///
/// Optional endpoints fall back to the provider defaults; `base_url` (serde alias
/// `strava_url`) rebases every default endpoint onto another host. Immutable once handed to a
/// driver.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "S: Deserialize<'de>", serialize = "S: Serialize"))]
pub struct DriverConfig<S = StravaScope>
where
	S: ProviderScope,
{
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: String,
	/// Callback URL registered with the provider.
	pub callback_url: Url,
	/// Base URL the default endpoints are joined onto.
	#[serde(default, alias = "strava_url")]
	pub base_url: Option<Url>,
	/// Authorize endpoint override.
	#[serde(default)]
	pub authorize_url: Option<Url>,
	/// Token endpoint override.
	#[serde(default)]
	pub access_token_url: Option<Url>,
	/// User-info endpoint override.
	#[serde(default)]
	pub user_info_url: Option<Url>,
	/// Scopes requested on redirect; `None` requests none.
	#[serde(default)]
	pub scopes: Option<Vec<S>>,
}
impl<S> DriverConfig<S>
where
	S: ProviderScope,
{
	/// Creates a configuration with provider-default endpoints and no scopes.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		callback_url: Url,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			callback_url,
			base_url: None,
			authorize_url: None,
			access_token_url: None,
			user_info_url: None,
			scopes: None,
		}
	}

	/// Rebases the default endpoints onto `base`.
	pub fn with_base_url(mut self, base: Url) -> Self {
		self.base_url = Some(base);

		self
	}

	/// Overrides the authorize endpoint.
	pub fn with_authorize_url(mut self, url: Url) -> Self {
		self.authorize_url = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn with_access_token_url(mut self, url: Url) -> Self {
		self.access_token_url = Some(url);

		self
	}

	/// Overrides the user-info endpoint.
	pub fn with_user_info_url(mut self, url: Url) -> Self {
		self.user_info_url = Some(url);

		self
	}

	/// Sets the scopes requested on redirect.
	pub fn with_scopes<I>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
	{
		self.scopes = Some(scopes.into_iter().collect());

		self
	}
}
impl<S> Debug for DriverConfig<S>
where
	S: ProviderScope,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DriverConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("callback_url", &self.callback_url)
			.field("base_url", &self.base_url)
			.field("authorize_url", &self.authorize_url)
			.field("access_token_url", &self.access_token_url)
			.field("user_info_url", &self.user_info_url)
			.field("scopes", &self.scopes)
			.finish()
	}
}
