//! Strava driver: endpoints, scopes, error classification, and athlete mapping.
//!
//! Strava follows the Authorization Code flow closely but deviates in a few places: scopes are
//! joined with `,`, a refused consent comes back as `error=user_denied`, the token endpoint
//! answers failures with its own fault document, and the athlete endpoint wants
//! `format=json`. Everything else is handled by [`AuthorizationCodeFlow`].

// self
use crate::{
	_prelude::*,
	auth::{
		AccessToken, EmailVerificationState, ProviderId, ProviderScope, SocialUser, UserId,
		UserProfile,
	},
	config::DriverConfig,
	driver::{DriverFuture, SocialDriver},
	error::{ConfigError, UserInfoError},
	flows::{
		AuthorizationCodeFlow, AuthorizationRedirect, AuthorizeCustomizer, RequestContext,
		RequestCustomizer, StateCookie,
	},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	provider::{
		ClientAuthMethod, ProviderDescriptor, ProviderErrorContext, ProviderErrorKind,
		ProviderQuirks, ProviderStrategy, classify_default,
	},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Registry name of the Strava driver.
pub const PROVIDER_NAME: &str = "strava";
/// Host the default endpoints live on.
pub const DEFAULT_BASE_URL: &str = "https://www.strava.com/";
/// Authorize endpoint path relative to the base URL.
pub const AUTHORIZE_PATH: &str = "oauth/authorize";
/// Token endpoint path relative to the base URL.
pub const ACCESS_TOKEN_PATH: &str = "api/v3/oauth/token";
/// Athlete endpoint path relative to the base URL.
pub const USER_INFO_PATH: &str = "api/v3/athlete";
/// Callback `error` value Strava sends when the athlete refuses consent.
pub const ACCESS_DENIED_ERROR: &str = "user_denied";

#[cfg(feature = "reqwest")]
/// Strava driver backed by the default reqwest transport.
pub type ReqwestStravaDriver = StravaDriver<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Error returned when parsing an unknown Strava scope.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown Strava scope `{scope}`.")]
pub struct ScopeParseError {
	/// The rejected input.
	pub scope: String,
}

/// Scopes Strava grants during authorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StravaScope {
	/// Public segments, routes, profile data, posts, events, club feeds, and leaderboards.
	#[serde(rename = "read")]
	Read,
	/// Private routes, segments, and events.
	#[serde(rename = "read_all")]
	ReadAll,
	/// Every profile field, regardless of visibility.
	#[serde(rename = "profile:read_all")]
	ProfileReadAll,
	/// Profile updates and starred segments.
	#[serde(rename = "profile:write")]
	ProfileWrite,
	/// Activities visible to everyone or followers.
	#[serde(rename = "activity:read")]
	ActivityRead,
	/// Activities including "only you" ones and privacy zones.
	#[serde(rename = "activity:read_all")]
	ActivityReadAll,
	/// Activity creation and updates.
	#[serde(rename = "activity:write")]
	ActivityWrite,
}
impl StravaScope {
	/// Every scope, in Strava's documentation order.
	pub const ALL: [StravaScope; 7] = [
		StravaScope::Read,
		StravaScope::ReadAll,
		StravaScope::ProfileReadAll,
		StravaScope::ProfileWrite,
		StravaScope::ActivityRead,
		StravaScope::ActivityReadAll,
		StravaScope::ActivityWrite,
	];

	/// Wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			StravaScope::Read => "read",
			StravaScope::ReadAll => "read_all",
			StravaScope::ProfileReadAll => "profile:read_all",
			StravaScope::ProfileWrite => "profile:write",
			StravaScope::ActivityRead => "activity:read",
			StravaScope::ActivityReadAll => "activity:read_all",
			StravaScope::ActivityWrite => "activity:write",
		}
	}
}
impl ProviderScope for StravaScope {
	fn as_scope_str(&self) -> &str {
		self.as_str()
	}
}
impl FromStr for StravaScope {
	type Err = ScopeParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		StravaScope::ALL
			.into_iter()
			.find(|scope| scope.as_str() == s)
			.ok_or_else(|| ScopeParseError { scope: s.to_owned() })
	}
}
impl Display for StravaScope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Builds the Strava descriptor, applying endpoint overrides from `config`.
pub fn descriptor(config: &DriverConfig) -> Result<ProviderDescriptor> {
	let base = match &config.base_url {
		Some(base) => with_trailing_slash(base.clone()),
		None =>
			Url::parse(DEFAULT_BASE_URL).map_err(|source| ConfigError::InvalidEndpoint { source })?,
	};
	let quirks = ProviderQuirks {
		scope_delimiter: ',',
		access_denied_error: ACCESS_DENIED_ERROR.into(),
		..Default::default()
	};
	let id = ProviderId::new(PROVIDER_NAME).map_err(ConfigError::from)?;
	let descriptor = ProviderDescriptor::builder(id)
		.authorization_endpoint(resolve(config.authorize_url.as_ref(), &base, AUTHORIZE_PATH)?)
		.token_endpoint(resolve(config.access_token_url.as_ref(), &base, ACCESS_TOKEN_PATH)?)
		.user_info_endpoint(resolve(config.user_info_url.as_ref(), &base, USER_INFO_PATH)?)
		.preferred_client_auth_method(ClientAuthMethod::ClientSecretPost)
		.quirks(quirks)
		.build()
		.map_err(ConfigError::from)?;

	Ok(descriptor)
}

fn with_trailing_slash(mut base: Url) -> Url {
	if !base.path().ends_with('/') {
		let path = format!("{}/", base.path());

		base.set_path(&path);
	}

	base
}

fn resolve(explicit: Option<&Url>, base: &Url, path: &str) -> Result<Url> {
	match explicit {
		Some(url) => Ok(url.clone()),
		None => Ok(base.join(path).map_err(|source| ConfigError::InvalidEndpoint { source })?),
	}
}

/// Classifies Strava's token-endpoint fault documents before falling back to the defaults.
///
/// Strava answers a rejected exchange with
/// `{"message":"Bad Request","errors":[{"resource":"AuthorizationCode","field":"code","code":"invalid"}]}`
/// instead of an RFC 6749 error document.
#[derive(Debug, Default)]
pub struct StravaProviderStrategy;
impl ProviderStrategy for StravaProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		ctx.body_preview
			.as_deref()
			.and_then(classify_fault)
			.unwrap_or_else(|| classify_default(ctx))
	}
}

#[derive(Deserialize)]
struct Fault {
	#[serde(default)]
	errors: Vec<FaultItem>,
}

#[derive(Deserialize)]
struct FaultItem {
	#[serde(default)]
	resource: String,
	#[serde(default)]
	field: String,
}

fn classify_fault(body: &str) -> Option<ProviderErrorKind> {
	let fault = serde_json::from_str::<Fault>(body).ok()?;

	fault.errors.iter().find_map(|item| match (item.resource.as_str(), item.field.as_str()) {
		(_, "code") | ("AuthorizationCode", _) => Some(ProviderErrorKind::InvalidGrant),
		(_, "client_id" | "client_secret") | ("Application", _) =>
			Some(ProviderErrorKind::InvalidClient),
		(_, "scope") => Some(ProviderErrorKind::InsufficientScope),
		_ => None,
	})
}

#[derive(Deserialize)]
struct AthletePayload {
	id: UserId,
	#[serde(default)]
	username: Option<String>,
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	email: Option<String>,
	#[serde(default)]
	avatar_url: Option<String>,
	#[serde(default)]
	state: Option<Value>,
}

/// Maps an athlete payload into a normalized profile.
///
/// `avatar_url` is `None` when absent or empty, and only `state == "active"` counts as a
/// verified email. The whole payload is kept in `original`.
pub fn map_athlete(payload: Value) -> Result<UserProfile, UserInfoError> {
	let athlete: AthletePayload = serde_path_to_error::deserialize(&payload)
		.map_err(|source| UserInfoError::Parse { source })?;
	let email_verification_state =
		if athlete.state.as_ref().and_then(Value::as_str) == Some("active") {
			EmailVerificationState::Verified
		} else {
			EmailVerificationState::Unverified
		};

	Ok(UserProfile {
		id: athlete.id,
		nick_name: athlete.username,
		name: athlete.name,
		email: athlete.email,
		avatar_url: athlete.avatar_url.filter(|url| !url.is_empty()),
		email_verification_state,
		original: payload,
	})
}

/// Strava social driver for one incoming request.
///
/// Built per request from the callback context and the static configuration. All behavior is
/// delegated to the generic [`AuthorizationCodeFlow`] configured with Strava's conventions.
pub struct StravaDriver<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	flow: AuthorizationCodeFlow<StravaScope, C, M>,
}
impl<C, M> StravaDriver<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a driver that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		ctx: RequestContext,
		config: DriverConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let descriptor = descriptor(&config)?;
		let DriverConfig { client_id, client_secret, callback_url, scopes, .. } = config;
		let flow = AuthorizationCodeFlow::with_http_client(
			descriptor,
			client_id,
			callback_url,
			map_athlete,
			http_client,
			mapper,
		)
		.with_strategy(Arc::new(StravaProviderStrategy))
		.with_client_secret(client_secret)
		.with_scopes(scopes.unwrap_or_default())
		.with_user_info_param("format", "json")
		.load_state(ctx);

		Ok(Self { flow })
	}

	/// Disables state generation and verification.
	pub fn stateless(mut self) -> Self {
		self.flow = self.flow.stateless();

		self
	}

	/// Underlying generic flow.
	pub fn flow(&self) -> &AuthorizationCodeFlow<StravaScope, C, M> {
		&self.flow
	}

	/// True iff the callback `error` parameter is exactly `user_denied`.
	pub fn access_denied(&self) -> bool {
		self.flow.access_denied()
	}

	/// Builds the authorize redirect.
	pub fn redirect_url(
		&self,
		customize: Option<&AuthorizeCustomizer<StravaScope>>,
	) -> AuthorizationRedirect {
		self.flow.redirect_url(customize)
	}

	/// See [`AuthorizationCodeFlow::state_mismatch`].
	pub fn state_mismatch(&self) -> bool {
		self.flow.state_mismatch()
	}

	/// See [`AuthorizationCodeFlow::has_error`].
	pub fn has_error(&self) -> bool {
		self.flow.has_error()
	}

	/// See [`AuthorizationCodeFlow::error`].
	pub fn error(&self) -> Option<&str> {
		self.flow.error()
	}

	/// Authorization code returned on callback.
	pub fn code(&self) -> Option<&str> {
		self.flow.code()
	}

	/// Directive clearing `strava_oauth_state`.
	pub fn clear_state_cookie(&self) -> StateCookie {
		self.flow.clear_state_cookie()
	}

	/// Verifies the callback and exchanges the code.
	pub async fn access_token(&self) -> Result<AccessToken> {
		self.flow.access_token().await
	}

	/// Exchanges the callback code, loads the athlete, and normalizes it.
	pub async fn user(&self, customize: Option<&RequestCustomizer>) -> Result<SocialUser> {
		self.flow.user(customize).await
	}

	/// Loads the athlete behind `token` without a code exchange.
	pub async fn user_from_token(
		&self,
		token: &str,
		customize: Option<&RequestCustomizer>,
	) -> Result<SocialUser> {
		self.flow.user_from_token(token, customize).await
	}
}
#[cfg(feature = "reqwest")]
impl StravaDriver<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a driver backed by [`ReqwestHttpClient::shared`].
	pub fn new(ctx: RequestContext, config: DriverConfig) -> Result<Self> {
		Self::with_http_client(
			ctx,
			config,
			ReqwestHttpClient::shared(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for StravaDriver<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StravaDriver").field("flow", &self.flow).finish()
	}
}
impl<C, M> SocialDriver for StravaDriver<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn provider(&self) -> &ProviderId {
		&self.flow.descriptor.id
	}

	fn redirect_url(
		&self,
		customize: Option<&AuthorizeCustomizer<StravaScope>>,
	) -> AuthorizationRedirect {
		self.flow.redirect_url(customize)
	}

	fn into_stateless(self: Box<Self>) -> Box<dyn SocialDriver> {
		Box::new((*self).stateless())
	}

	fn access_denied(&self) -> bool {
		self.flow.access_denied()
	}

	fn state_mismatch(&self) -> bool {
		self.flow.state_mismatch()
	}

	fn has_error(&self) -> bool {
		self.flow.has_error()
	}

	fn error(&self) -> Option<&str> {
		self.flow.error()
	}

	fn code(&self) -> Option<&str> {
		self.flow.code()
	}

	fn clear_state_cookie(&self) -> StateCookie {
		self.flow.clear_state_cookie()
	}

	fn access_token<'a>(&'a self) -> DriverFuture<'a, AccessToken> {
		Box::pin(self.flow.access_token())
	}

	fn user<'a>(&'a self, customize: Option<&'a RequestCustomizer>) -> DriverFuture<'a, SocialUser> {
		Box::pin(self.flow.user(customize))
	}

	fn user_from_token<'a>(
		&'a self,
		token: &'a str,
		customize: Option<&'a RequestCustomizer>,
	) -> DriverFuture<'a, SocialUser> {
		Box::pin(self.flow.user_from_token(token, customize))
	}
}
