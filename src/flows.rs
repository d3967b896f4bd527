//! Generic Authorization Code flow shared by every social driver.
//!
//! [`AuthorizationCodeFlow`] owns the HTTP transport, the provider descriptor and strategy,
//! the client registration, and the user-mapping function supplied by a concrete driver. It
//! covers redirect building, callback inspection, the code exchange, and the authenticated
//! user-info request, so drivers only describe what differs per provider.

mod authorize;
mod callback;
mod user_info;

pub use authorize::*;
pub use callback::*;
pub use user_info::*;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ProviderScope, ScopeList, SocialUser, UserProfile},
	error::UserInfoError,
	http::TokenHttpClient,
	oauth::{CodeExchange, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Error label reported when the callback carries neither an error nor a code.
pub const UNKNOWN_ERROR: &str = "unknown_error";

/// Maps a raw user-info payload into a normalized profile.
pub type UserMapper = fn(Value) -> Result<UserProfile, UserInfoError>;

#[cfg(feature = "reqwest")]
/// Flow specialized for the crate's default reqwest transport stack.
pub type ReqwestAuthorizationCodeFlow<S> =
	AuthorizationCodeFlow<S, ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Authorization Code flow bound to one provider, one client registration, and one request.
#[derive(Clone)]
pub struct AuthorizationCodeFlow<S, C, M>
where
	S: ProviderScope,
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for the token exchange and the user-info request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Provider descriptor that defines endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// Strategy responsible for token request adjustments and error classification.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret sent during the code exchange.
	pub client_secret: Option<String>,
	/// Callback URL registered with the provider.
	pub redirect_uri: Url,
	/// Scopes requested on redirect.
	pub scopes: ScopeList<S>,
	/// Query parameters always sent to the user-info endpoint.
	pub user_info_params: Vec<(String, String)>,
	user_mapper: UserMapper,
	ctx: RequestContext,
	stateless: bool,
}
impl<S, C, M> AuthorizationCodeFlow<S, C, M>
where
	S: ProviderScope,
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a flow that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		redirect_uri: Url,
		user_mapper: UserMapper,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			descriptor,
			strategy: Arc::new(DefaultProviderStrategy),
			client_id: client_id.into(),
			client_secret: None,
			redirect_uri,
			scopes: ScopeList::default(),
			user_info_params: Vec::new(),
			user_mapper,
			ctx: RequestContext::default(),
			stateless: false,
		}
	}

	/// Replaces the strategy used during the code exchange.
	pub fn with_strategy(mut self, strategy: Arc<dyn ProviderStrategy>) -> Self {
		self.strategy = strategy;

		self
	}

	/// Sets or replaces the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the scopes requested on redirect.
	pub fn with_scopes<I>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
	{
		self.scopes = ScopeList::new(scopes);

		self
	}

	/// Adds a query parameter sent with every user-info request.
	pub fn with_user_info_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.user_info_params.push((key.into(), value.into()));

		self
	}

	/// Binds the flow to the callback parameters and cookies of the current request.
	pub fn load_state(mut self, ctx: RequestContext) -> Self {
		self.ctx = ctx;

		self
	}

	/// Disables state generation on redirect and state verification on callback.
	pub fn stateless(mut self) -> Self {
		self.stateless = true;

		self
	}

	/// Whether state handling is disabled.
	pub fn is_stateless(&self) -> bool {
		self.stateless
	}

	/// Request context the flow inspects on callback.
	pub fn context(&self) -> &RequestContext {
		&self.ctx
	}

	/// Builds the authorize redirect, generating a fresh state unless the flow is stateless.
	pub fn redirect_url(&self, customize: Option<&AuthorizeCustomizer<S>>) -> AuthorizationRedirect {
		let _guard = FlowSpan::new(FlowKind::Redirect, "redirect_url").entered();

		obs::record_flow_outcome(FlowKind::Redirect, FlowOutcome::Attempt);

		let mut request =
			AuthorizeRequest::new(&self.client_id, &self.redirect_uri, self.scopes.clone());

		if let Some(customize) = customize {
			customize(&mut request);
		}

		let state = if self.stateless { None } else { Some(generate_state()) };
		let url = request.into_url(&self.descriptor, state.as_deref());
		let cookie = state
			.as_ref()
			.map(|value| StateCookie::set(self.descriptor.state_cookie_name(), value.as_str()));

		obs::record_flow_outcome(FlowKind::Redirect, FlowOutcome::Success);

		AuthorizationRedirect { url, state, cookie }
	}

	/// True when the state cookie is missing or differs from the returned state parameter.
	///
	/// Always false for stateless flows.
	pub fn state_mismatch(&self) -> bool {
		if self.stateless {
			return false;
		}

		let expected = self
			.ctx
			.cookie(&self.descriptor.state_cookie_name())
			.filter(|value| !value.is_empty());
		let returned = self.ctx.param(&self.descriptor.quirks.state_param);

		match (expected, returned) {
			(Some(expected), Some(returned)) => expected != returned,
			_ => true,
		}
	}

	/// Callback error, or [`UNKNOWN_ERROR`] when the callback carries no code either.
	pub fn error(&self) -> Option<&str> {
		if let Some(error) = self.error_param() {
			return Some(error);
		}
		if self.code().is_none() {
			return Some(UNKNOWN_ERROR);
		}

		None
	}

	/// Whether the callback reports an error or lacks a code.
	pub fn has_error(&self) -> bool {
		self.error().is_some()
	}

	/// Authorization code returned on callback.
	pub fn code(&self) -> Option<&str> {
		self.ctx.param(&self.descriptor.quirks.code_param).filter(|code| !code.is_empty())
	}

	/// Whether the user refused consent, according to the provider's denial literal.
	pub fn access_denied(&self) -> bool {
		self.error_param() == Some(self.descriptor.quirks.access_denied_error.as_str())
	}

	/// Directive removing the state cookie once the callback has been handled.
	pub fn clear_state_cookie(&self) -> StateCookie {
		StateCookie::clear(self.descriptor.state_cookie_name())
	}

	/// Verifies the callback and trades its code for an access token.
	///
	/// Callback errors and state mismatches are reported before any network call.
	pub async fn access_token(&self) -> Result<AccessToken> {
		let span = FlowSpan::new(FlowKind::CodeExchange, "access_token");

		obs::record_flow_outcome(FlowKind::CodeExchange, FlowOutcome::Attempt);

		let result = span.instrument(self.exchange_code()).await;

		obs::record_flow_outcome(FlowKind::CodeExchange, FlowOutcome::of(&result));

		result
	}

	/// Loads the user-info payload with `token` and maps it into a profile.
	pub async fn fetch_profile(
		&self,
		token: &AccessToken,
		customize: Option<&RequestCustomizer>,
	) -> Result<UserProfile> {
		let span = FlowSpan::new(FlowKind::UserInfo, "fetch_profile");

		obs::record_flow_outcome(FlowKind::UserInfo, FlowOutcome::Attempt);

		let result = span.instrument(self.load_profile(token, customize)).await;

		obs::record_flow_outcome(FlowKind::UserInfo, FlowOutcome::of(&result));

		result
	}

	/// Completes the callback: code exchange, user-info request, and mapping.
	pub async fn user(&self, customize: Option<&RequestCustomizer>) -> Result<SocialUser> {
		let token = self.access_token().await?;
		let profile = self.fetch_profile(&token, customize).await?;

		Ok(profile.with_token(token))
	}

	/// Loads the user behind a caller-held bearer token without touching the token endpoint.
	pub async fn user_from_token(
		&self,
		token: &str,
		customize: Option<&RequestCustomizer>,
	) -> Result<SocialUser> {
		let token = AccessToken::bearer(token);
		let profile = self.fetch_profile(&token, customize).await?;

		Ok(profile.with_token(token))
	}

	fn error_param(&self) -> Option<&str> {
		self.ctx.param(&self.descriptor.quirks.error_param).filter(|error| !error.is_empty())
	}

	async fn exchange_code(&self) -> Result<AccessToken> {
		if let Some(error) = self.error() {
			return Err(Error::MissingCode { error: error.to_owned() });
		}
		if self.state_mismatch() {
			return Err(Error::StateMismatch);
		}

		let Some(code) = self.code() else {
			return Err(Error::MissingCode { error: UNKNOWN_ERROR.into() });
		};
		let exchange = CodeExchange::from_descriptor(
			&self.descriptor,
			&self.client_id,
			self.client_secret.as_deref(),
			&self.redirect_uri,
			Arc::clone(&self.http_client),
			Arc::clone(&self.transport_mapper),
		)?;

		exchange.exchange(self.strategy.as_ref(), code).await
	}

	async fn load_profile(
		&self,
		token: &AccessToken,
		customize: Option<&RequestCustomizer>,
	) -> Result<UserProfile> {
		let mut request = ApiRequest::get(self.descriptor.endpoints.user_info.clone());

		for (key, value) in &self.user_info_params {
			request.param(key, value);
		}

		request
			.header("Accept", "application/json")
			.header("Authorization", format!("Bearer {}", token.token.expose()));

		if let Some(customize) = customize {
			customize(&mut request);
		}

		let payload = user_info::fetch_json(
			self.http_client.as_ref(),
			self.transport_mapper.as_ref(),
			self.strategy.as_ref(),
			request,
		)
		.await?;

		Ok((self.user_mapper)(payload)?)
	}
}
#[cfg(feature = "reqwest")]
impl<S> AuthorizationCodeFlow<S, ReqwestHttpClient, ReqwestTransportErrorMapper>
where
	S: ProviderScope,
{
	/// Creates a flow backed by [`ReqwestHttpClient::shared`].
	pub fn new(
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		redirect_uri: Url,
		user_mapper: UserMapper,
	) -> Self {
		Self::with_http_client(
			descriptor,
			client_id,
			redirect_uri,
			user_mapper,
			ReqwestHttpClient::shared(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<S, C, M> Debug for AuthorizationCodeFlow<S, C, M>
where
	S: ProviderScope,
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCodeFlow")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("redirect_uri", &self.redirect_uri)
			.field("scopes", &self.scopes)
			.field("stateless", &self.stateless)
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::auth::{EmailVerificationState, ProviderId, UserId};

	fn mapper(payload: Value) -> Result<UserProfile, UserInfoError> {
		Ok(UserProfile {
			id: UserId::from("fixed"),
			nick_name: None,
			name: None,
			email: None,
			avatar_url: None,
			email_verification_state: EmailVerificationState::Unverified,
			original: payload,
		})
	}

	fn flow(ctx: RequestContext) -> ReqwestAuthorizationCodeFlow<String> {
		let descriptor = ProviderDescriptor::builder(
			ProviderId::new("demo").expect("Provider identifier fixture should be valid."),
		)
		.authorization_endpoint(
			Url::parse("https://example.com/authorize").expect("Authorize URL should parse."),
		)
		.token_endpoint(Url::parse("https://example.com/token").expect("Token URL should parse."))
		.user_info_endpoint(Url::parse("https://example.com/me").expect("User URL should parse."))
		.build()
		.expect("Descriptor fixture should build.");

		AuthorizationCodeFlow::new(
			descriptor,
			"client",
			Url::parse("https://app.example.com/cb").expect("Redirect URI should parse."),
			mapper,
		)
		.with_scopes(["email".to_owned(), "profile".to_owned()])
		.load_state(ctx)
	}

	#[test]
	fn redirect_sets_state_cookie_matching_url() {
		let redirect = flow(RequestContext::new()).redirect_url(None);
		let state = redirect.state.clone().expect("Stateful flows generate a state.");
		let cookie = redirect.cookie.expect("Stateful flows emit a cookie.");

		assert_eq!(cookie.name, "demo_oauth_state");
		assert_eq!(cookie.value.as_deref(), Some(state.as_str()));
		assert!(redirect.url.query_pairs().any(|(key, value)| key == "state" && value == state));
		assert!(
			redirect.url.query_pairs().any(|(key, value)| key == "scope" && value == "email profile")
		);
	}

	#[test]
	fn stateless_redirects_skip_state() {
		let redirect = flow(RequestContext::new()).stateless().redirect_url(None);

		assert!(redirect.state.is_none());
		assert!(redirect.cookie.is_none());
		assert!(redirect.url.query_pairs().all(|(key, _)| key != "state"));
	}

	#[test]
	fn state_mismatch_cases() {
		let matching = RequestContext::new()
			.with_param("state", "abc")
			.with_cookie("demo_oauth_state", "abc");

		assert!(!flow(matching.clone()).state_mismatch());
		assert!(flow(matching.clone().with_param("state", "xyz")).state_mismatch());
		assert!(flow(RequestContext::new().with_param("state", "abc")).state_mismatch());
		assert!(flow(RequestContext::new().with_cookie("demo_oauth_state", "abc")).state_mismatch());
		assert!(!flow(RequestContext::new()).stateless().state_mismatch());
	}

	#[test]
	fn error_reporting_follows_callback_params() {
		let with_code = flow(RequestContext::new().with_param("code", "c"));
		let without_code = flow(RequestContext::new());
		let denied = flow(RequestContext::new().with_param("error", "access_denied"));

		assert_eq!(with_code.error(), None);
		assert!(!with_code.has_error());
		assert_eq!(without_code.error(), Some(UNKNOWN_ERROR));
		assert!(denied.access_denied());
		assert_eq!(denied.error(), Some("access_denied"));
	}

	#[tokio::test]
	async fn callback_errors_fail_before_exchange() {
		let denied = flow(RequestContext::new().with_param("error", "access_denied"));
		let err = denied.access_token().await.expect_err("Denied callbacks must fail.");

		assert!(matches!(err, Error::MissingCode { ref error } if error == "access_denied"));

		let mismatched = flow(
			RequestContext::new()
				.with_param("code", "c")
				.with_param("state", "one")
				.with_cookie("demo_oauth_state", "two"),
		);
		let err = mismatched.access_token().await.expect_err("Mismatched state must fail.");

		assert!(matches!(err, Error::StateMismatch));
	}

	#[test]
	fn debug_hides_client_secret() {
		let rendered = format!("{:?}", flow(RequestContext::new()).with_client_secret("hidden"));

		assert!(rendered.contains("client_secret_set: true"));
		assert!(!rendered.contains("hidden"));
	}
}
