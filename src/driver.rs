//! Object-safe driver contract used by the registry.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ProviderId, SocialUser},
	flows::{AuthorizationRedirect, AuthorizeCustomizer, RequestCustomizer, StateCookie},
	strava::StravaScope,
};

/// Boxed future returned by [`SocialDriver`] operations.
pub type DriverFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Social login driver bound to one incoming request.
///
/// Drivers are built per request by a [`DriverFactory`](crate::registry::DriverFactory) and
/// hold no state beyond that request. Every operation that touches the network resolves at a
/// single I/O point and never retries.
pub trait SocialDriver
where
	Self: Send + Sync,
{
	/// Provider identifier the driver was registered under.
	fn provider(&self) -> &ProviderId;

	/// Builds the authorize redirect; `customize` may adjust scopes and parameters first.
	fn redirect_url(
		&self,
		customize: Option<&AuthorizeCustomizer<StravaScope>>,
	) -> AuthorizationRedirect;

	/// Converts the driver into one that neither issues nor verifies a state.
	fn into_stateless(self: Box<Self>) -> Box<dyn SocialDriver>;

	/// Whether the user refused consent on the provider side.
	fn access_denied(&self) -> bool;

	/// Whether the returned state fails verification.
	fn state_mismatch(&self) -> bool;

	/// Whether the callback reports an error or lacks a code.
	fn has_error(&self) -> bool;

	/// Callback error label, if any.
	fn error(&self) -> Option<&str>;

	/// Authorization code returned on callback.
	fn code(&self) -> Option<&str>;

	/// Directive clearing the consumed state cookie.
	fn clear_state_cookie(&self) -> StateCookie;

	/// Verifies the callback and exchanges its code without loading the profile.
	fn access_token<'a>(&'a self) -> DriverFuture<'a, AccessToken>;

	/// Exchanges the callback code and loads the normalized user.
	fn user<'a>(&'a self, customize: Option<&'a RequestCustomizer>) -> DriverFuture<'a, SocialUser>;

	/// Loads the normalized user behind a caller-held bearer token.
	fn user_from_token<'a>(
		&'a self,
		token: &'a str,
		customize: Option<&'a RequestCustomizer>,
	) -> DriverFuture<'a, SocialUser>;
}
impl Debug for dyn SocialDriver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SocialDriver").field("provider", self.provider()).finish()
	}
}
