// self
use crate::_prelude::*;

/// Provider-specific quirks that influence how flows behave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
	/// Callback parameter carrying the authorization code.
	pub code_param: String,
	/// Callback parameter carrying the provider error.
	pub error_param: String,
	/// Callback and authorize parameter carrying the state value.
	pub state_param: String,
	/// Authorize parameter carrying the requested scopes.
	pub scope_param: String,
	/// Error value the provider reports when the user refuses consent.
	pub access_denied_error: String,
	/// Overrides the `<provider>_oauth_state` cookie name.
	pub state_cookie: Option<String>,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self {
			scope_delimiter: ' ',
			code_param: "code".into(),
			error_param: "error".into(),
			state_param: "state".into(),
			scope_param: "scope".into(),
			access_denied_error: "access_denied".into(),
			state_cookie: None,
		}
	}
}
