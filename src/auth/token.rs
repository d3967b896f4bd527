//! Access tokens issued by the code exchange or supplied by callers.

// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping token material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Token types accepted by the driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
	/// RFC 6750 bearer token.
	#[default]
	Bearer,
}
impl TokenType {
	/// Returns the lowercase wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenType::Bearer => "bearer",
		}
	}
}
impl Display for TokenType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Access token attached to a [`SocialUser`](crate::auth::SocialUser).
///
/// Created once per successful exchange and never persisted by this crate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
	/// Access token secret; callers must avoid logging it.
	pub token: TokenSecret,
	/// Token type, always `bearer`.
	#[serde(rename = "type")]
	pub token_type: TokenType,
	/// Refresh token, when the token endpoint issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Expiry instant derived from `expires_in`, when the token endpoint reported one.
	pub expires_at: Option<OffsetDateTime>,
}
impl AccessToken {
	/// Wraps a caller-held bearer token that did not come from the code exchange.
	pub fn bearer(token: impl Into<String>) -> Self {
		Self {
			token: TokenSecret::new(token),
			token_type: TokenType::Bearer,
			refresh_token: None,
			expires_at: None,
		}
	}

	/// Returns true when the token carries an expiry that lies at or before `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}
}
