//! Normalized user shape returned by every social driver.

// self
use crate::{_prelude::*, auth::AccessToken};

/// Provider-side user identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
	/// Numeric identifier (Strava athletes).
	Numeric(u64),
	/// Opaque string identifier.
	Text(String),
}
impl Display for UserId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			UserId::Numeric(id) => write!(f, "{id}"),
			UserId::Text(id) => f.write_str(id),
		}
	}
}
impl From<u64> for UserId {
	fn from(value: u64) -> Self {
		Self::Numeric(value)
	}
}
impl From<&str> for UserId {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}

/// Whether the provider vouches for the user's email address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailVerificationState {
	/// Provider reports the account as verified.
	Verified,
	/// Anything else, including a missing signal.
	Unverified,
}

/// Profile mapped from the user-info payload, before a token is attached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
	/// Provider-side identifier.
	pub id: UserId,
	/// Handle or username.
	pub nick_name: Option<String>,
	/// Display name.
	pub name: Option<String>,
	/// Email address, when the provider shares it.
	pub email: Option<String>,
	/// Avatar URL; `None` when the provider omits it or sends an empty value.
	pub avatar_url: Option<String>,
	/// Email verification signal.
	pub email_verification_state: EmailVerificationState,
	/// Raw provider payload, including fields the mapping does not lift.
	pub original: Value,
}
impl UserProfile {
	/// Attaches the token used to load the profile.
	pub fn with_token(self, token: AccessToken) -> SocialUser {
		let UserProfile {
			id,
			nick_name,
			name,
			email,
			avatar_url,
			email_verification_state,
			original,
		} = self;

		SocialUser {
			id,
			nick_name,
			name,
			email,
			avatar_url,
			email_verification_state,
			original,
			token,
		}
	}
}

/// Normalized user returned by [`SocialDriver::user`](crate::driver::SocialDriver::user) and
/// [`SocialDriver::user_from_token`](crate::driver::SocialDriver::user_from_token).
///
/// Built fresh for every call and never cached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SocialUser {
	/// Provider-side identifier.
	pub id: UserId,
	/// Handle or username.
	pub nick_name: Option<String>,
	/// Display name.
	pub name: Option<String>,
	/// Email address, when the provider shares it.
	pub email: Option<String>,
	/// Avatar URL.
	pub avatar_url: Option<String>,
	/// Email verification signal.
	pub email_verification_state: EmailVerificationState,
	/// Raw provider payload.
	pub original: Value,
	/// Token the profile was loaded with.
	pub token: AccessToken,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn user_ids_accept_numbers_and_strings() {
		let numeric: UserId = serde_json::from_str("42").expect("Numeric id should parse.");
		let text: UserId = serde_json::from_str("\"u-1\"").expect("Text id should parse.");

		assert_eq!(numeric, UserId::Numeric(42));
		assert_eq!(text, UserId::from("u-1"));
		assert_eq!(numeric.to_string(), "42");
	}

	#[test]
	fn verification_state_serializes_lowercase() {
		let json = serde_json::to_string(&EmailVerificationState::Unverified)
			.expect("State should serialize.");

		assert_eq!(json, "\"unverified\"");
	}
}
