//! Provider identifiers used as descriptor names and registry keys.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 64;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Provider identifier cannot be empty.")]
	Empty,
	/// The identifier contains a character outside `[A-Za-z0-9_-]`.
	#[error("Provider identifier contains an unsupported character: {found:?}.")]
	InvalidCharacter {
		/// First offending character.
		found: char,
	},
	/// The identifier exceeded the allowed character count.
	#[error("Provider identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Identifier for a social provider (`strava`, `github`, ...).
///
/// Identifiers double as registry keys and cookie-name prefixes, so they are limited to ASCII
/// letters, digits, `-`, and `_`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderId(String);
impl ProviderId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for ProviderId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for ProviderId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for ProviderId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<ProviderId> for String {
	fn from(value: ProviderId) -> Self {
		value.0
	}
}
impl TryFrom<String> for ProviderId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for ProviderId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for ProviderId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Provider({})", self.0)
	}
}
impl Display for ProviderId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if let Some(found) =
		view.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
	{
		return Err(IdentifierError::InvalidCharacter { found });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_whitespace_and_symbols() {
		assert!(ProviderId::new(" strava").is_err(), "Leading whitespace must be rejected.");
		assert!(ProviderId::new("").is_err());
		assert_eq!(
			ProviderId::new("strava:v3").expect_err("Colons are not allowed."),
			IdentifierError::InvalidCharacter { found: ':' }
		);

		let id = ProviderId::new("strava").expect("Provider fixture should be valid.");

		assert_eq!(id.as_ref(), "strava");
		assert_eq!(format!("{id:?}"), "Provider(strava)");
	}

	#[test]
	fn serde_enforces_validation() {
		let id: ProviderId =
			serde_json::from_str("\"strava\"").expect("Identifier should deserialize successfully.");

		assert_eq!(&*id, "strava");
		assert!(serde_json::from_str::<ProviderId>("\"with space\"").is_err());
		assert!(ProviderId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<ProviderId, u8> = HashMap::from_iter([(
			ProviderId::new("strava").expect("Provider used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("strava"), Some(&7));
	}
}
