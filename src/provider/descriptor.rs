//! Provider descriptor data structures shared by all flows.
//!
//! The module exposes validated metadata and builder utilities so providers can describe
//! their endpoints and callback conventions in a transport-agnostic way.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{_prelude::*, auth::ProviderId};

/// Preferred client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Provider endpoints contacted over the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
	/// Token endpoint used for the code exchange.
	Token,
	/// Endpoint returning the authenticated user's profile.
	UserInfo,
}
impl Endpoint {
	/// Returns a stable label suitable for messages, span fields, and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			Endpoint::Token => "token",
			Endpoint::UserInfo => "user_info",
		}
	}
}
impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint users are redirected to.
	pub authorization: Url,
	/// Token endpoint used for the code exchange.
	pub token: Url,
	/// User-info endpoint queried with the access token.
	pub user_info: Url,
}

/// Immutable provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Preferred client authentication mechanism.
	pub preferred_client_auth_method: ClientAuthMethod,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Name of the cookie carrying the redirect state.
	///
	/// Falls back to `<provider>_oauth_state` unless the quirks override it.
	pub fn state_cookie_name(&self) -> String {
		match self.quirks.state_cookie.as_deref() {
			Some(name) => name.to_owned(),
			None => format!("{}_oauth_state", self.id),
		}
	}

	/// Returns the URL for a network endpoint.
	pub fn endpoint(&self, endpoint: Endpoint) -> &Url {
		match endpoint {
			Endpoint::Token => &self.endpoints.token,
			Endpoint::UserInfo => &self.endpoints.user_info,
		}
	}
}
