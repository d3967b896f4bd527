//! Code-exchange facade over the `oauth2` crate and transport error mapping.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenType},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, TokenSecret, TokenType},
	error::{ConfigError, TransientError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{
		ClientAuthMethod, Endpoint, ProviderDescriptor, ProviderErrorContext, ProviderErrorKind,
		ProviderStrategy,
	},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted while calling `endpoint` into a crate error.
	fn map_transport_error(
		&self,
		strategy: &dyn ProviderStrategy,
		endpoint: Endpoint,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		_strategy: &dyn ProviderStrategy,
		endpoint: Endpoint,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(endpoint, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => upstream_error(
				endpoint,
				meta,
				format!("HTTP client error occurred while calling the endpoint: {message}"),
			),
			_ => upstream_error(
				endpoint,
				meta,
				"HTTP client error occurred while calling the endpoint".into(),
			),
		}
	}
}

/// Authorization-code exchange bound to one descriptor and client registration.
pub(crate) struct CodeExchange<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> CodeExchange<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: Option<&str>,
		redirect_uri: &Url,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let redirect_url = RedirectUrl::new(redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url);

		if let Some(secret) = client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.to_owned()));
		}
		if matches!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, http_client, error_mapper })
	}

	/// Trades `code` for an access token.
	pub(crate) async fn exchange(
		&self,
		strategy: &dyn ProviderStrategy,
		code: &str,
	) -> Result<AccessToken> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.request_async(&instrumented)
			.await
			.map_err(|err| {
				map_request_error(strategy, meta.take(), err, self.error_mapper.as_ref())
			})?;
		let token_type = match response.token_type() {
			BasicTokenType::Bearer => TokenType::Bearer,
			other => {
				return Err(ConfigError::UnsupportedTokenType {
					token_type: other.as_ref().to_owned(),
				}
				.into());
			},
		};
		let expires_at = match response.expires_in() {
			Some(expires_in) => {
				let secs = i64::try_from(expires_in.as_secs())
					.map_err(|_| ConfigError::ExpiresInOutOfRange)?;

				Some(OffsetDateTime::now_utc() + Duration::seconds(secs))
			},
			None => None,
		};

		Ok(AccessToken {
			token: TokenSecret::new(response.access_token().secret().to_owned()),
			token_type,
			refresh_token: response.refresh_token().map(|token| TokenSecret::new(token.secret())),
			expires_at,
		})
	}
}

fn map_request_error<E, M>(
	strategy: &dyn ProviderStrategy,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(strategy, response, meta_ref),
		RequestTokenError::Request(error) =>
			mapper.map_transport_error(strategy, Endpoint::Token, meta_ref, error),
		RequestTokenError::Parse(error, body) => map_parse_error(strategy, meta_ref, error, body),
		RequestTokenError::Other(message) => upstream_error(Endpoint::Token, meta_ref, message),
	}
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let mut ctx = ProviderErrorContext::new().with_oauth_error(response.error().as_ref());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	let message = match response.error_description() {
		Some(description) => format!("token endpoint returned an OAuth error: {description}"),
		None => format!("token endpoint returned an OAuth error: {}", response.error().as_ref()),
	};

	classified_error(strategy.classify_token_error(&ctx), message, meta)
}

/// Error bodies that are not RFC 6749 documents still carry a status worth classifying.
fn map_parse_error(
	strategy: &dyn ProviderStrategy,
	meta: Option<&ResponseMetadata>,
	source: serde_path_to_error::Error<serde_json::Error>,
	body: Vec<u8>,
) -> Error {
	let status = meta_status(meta);

	match status {
		Some(code) if code >= 400 => {
			let preview = String::from_utf8_lossy(&body).into_owned();
			let ctx = ProviderErrorContext::new().with_http_status(code).with_body_preview(preview);
			let kind = strategy.classify_token_error(&ctx);
			let message = format!(
				"token endpoint rejected the exchange with HTTP {code}: {}",
				ctx.body_preview.as_deref().unwrap_or_default()
			);

			classified_error(kind, message, meta)
		},
		_ => TransientError::TokenResponseParse { source, status }.into(),
	}
}

fn classified_error(
	kind: ProviderErrorKind,
	message: String,
	meta: Option<&ResponseMetadata>,
) -> Error {
	match kind {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		ProviderErrorKind::Transient => upstream_error(Endpoint::Token, meta, message),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(endpoint: Endpoint, meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::Upstream {
			endpoint,
			message: "request timed out".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
		}
		.into();
	}

	TransportError::network(endpoint, err).into()
}

fn upstream_error(endpoint: Endpoint, meta: Option<&ResponseMetadata>, message: String) -> Error {
	TransientError::Upstream { endpoint, message, status: meta_status(meta) }.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::{auth::ProviderId, http::ReqwestHttpClient, provider::DefaultProviderStrategy};

	fn descriptor(method: ClientAuthMethod) -> ProviderDescriptor {
		let provider_id =
			ProviderId::new("test-provider").expect("Failed to construct provider identifier.");

		ProviderDescriptor::builder(provider_id)
			.authorization_endpoint(
				Url::parse("https://example.com/oauth/authorize")
					.expect("Failed to parse authorization endpoint URL."),
			)
			.token_endpoint(
				Url::parse("https://example.com/oauth/token")
					.expect("Failed to parse token endpoint URL."),
			)
			.user_info_endpoint(
				Url::parse("https://example.com/api/me")
					.expect("Failed to parse user-info endpoint URL."),
			)
			.preferred_client_auth_method(method)
			.build()
			.expect("Failed to build provider descriptor.")
	}

	fn exchange(
		method: ClientAuthMethod,
	) -> Result<CodeExchange<ReqwestHttpClient, ReqwestTransportErrorMapper>> {
		let redirect =
			Url::parse("https://app.example.com/callback").expect("Failed to parse redirect URI.");

		CodeExchange::from_descriptor(
			&descriptor(method),
			"client-id",
			Some("secret"),
			&redirect,
			Arc::new(ReqwestHttpClient::default()),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}

	#[test]
	fn builds_basic_and_post_auth_clients() {
		assert!(exchange(ClientAuthMethod::ClientSecretBasic).is_ok());
		assert!(exchange(ClientAuthMethod::ClientSecretPost).is_ok());
	}

	#[test]
	fn non_oauth_error_bodies_are_classified_by_status() {
		let meta = ResponseMetadata { status: Some(401) };
		let source = serde_path_to_error::deserialize::<_, BasicErrorResponse>(
			&mut serde_json::Deserializer::from_str("{\"message\":\"Authorization Error\"}"),
		)
		.expect_err("A Strava fault body is not an RFC 6749 error document.");
		let err = map_parse_error(
			&DefaultProviderStrategy,
			Some(&meta),
			source,
			b"{\"message\":\"Authorization Error\"}".to_vec(),
		);

		assert!(matches!(err, Error::InvalidClient { .. }));
	}

	#[test]
	fn malformed_success_bodies_stay_parse_errors() {
		let source = serde_path_to_error::deserialize::<_, BasicErrorResponse>(
			&mut serde_json::Deserializer::from_str("not json"),
		)
		.expect_err("Garbage must not parse.");
		let meta = ResponseMetadata { status: Some(200) };
		let err = map_parse_error(&DefaultProviderStrategy, Some(&meta), source, b"not json".to_vec());

		assert!(matches!(
			err,
			Error::Transient(TransientError::TokenResponseParse { status: Some(200), .. })
		));
	}
}
