// std
use std::{future::Future, pin::Pin, sync::Arc};
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::Response};
use parking_lot::Mutex;
use serde_json::json;
use thiserror::Error as ThisError;
// self
use strava_oauth2::{
	auth::TokenType,
	config::DriverConfig,
	error::{Error, TransientError, TransportError},
	flows::{ApiRequest, RequestContext},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	oauth::TransportErrorMapper,
	provider::{Endpoint, ProviderStrategy},
	strava::StravaDriver,
	url::{Url, form_urlencoded},
};

#[derive(Debug, ThisError)]
#[error("Recording transport refused the request.")]
struct RefusedError;

#[derive(Default)]
struct Recorder {
	requests: Mutex<Vec<HttpRequest>>,
	refuse: bool,
}

/// Transport that records every request and answers from canned Strava payloads.
#[derive(Clone, Default)]
struct RecordingTransport(Arc<Recorder>);
impl RecordingTransport {
	fn refusing() -> Self {
		Self(Arc::new(Recorder { refuse: true, ..Default::default() }))
	}

	fn requests(&self) -> Vec<(String, String, Vec<u8>)> {
		self.0
			.requests
			.lock()
			.iter()
			.map(|request| (request.method().to_string(), request.uri().to_string(), request.body().clone()))
			.collect()
	}

	fn header(&self, index: usize, name: &str) -> Option<String> {
		self.0.requests.lock().get(index).and_then(|request| {
			request.headers().get(name).and_then(|value| value.to_str().ok()).map(str::to_owned)
		})
	}
}
impl TokenHttpClient for RecordingTransport {
	type Handle = RecordingHandle;
	type TransportError = RefusedError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		RecordingHandle { recorder: Arc::clone(&self.0), slot }
	}
}

struct RecordingHandle {
	recorder: Arc<Recorder>,
	slot: ResponseMetadataSlot,
}
impl<'c> AsyncHttpClient<'c> for RecordingHandle {
	type Error = HttpClientError<RefusedError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let is_token = request.uri().path().ends_with("/oauth/token");

			self.recorder.requests.lock().push(request);

			if self.recorder.refuse {
				self.slot.store(ResponseMetadata { status: Some(429) });

				return Err(HttpClientError::Reqwest(Box::new(RefusedError)));
			}

			let body = if is_token {
				json!({
					"access_token": "recorded-token",
					"token_type": "bearer",
					"expires_in": 3600,
				})
			} else {
				json!({ "id": 99, "username": "recorded", "state": "active" })
			};

			self.slot.store(ResponseMetadata { status: Some(200) });

			Ok(Response::builder()
				.status(200)
				.header("content-type", "application/json")
				.body(body.to_string().into_bytes())?)
		})
	}
}

/// Reports throttled responses as transient and everything else as network failures.
struct NetworkMapper;
impl TransportErrorMapper<RefusedError> for NetworkMapper {
	fn map_transport_error(
		&self,
		_strategy: &dyn ProviderStrategy,
		endpoint: Endpoint,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<RefusedError>,
	) -> Error {
		match metadata {
			Some(ResponseMetadata { status: Some(429) }) =>
				TransientError::Upstream { endpoint, message: error.to_string(), status: Some(429) }
					.into(),
			_ => TransportError::network(endpoint, error).into(),
		}
	}
}

fn config() -> DriverConfig {
	DriverConfig::new(
		"client-fake",
		"secret-fake",
		Url::parse("https://app.example.com/strava/callback")
			.expect("Callback URL should parse successfully."),
	)
}

fn driver(
	ctx: RequestContext,
	transport: RecordingTransport,
) -> StravaDriver<RecordingTransport, NetworkMapper> {
	StravaDriver::with_http_client(ctx, config(), transport, Arc::new(NetworkMapper))
		.expect("Strava driver should build with a custom transport.")
}

#[tokio::test]
async fn user_from_token_sends_one_customized_request() {
	let transport = RecordingTransport::default();
	let driver = driver(RequestContext::new(), transport.clone());
	let customize = |request: &mut ApiRequest| {
		request.header("X-Request-Id", "req-1").param("include", "stats");
	};
	let user = driver
		.user_from_token("caller-token", Some(&customize))
		.await
		.expect("User should load through the custom transport.");
	let requests = transport.requests();

	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].0, "GET");
	assert_eq!(requests[0].1, "https://www.strava.com/api/v3/athlete?format=json&include=stats");
	assert_eq!(transport.header(0, "accept").as_deref(), Some("application/json"));
	assert_eq!(transport.header(0, "authorization").as_deref(), Some("Bearer caller-token"));
	assert_eq!(transport.header(0, "x-request-id").as_deref(), Some("req-1"));
	assert_eq!(user.token.token.expose(), "caller-token");
	assert_eq!(user.token.token_type, TokenType::Bearer);
	assert_eq!(user.nick_name.as_deref(), Some("recorded"));
}

#[tokio::test]
async fn user_posts_credentials_in_the_form_body() {
	let transport = RecordingTransport::default();
	let ctx = RequestContext::new()
		.with_param("code", "code-fake")
		.with_param("state", "state-fake")
		.with_cookie_header("strava_oauth_state=state-fake");
	let user = driver(ctx, transport.clone()).user(None).await.expect("User should load.");
	let requests = transport.requests();

	assert_eq!(requests.len(), 2);
	assert_eq!(requests[0].0, "POST");
	assert_eq!(requests[0].1, "https://www.strava.com/api/v3/oauth/token");

	let form = form_urlencoded::parse(&requests[0].2).into_owned().collect::<Vec<_>>();

	assert!(form.contains(&("grant_type".into(), "authorization_code".into())));
	assert!(form.contains(&("code".into(), "code-fake".into())));
	assert!(form.contains(&("client_id".into(), "client-fake".into())));
	assert!(form.contains(&("client_secret".into(), "secret-fake".into())));
	assert!(form.contains(&(
		"redirect_uri".into(),
		"https://app.example.com/strava/callback".into()
	)));
	assert_eq!(transport.header(0, "authorization"), None);
	assert_eq!(requests[1].0, "GET");
	assert_eq!(transport.header(1, "authorization").as_deref(), Some("Bearer recorded-token"));
	assert_eq!(user.token.token.expose(), "recorded-token");
}

#[tokio::test]
async fn transport_failures_go_through_the_mapper() {
	let transport = RecordingTransport::refusing();
	let err = driver(RequestContext::new(), transport.clone())
		.user_from_token("caller-token", None)
		.await
		.expect_err("Refused requests should fail.");

	assert_eq!(transport.requests().len(), 1);
	assert!(matches!(
		err,
		Error::Transient(TransientError::Upstream {
			endpoint: Endpoint::UserInfo,
			status: Some(429),
			..
		})
	));
}
