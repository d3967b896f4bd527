//! Loads the athlete behind an access token the host already holds.

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::eyre};
use url::Url;
// self
use strava_oauth2::{
	config::DriverConfig,
	flows::{ApiRequest, RequestContext},
	strava::StravaDriver,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let token = env::args().nth(1).ok_or_else(|| eyre!("Usage: athlete_from_token <token>"))?;
	let config = DriverConfig::new(
		env::var("STRAVA_CLIENT_ID").unwrap_or_else(|_| "demo-client".into()),
		env::var("STRAVA_CLIENT_SECRET").unwrap_or_else(|_| "demo-secret".into()),
		Url::parse("https://app.example.com/strava/callback")?,
	);
	let driver = StravaDriver::new(RequestContext::new(), config)?;
	let tag_request = |request: &mut ApiRequest| {
		request.header("User-Agent", "strava-oauth2-demo");
	};
	let user = driver.user_from_token(&token, Some(&tag_request)).await?;

	println!("Athlete {} ({:?}).", user.id, user.name);
	println!("{}", serde_json::to_string_pretty(&user.original)?);

	Ok(())
}
