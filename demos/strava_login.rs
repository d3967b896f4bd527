//! Walks through a Strava login: build the redirect, then finish the callback.
//!
//! Run once without arguments to print the authorize URL and the state cookie. After
//! approving the app, pass the full callback URL and the printed state to load the athlete:
//!
//! ```sh
//! STRAVA_CLIENT_ID=.. STRAVA_CLIENT_SECRET=.. cargo run --example strava_login -- \
//!     "https://app.example.com/strava/callback?code=..&state=.." <state>
//! ```

// std
use std::env;
// crates.io
use color_eyre::Result;
use url::Url;
// self
use strava_oauth2::{config::DriverConfig, flows::RequestContext, registry, strava::StravaScope};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = DriverConfig::new(
		env::var("STRAVA_CLIENT_ID").unwrap_or_else(|_| "demo-client".into()),
		env::var("STRAVA_CLIENT_SECRET").unwrap_or_else(|_| "demo-secret".into()),
		Url::parse("https://app.example.com/strava/callback")?,
	)
	.with_scopes([StravaScope::Read, StravaScope::ActivityRead]);
	let mut args = env::args().skip(1);
	let (Some(callback), Some(state)) = (args.next(), args.next()) else {
		let driver = registry::global().make("strava", RequestContext::new(), config)?;
		let redirect = driver.redirect_url(None);

		println!("Send your athlete to {}.", redirect.url);

		if let Some(cookie) = redirect.cookie {
			println!("Set-Cookie: {cookie}");
		}

		return Ok(());
	};
	let ctx = RequestContext::from_callback_url(&Url::parse(&callback)?)
		.with_cookie("strava_oauth_state", state);
	let driver = registry::global().make("strava", ctx, config)?;

	if driver.access_denied() {
		println!("The athlete declined the authorization request.");

		return Ok(());
	}

	let user = driver.user(None).await?;

	println!("Logged in athlete {} ({:?}).", user.id, user.nick_name);
	println!("Email verification: {:?}.", user.email_verification_state);
	println!("Set-Cookie: {}", driver.clear_state_cookie());

	Ok(())
}
