//! Process-wide mapping from provider names to driver factories.

// std
use std::sync::OnceLock;
// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	config::DriverConfig,
	driver::SocialDriver,
	error::ConfigError,
	flows::RequestContext,
};

/// Constructor registered for one provider name.
pub type DriverFactory =
	Arc<dyn Fn(RequestContext, DriverConfig) -> Result<Box<dyn SocialDriver>> + Send + Sync>;

static GLOBAL: OnceLock<DriverRegistry> = OnceLock::new();

/// Returns the process-wide registry, populated with the default drivers on first use.
pub fn global() -> &'static DriverRegistry {
	GLOBAL.get_or_init(DriverRegistry::with_default_drivers)
}

/// Thread-safe registry of driver factories keyed by provider identifier.
#[derive(Default)]
pub struct DriverRegistry {
	factories: RwLock<HashMap<ProviderId, DriverFactory>>,
}
impl DriverRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a registry with every driver this crate ships.
	pub fn with_default_drivers() -> Self {
		let registry = Self::new();

		#[cfg(feature = "reqwest")]
		{
			if let Ok(id) = ProviderId::new(crate::strava::PROVIDER_NAME) {
				registry.extend(id, Arc::new(strava_factory));
			}
		}

		registry
	}

	/// Registers or replaces the factory for `provider`.
	pub fn extend(&self, provider: ProviderId, factory: DriverFactory) {
		self.factories.write().insert(provider, factory);
	}

	/// Whether `name` has a registered factory.
	pub fn contains(&self, name: &str) -> bool {
		self.factories.read().contains_key(name)
	}

	/// Registered provider names, sorted.
	pub fn names(&self) -> Vec<ProviderId> {
		let mut names = self.factories.read().keys().cloned().collect::<Vec<_>>();

		names.sort();

		names
	}

	/// Builds the driver registered under `name` for the current request.
	pub fn make(
		&self,
		name: &str,
		ctx: RequestContext,
		config: DriverConfig,
	) -> Result<Box<dyn SocialDriver>> {
		let factory = self
			.factories
			.read()
			.get(name)
			.cloned()
			.ok_or_else(|| ConfigError::UnknownDriver { name: name.to_owned() })?;

		factory(ctx, config)
	}
}
impl Debug for DriverRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DriverRegistry").field("providers", &self.names()).finish()
	}
}

#[cfg(feature = "reqwest")]
fn strava_factory(ctx: RequestContext, config: DriverConfig) -> Result<Box<dyn SocialDriver>> {
	Ok(Box::new(crate::strava::StravaDriver::new(ctx, config)?))
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;

	fn config() -> DriverConfig {
		DriverConfig::new(
			"client",
			"secret",
			Url::parse("https://app.example.com/cb").expect("Callback URL fixture should parse."),
		)
	}

	#[test]
	fn global_registry_ships_strava() {
		let driver = global()
			.make("strava", RequestContext::new().with_param("error", "user_denied"), config())
			.expect("The Strava driver should be registered.");

		assert_eq!(driver.provider().to_string(), "strava");
		assert!(driver.access_denied());
	}

	#[test]
	fn unknown_names_are_rejected() {
		let err = DriverRegistry::new()
			.make("strava", RequestContext::new(), config())
			.expect_err("Empty registries resolve nothing.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::UnknownDriver { ref name }) if name == "strava"
		));
	}

	#[test]
	fn extend_replaces_existing_factories() {
		let registry = DriverRegistry::with_default_drivers();
		let id = ProviderId::new("strava").expect("Identifier fixture should be valid.");

		registry.extend(
			id,
			Arc::new(|_: RequestContext, _: DriverConfig| -> Result<Box<dyn SocialDriver>> {
				Err(ConfigError::UnknownDriver { name: "replaced".into() }.into())
			}),
		);

		assert_eq!(registry.names().len(), 1);
		assert!(registry.make("strava", RequestContext::new(), config()).is_err());
	}
}
