//! Client configuration: API location, login surface, and refresh policy.

// std
use std::path::Path;
// self
use crate::{_prelude::*, error::ConfigError};

/// Tunables shared by the coordinator and the API facade.
///
/// Documents are deserialized from JSON; every field except `base_url` has a default:
///
/// ```json
/// { "base_url": "https://kyh.example.com/api/", "refresh_timeout_ms": 10000 }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
	/// API root every endpoint path is resolved against. Always ends with `/`.
	#[serde(deserialize_with = "de_base_url")]
	pub base_url: Url,
	/// Route the navigator is sent to when the session cannot be renewed.
	#[serde(default = "ClientConfig::default_login_route")]
	pub login_route: String,
	/// Upper bound on a single refresh call in milliseconds; `null` waits indefinitely.
	#[serde(default = "ClientConfig::default_refresh_timeout_ms")]
	pub refresh_timeout_ms: Option<u64>,
	/// Refresh cycles one request may start or join before its 401 is returned as-is.
	#[serde(default = "ClientConfig::default_max_refresh_rounds")]
	pub max_refresh_rounds: u8,
}
impl ClientConfig {
	const DEFAULT_LOGIN_ROUTE: &'static str = "/login";
	const DEFAULT_MAX_REFRESH_ROUNDS: u8 = 2;
	const DEFAULT_REFRESH_TIMEOUT_MS: u64 = 30_000;

	/// Creates a config for the provided API root with default policy values.
	pub fn new(base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
		Ok(Self {
			base_url: normalize_base_url(base_url.as_ref())?,
			login_route: Self::default_login_route(),
			refresh_timeout_ms: Self::default_refresh_timeout_ms(),
			max_refresh_rounds: Self::DEFAULT_MAX_REFRESH_ROUNDS,
		})
	}

	/// Parses a JSON document, reporting the failing field path on mismatch.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(&mut de).map_err(|source| ConfigError::Parse { source })
	}

	/// Reads and parses a JSON config file.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let raw = std::fs::read_to_string(path)
			.map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
		let config = Self::from_json_str(&raw)?;

		tracing::debug!(path = %path.display(), base_url = %config.base_url, "loaded client config");

		Ok(config)
	}

	/// Overrides the login route.
	pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
		self.login_route = route.into();

		self
	}

	/// Overrides the refresh bound; `None` disables it.
	pub fn with_refresh_timeout(mut self, timeout: Option<StdDuration>) -> Self {
		self.refresh_timeout_ms =
			timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX).max(1));

		self
	}

	/// Overrides the per-request refresh budget (at least one round).
	pub fn with_max_refresh_rounds(mut self, rounds: u8) -> Self {
		self.max_refresh_rounds = rounds.max(1);

		self
	}

	/// Refresh bound as a [`StdDuration`].
	pub fn refresh_timeout(&self) -> Option<StdDuration> {
		self.refresh_timeout_ms.map(StdDuration::from_millis)
	}

	fn default_login_route() -> String {
		Self::DEFAULT_LOGIN_ROUTE.into()
	}

	fn default_refresh_timeout_ms() -> Option<u64> {
		Some(Self::DEFAULT_REFRESH_TIMEOUT_MS)
	}

	fn default_max_refresh_rounds() -> u8 {
		Self::DEFAULT_MAX_REFRESH_ROUNDS
	}
}

/// Absolute URLs of every endpoint the client talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
	/// `POST auth/login`
	pub login: Url,
	/// `POST auth/register`
	pub register: Url,
	/// `POST auth/refresh`
	pub refresh: Url,
	/// `POST auth/logout`
	pub logout: Url,
	/// `GET me`
	pub me: Url,
	/// `GET users`
	pub users: Url,
	/// `GET|POST reviews`
	pub reviews: Url,
}
impl Endpoints {
	/// Resolves every endpoint against the config's base URL.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		let base = &config.base_url;
		let join = |path: &str| {
			base.join(path).map_err(|source| ConfigError::InvalidBaseUrl {
				value: format!("{base}{path}"),
				source,
			})
		};

		Ok(Self {
			login: join("auth/login")?,
			register: join("auth/register")?,
			refresh: join("auth/refresh")?,
			logout: join("auth/logout")?,
			me: join("me")?,
			users: join("users")?,
			reviews: join("reviews")?,
		})
	}
}

fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
	let mut url = Url::parse(raw.trim())
		.map_err(|source| ConfigError::InvalidBaseUrl { value: raw.into(), source })?;

	if url.cannot_be_a_base() {
		return Err(ConfigError::CannotBeBase { value: raw.into() });
	}
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	Ok(url)
}

fn de_base_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	normalize_base_url(&raw).map_err(serde::de::Error::custom)
}
