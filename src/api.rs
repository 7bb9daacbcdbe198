//! Typed facade over the Know Your Hero REST API.
//!
//! [`HeroClient`] owns the [`SessionCoordinator`] and routes every session-gated call through it;
//! only login and registration talk to the transport directly.

pub mod model;

mod account;
mod reviews;

pub use model::*;

// self
use crate::{
	_prelude::*,
	config::{ClientConfig, Endpoints},
	error::ConfigError,
	http::{ApiRequest, ApiResponse, SessionTransport},
	session::{Navigator, SessionCoordinator, SessionStatus},
	store::{IdentitySnapshot, IdentityStore},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestTransport, session::NoopNavigator, store::MemoryIdentityStore};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestHeroClient = HeroClient<ReqwestTransport>;

/// Session-aware API client.
pub struct HeroClient<T>
where
	T: ?Sized + SessionTransport,
{
	coordinator: Arc<SessionCoordinator<T>>,
	transport: Arc<T>,
	identity: Arc<dyn IdentityStore>,
	endpoints: Endpoints,
}
impl<T> HeroClient<T>
where
	T: ?Sized + SessionTransport,
{
	/// Wires a client around a caller-provided transport, navigator, and identity store.
	pub fn with_transport(
		config: &ClientConfig,
		transport: impl Into<Arc<T>>,
		navigator: Arc<dyn Navigator>,
		identity: Arc<dyn IdentityStore>,
	) -> Result<Self, ConfigError> {
		let transport = transport.into();
		let endpoints = Endpoints::from_config(config)?;
		let coordinator = Arc::new(SessionCoordinator::with_endpoints(
			config,
			&endpoints,
			transport.clone(),
			navigator,
			identity.clone(),
		));

		Ok(Self { coordinator, transport, identity, endpoints })
	}

	/// Coordinator shared by every session-gated call.
	pub fn coordinator(&self) -> &Arc<SessionCoordinator<T>> {
		&self.coordinator
	}

	/// Resolved endpoint URLs.
	pub fn endpoints(&self) -> &Endpoints {
		&self.endpoints
	}

	/// Current session health.
	pub fn status(&self) -> SessionStatus {
		self.coordinator.status()
	}

	/// Cached identity (user + colleagues).
	pub async fn cached_identity(&self) -> Result<IdentitySnapshot> {
		Ok(self.identity.load().await?)
	}

	/// Sends a session-gated request and decodes a successful JSON body.
	async fn gated_json<R>(&self, request: ApiRequest) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let response = self.coordinator.execute(request).await?;

		expect_json(response)
	}
}
#[cfg(feature = "reqwest")]
impl HeroClient<ReqwestTransport> {
	/// Creates a client with a fresh reqwest transport, in-memory identity cache, and no-op
	/// navigator. Use [`HeroClient::with_transport`] to bring a real navigator.
	pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
		Self::with_transport(
			config,
			ReqwestTransport::new()?,
			Arc::new(NoopNavigator),
			Arc::new(MemoryIdentityStore::default()),
		)
	}
}
impl<T> Clone for HeroClient<T>
where
	T: ?Sized + SessionTransport,
{
	fn clone(&self) -> Self {
		Self {
			coordinator: self.coordinator.clone(),
			transport: self.transport.clone(),
			identity: self.identity.clone(),
			endpoints: self.endpoints.clone(),
		}
	}
}
impl<T> Debug for HeroClient<T>
where
	T: ?Sized + SessionTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HeroClient")
			.field("base", &self.endpoints.me.origin().ascii_serialization())
			.field("status", &self.coordinator.status())
			.finish()
	}
}

/// Failure body understood by the client.
///
/// The backend answers `{"error": {"code": "...", "message": "..."}}`; older routes answer
/// `{"message": "..."}` or `{"msg": "..."}`. Anything else falls back to the raw body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorPayload {
	/// Machine-readable code, when present.
	pub code: Option<String>,
	/// Human-readable message.
	pub message: String,
}
impl ErrorPayload {
	/// Extracts the failure message from a response.
	pub fn from_response(response: &ApiResponse) -> Self {
		#[derive(Deserialize)]
		struct Detail {
			code: Option<serde_json::Value>,
			message: Option<String>,
		}
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Envelope {
			Nested { error: Detail },
			Flat { message: String },
			Legacy { msg: String },
		}

		match serde_json::from_slice::<Envelope>(&response.body) {
			Ok(Envelope::Nested { error: Detail { code, message } }) => Self {
				code: code.map(|code| match code {
					serde_json::Value::String(text) => text,
					other => other.to_string(),
				}),
				message: message.unwrap_or_else(|| Self::fallback(response)),
			},
			Ok(Envelope::Flat { message }) | Ok(Envelope::Legacy { msg: message }) =>
				Self { code: None, message },
			Err(_) => Self { code: None, message: Self::fallback(response) },
		}
	}

	/// Converts the payload into [`Error::Application`].
	pub fn into_error(self, status: u16) -> Error {
		Error::Application { status, code: self.code, message: self.message }
	}

	fn fallback(response: &ApiResponse) -> String {
		let text = response.text();
		let text = text.trim();

		if text.is_empty() { format!("HTTP {}", response.status) } else { text.to_owned() }
	}
}

/// Maps non-2xx responses to [`Error::Application`] and decodes the rest.
pub(crate) fn expect_json<R>(response: ApiResponse) -> Result<R>
where
	R: DeserializeOwned,
{
	if !response.is_success() {
		return Err(ErrorPayload::from_response(&response).into_error(response.status));
	}

	response.json()
}
