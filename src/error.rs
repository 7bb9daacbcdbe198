//! Client-level error types shared across the coordinator, transport, facade, and stores.

// self
use crate::{_prelude::*, api::ReviewValidationError};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// An expired authorization is never surfaced directly; the coordinator either recovers it through
/// a session refresh or converts it into [`Error::SessionExpired`].
#[derive(Debug, ThisError)]
pub enum Error {
	/// Identity store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Review payload rejected before it reached the server.
	#[error(transparent)]
	Validation(#[from] ReviewValidationError),

	/// The session could not be renewed; the user has to log in again.
	#[error("Session expired, please log in again: {reason}.")]
	SessionExpired {
		/// Refresh endpoint's failure message, verbatim.
		reason: String,
	},
	/// Server answered with a non-authorization failure.
	#[error("Request failed with status {status}: {message}.")]
	Application {
		/// HTTP status code.
		status: u16,
		/// Machine-readable error code, when the server supplied one.
		code: Option<String>,
		/// Server-supplied human-readable message.
		message: String,
	},
	/// Successful response carried a body of the wrong shape.
	#[error("Response body with status {status} could not be decoded.")]
	Decode {
		/// HTTP status code of the response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns `true` when the session is gone and the caller must log in again.
	pub fn is_session_expired(&self) -> bool {
		matches!(self, Self::SessionExpired { .. })
	}

	/// Returns `true` for failures worth offering a retry affordance for.
	pub fn is_transient(&self) -> bool {
		match self {
			Self::Transport(_) => true,
			Self::Application { status, .. } => *status == 429 || *status >= 500,
			_ => false,
		}
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL or endpoint path cannot be parsed.
	#[error("API base URL `{value}` is invalid.")]
	InvalidBaseUrl {
		/// Offending input.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL cannot carry relative endpoint paths (e.g., `mailto:`).
	#[error("API base URL `{value}` cannot be used as a base.")]
	CannotBeBase {
		/// Offending input.
		value: String,
	},
	/// Config file could not be read.
	#[error("Config file {path} could not be read.")]
	Read {
		/// Path that failed.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Config document does not match the expected shape.
	#[error("Config document is malformed.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be encoded.")]
	EncodeBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
	/// Operation exceeded its bounded wait.
	#[error("The {operation} did not complete within {after:?}.")]
	TimedOut {
		/// Operation label.
		operation: &'static str,
		/// Configured limit.
		after: StdDuration,
	},
	/// A queued request was released without being sent because its refresh cycle broke off.
	#[error("Request was interrupted while waiting for the session refresh: {reason}.")]
	Interrupted {
		/// Why the refresh cycle ended.
		reason: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn transient_classification_follows_status() {
		let unavailable =
			Error::Application { status: 503, code: None, message: "maintenance".into() };
		let conflict = Error::Application {
			status: 409,
			code: Some("EMAIL_EXISTS".into()),
			message: "User with this email already exists".into(),
		};
		let interrupted = Error::from(TransportError::Interrupted { reason: "gone".into() });

		assert!(unavailable.is_transient());
		assert!(!conflict.is_transient());
		assert!(interrupted.is_transient());
		assert!(!interrupted.is_session_expired());
	}

	#[test]
	fn session_expired_message_mentions_login() {
		let err = Error::SessionExpired { reason: "Token has expired".into() };

		assert!(err.is_session_expired());
		assert_eq!(
			err.to_string(),
			"Session expired, please log in again: Token has expired."
		);
	}
}
