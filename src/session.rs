//! Session coordination: single-flight refresh, ordered replay, and forced logout.
//!
//! [`SessionCoordinator::execute`] sends a request with session credentials attached. When the
//! server answers 401 the first caller to notice claims the refresh slot and calls the refresh
//! endpoint; everyone else who hits a 401 meanwhile is queued behind it. A successful refresh
//! replays the queue in arrival order and retries the triggering request; a rejected refresh
//! fails every queued caller, revokes the session, clears the identity cache, and sends the
//! navigator to the login surface exactly once.

pub mod coordinator;
pub mod navigator;

mod metrics;
mod state;

pub use coordinator::*;
pub use metrics::RefreshMetrics;
pub use navigator::*;

// self
use crate::_prelude::*;

/// Session health as observed by the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
	/// No refresh in flight; requests go straight through.
	Authenticated,
	/// A refresh is in flight; expired requests are queued behind it.
	Expired,
	/// The session could not be renewed; a fresh login is required.
	LoggedOut,
}
impl SessionStatus {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionStatus::Authenticated => "authenticated",
			SessionStatus::Expired => "expired",
			SessionStatus::LoggedOut => "logged_out",
		}
	}
}
impl Display for SessionStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
