//! Storage contracts and built-in implementations for the client-held identity cache.
//!
//! The cache keeps the current user and the colleague list between views so forms can be filled
//! without another round trip. It is cleared whenever the session is torn down.

pub mod file;
pub mod memory;

pub use file::FileIdentityStore;
pub use memory::MemoryIdentityStore;

// self
use crate::{
	_prelude::*,
	api::{Colleague, CurrentUser},
};

/// Boxed future returned by [`IdentityStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by identity caches.
pub trait IdentityStore
where
	Self: Send + Sync,
{
	/// Returns the cached snapshot (empty when nothing was stored).
	fn load(&self) -> StoreFuture<'_, IdentitySnapshot>;

	/// Replaces the cached current user.
	fn save_user(&self, user: CurrentUser) -> StoreFuture<'_, ()>;

	/// Replaces the cached colleague list.
	fn save_colleagues(&self, colleagues: Vec<Colleague>) -> StoreFuture<'_, ()>;

	/// Drops every cached entry.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Everything the client remembers about the signed-in identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySnapshot {
	/// Current user, once fetched or returned by login.
	pub user: Option<CurrentUser>,
	/// Colleague list, once fetched.
	pub colleagues: Vec<Colleague>,
	/// Last mutation instant.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub updated_at: Option<OffsetDateTime>,
}
impl IdentitySnapshot {
	/// `true` when neither a user nor colleagues are cached.
	pub fn is_empty(&self) -> bool {
		self.user.is_none() && self.colleagues.is_empty()
	}

	pub(crate) fn touch(&mut self) {
		self.updated_at = Some(OffsetDateTime::now_utc());
	}
}

/// Error type produced by [`IdentityStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
