//! Thread-safe in-memory [`IdentityStore`] implementation for tests and short-lived clients.

// self
use crate::{
	_prelude::*,
	api::{Colleague, CurrentUser},
	store::{IdentitySnapshot, IdentityStore, StoreFuture},
};

/// Keeps the identity snapshot in-process; cloning shares the same snapshot.
#[derive(Clone, Debug, Default)]
pub struct MemoryIdentityStore(Arc<RwLock<IdentitySnapshot>>);
impl MemoryIdentityStore {
	/// Returns a copy of the current snapshot without going through the async contract.
	pub fn snapshot(&self) -> IdentitySnapshot {
		self.0.read().clone()
	}

	fn mutate(&self, f: impl FnOnce(&mut IdentitySnapshot)) {
		let mut guard = self.0.write();

		f(&mut guard);
	}
}
impl IdentityStore for MemoryIdentityStore {
	fn load(&self) -> StoreFuture<'_, IdentitySnapshot> {
		let snapshot = self.snapshot();

		Box::pin(async move { Ok(snapshot) })
	}

	fn save_user(&self, user: CurrentUser) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.mutate(|snapshot| {
				snapshot.user = Some(user);
				snapshot.touch();
			});

			Ok(())
		})
	}

	fn save_colleagues(&self, colleagues: Vec<Colleague>) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.mutate(|snapshot| {
				snapshot.colleagues = colleagues;
				snapshot.touch();
			});

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.mutate(|snapshot| *snapshot = IdentitySnapshot::default());

			Ok(())
		})
	}
}
