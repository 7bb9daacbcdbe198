//! Navigation capability used for the forced redirect to the login surface.

// self
use crate::_prelude::*;

/// Moves the user to another surface (page, screen, route).
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Navigates to `destination`.
	fn redirect(&self, destination: &str);
}

/// Navigator that ignores every redirect (headless clients).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNavigator;
impl Navigator for NoopNavigator {
	fn redirect(&self, destination: &str) {
		tracing::debug!(destination, "redirect ignored by noop navigator");
	}
}

/// Navigator that records every destination, for assertions and for UIs that poll.
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator(Arc<Mutex<Vec<String>>>);
impl RecordingNavigator {
	/// Destinations in redirect order.
	pub fn destinations(&self) -> Vec<String> {
		self.0.lock().clone()
	}

	/// Number of redirects performed.
	pub fn redirects(&self) -> usize {
		self.0.lock().len()
	}
}
impl Navigator for RecordingNavigator {
	fn redirect(&self, destination: &str) {
		self.0.lock().push(destination.to_owned());
	}
}
