//! Refresh bookkeeping guarded by the coordinator's lock.

// std
use std::collections::VecDeque;
// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	error::TransportError,
	http::{ApiRequest, ApiResponse},
	session::SessionStatus,
};

pub(crate) type Settlement = Result<ApiResponse>;

/// One caller parked behind the in-flight refresh.
pub(crate) struct PendingRequest {
	pub(crate) request: ApiRequest,
	pub(crate) rounds_left: u8,
	completion: oneshot::Sender<Settlement>,
}
impl PendingRequest {
	fn new(request: ApiRequest, rounds_left: u8) -> (Self, oneshot::Receiver<Settlement>) {
		let (completion, waiter) = oneshot::channel();

		(Self { request, rounds_left, completion }, waiter)
	}

	/// `true` once the waiting caller dropped its future.
	pub(crate) fn is_abandoned(&self) -> bool {
		self.completion.is_closed()
	}

	pub(crate) fn settle(self, outcome: Settlement) {
		// The caller may have gone away; nothing left to notify then.
		let _ = self.completion.send(outcome);
	}

	pub(crate) fn interrupt(self, reason: &str) {
		self.settle(Err(TransportError::Interrupted { reason: reason.to_owned() }.into()));
	}
}
impl Debug for PendingRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingRequest")
			.field("request", &self.request.label())
			.field("rounds_left", &self.rounds_left)
			.finish()
	}
}

/// Result of asking for the refresh slot after a 401.
#[derive(Debug)]
pub(crate) enum Claim {
	/// Caller owns cycle `epoch` and must call the refresh endpoint.
	Lead(u64),
	/// A refresh is in flight; the caller waits on its completion handle.
	Wait(oneshot::Receiver<Settlement>),
	/// The session is gone until the next login.
	LoggedOut,
}

/// How a refresh cycle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CycleEnd {
	/// Refresh succeeded; the queue is replayed.
	Renewed,
	/// Refresh was rejected; the session is terminal.
	Expired,
	/// Refresh never produced an answer (network, timeout, cancellation).
	Interrupted,
}

/// Process-wide refresh flag plus the queue of parked callers.
///
/// The queue is non-empty only while `refreshing` is set, and every transition that clears the
/// flag hands the whole queue back to the caller in the same critical section.
#[derive(Debug, Default)]
pub(crate) struct RefreshState {
	refreshing: bool,
	logged_out: bool,
	epoch: u64,
	queue: VecDeque<PendingRequest>,
}
impl RefreshState {
	pub(crate) fn status(&self) -> SessionStatus {
		if self.logged_out {
			SessionStatus::LoggedOut
		} else if self.refreshing {
			SessionStatus::Expired
		} else {
			SessionStatus::Authenticated
		}
	}

	pub(crate) fn is_refreshing(&self) -> bool {
		self.refreshing
	}

	pub(crate) fn queued(&self) -> usize {
		self.queue.len()
	}

	pub(crate) fn claim(&mut self, request: &ApiRequest, rounds_left: u8) -> Claim {
		if self.logged_out {
			return Claim::LoggedOut;
		}
		if self.refreshing {
			let (pending, waiter) = PendingRequest::new(request.clone(), rounds_left);

			self.queue.push_back(pending);

			return Claim::Wait(waiter);
		}

		self.refreshing = true;
		self.epoch = self.epoch.wrapping_add(1);

		Claim::Lead(self.epoch)
	}

	/// Ends cycle `epoch` and hands back the queue in arrival order.
	///
	/// Returns `None` when `epoch` was superseded by a reset; the current state is left untouched.
	pub(crate) fn finish(&mut self, epoch: u64, end: CycleEnd) -> Option<Vec<PendingRequest>> {
		if !self.refreshing || self.epoch != epoch {
			return None;
		}

		self.refreshing = false;

		if end == CycleEnd::Expired {
			self.logged_out = true;
		}

		Some(self.queue.drain(..).collect())
	}

	/// Returns to idle regardless of the current cycle, handing back whatever was queued.
	pub(crate) fn reset(&mut self) -> Vec<PendingRequest> {
		self.refreshing = false;
		self.logged_out = false;
		self.epoch = self.epoch.wrapping_add(1);

		self.queue.drain(..).collect()
	}
}

/// Pairs a claimed refresh slot with its drain-and-reset, even if the owner is dropped mid-cycle.
pub(crate) struct RefreshCycle<'a> {
	state: &'a Mutex<RefreshState>,
	epoch: u64,
	settled: bool,
}
impl<'a> RefreshCycle<'a> {
	pub(crate) fn new(state: &'a Mutex<RefreshState>, epoch: u64) -> Self {
		Self { state, epoch, settled: false }
	}

	pub(crate) fn finish(mut self, end: CycleEnd) -> Option<Vec<PendingRequest>> {
		self.settled = true;

		self.state.lock().finish(self.epoch, end)
	}
}
impl Drop for RefreshCycle<'_> {
	fn drop(&mut self) {
		if self.settled {
			return;
		}

		let abandoned =
			self.state.lock().finish(self.epoch, CycleEnd::Interrupted).unwrap_or_default();

		tracing::warn!(
			epoch = self.epoch,
			queued = abandoned.len(),
			"refresh cycle dropped before completion"
		);

		for pending in abandoned {
			pending.interrupt("the refresh was cancelled before it completed");
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn request(path: &str) -> ApiRequest {
		ApiRequest::get(
			Url::parse("http://localhost/api/")
				.and_then(|base| base.join(path))
				.expect("Test URL should parse."),
		)
	}

	#[test]
	fn first_claim_leads_and_later_claims_queue_in_order() {
		let mut state = RefreshState::default();
		let epoch = match state.claim(&request("reviews"), 2) {
			Claim::Lead(epoch) => epoch,
			other => panic!("First claim should lead, got {other:?}."),
		};

		assert!(matches!(state.claim(&request("me"), 2), Claim::Wait(_)));
		assert!(matches!(state.claim(&request("users"), 1), Claim::Wait(_)));
		assert_eq!(state.status(), SessionStatus::Expired);
		assert_eq!(state.queued(), 2);

		let drained = state.finish(epoch, CycleEnd::Renewed).expect("Current cycle should finish.");
		let paths: Vec<_> = drained.iter().map(|p| p.request.target.path().to_owned()).collect();

		assert_eq!(paths, ["/api/me", "/api/users"]);
		assert_eq!(drained[1].rounds_left, 1);
		assert!(!state.is_refreshing());
		assert_eq!(state.queued(), 0);
		assert_eq!(state.status(), SessionStatus::Authenticated);
	}

	#[test]
	fn expired_cycle_logs_out_until_reset() {
		let mut state = RefreshState::default();
		let Claim::Lead(epoch) = state.claim(&request("me"), 2) else {
			panic!("First claim should lead.");
		};

		assert_eq!(state.finish(epoch, CycleEnd::Expired).map(|queue| queue.len()), Some(0));
		assert_eq!(state.status(), SessionStatus::LoggedOut);
		assert!(matches!(state.claim(&request("me"), 2), Claim::LoggedOut));

		state.reset();

		assert_eq!(state.status(), SessionStatus::Authenticated);
		assert!(matches!(state.claim(&request("me"), 2), Claim::Lead(_)));
	}

	#[test]
	fn stale_epoch_cannot_finish_a_newer_cycle() {
		let mut state = RefreshState::default();
		let Claim::Lead(stale) = state.claim(&request("me"), 2) else {
			panic!("First claim should lead.");
		};
		let interrupted = state.reset();

		assert!(interrupted.is_empty());

		let Claim::Lead(current) = state.claim(&request("me"), 2) else {
			panic!("Claim after reset should lead.");
		};

		assert_ne!(stale, current);
		assert!(matches!(state.claim(&request("users"), 2), Claim::Wait(_)));
		assert!(state.finish(stale, CycleEnd::Expired).is_none());
		assert!(state.is_refreshing());
		assert_eq!(state.status(), SessionStatus::Expired);
		assert_eq!(state.queued(), 1);
		assert_eq!(state.finish(current, CycleEnd::Renewed).map(|queue| queue.len()), Some(1));
	}

	#[tokio::test]
	async fn dropped_cycle_interrupts_waiters_and_clears_flag() {
		let state = Mutex::new(RefreshState::default());
		let Claim::Lead(epoch) = state.lock().claim(&request("reviews"), 2) else {
			panic!("First claim should lead.");
		};
		let Claim::Wait(waiter) = state.lock().claim(&request("me"), 2) else {
			panic!("Second claim should wait.");
		};

		drop(RefreshCycle::new(&state, epoch));

		let outcome = waiter.await.expect("Dropped cycle should settle the waiter.");

		assert!(matches!(outcome, Err(Error::Transport(TransportError::Interrupted { .. }))));
		assert!(!state.lock().is_refreshing());
		assert_eq!(state.lock().queued(), 0);
	}
}
