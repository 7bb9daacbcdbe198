//! Observability helpers for coordinator and facade operations.
//!
//! # Feature Flags
//!
//! - Spans named `kyh_session.op` with the `op` and `stage` (call site) fields are always emitted
//!   through `tracing`; install any subscriber to collect them.
//! - Enable `metrics` to increment the `kyh_session_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionOp {
	/// A session-gated request routed through the coordinator.
	Request,
	/// A session refresh call.
	Refresh,
	/// A queued request re-dispatched after a refresh.
	Replay,
	/// A login, registration, or logout call.
	Account,
}
impl SessionOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionOp::Request => "request",
			SessionOp::Refresh => "refresh",
			SessionOp::Replay => "replay",
			SessionOp::Account => "account",
		}
	}
}
impl Display for SessionOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside an [`OpSpan`] and records the attempt plus its outcome.
pub async fn observe<T, E, Fut>(op: SessionOp, stage: &'static str, fut: Fut) -> Result<T, E>
where
	Fut: Future<Output = Result<T, E>>,
{
	record_op_outcome(op, OpOutcome::Attempt);

	let result = OpSpan::new(op, stage).instrument(fut).await;

	match &result {
		Ok(_) => record_op_outcome(op, OpOutcome::Success),
		Err(_) => record_op_outcome(op, OpOutcome::Failure),
	}

	result
}
