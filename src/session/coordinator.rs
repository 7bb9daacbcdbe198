//! Authenticated-request coordinator with single-flight session refresh.

// crates.io
use futures::future::{self, BoxFuture};
// self
use crate::{
	_prelude::*,
	api::ErrorPayload,
	config::{ClientConfig, Endpoints},
	error::{ConfigError, TransportError},
	http::{ApiRequest, ApiResponse, SessionTransport},
	obs::{self, SessionOp},
	session::{
		Navigator, RefreshMetrics, SessionStatus,
		state::{Claim, CycleEnd, PendingRequest, RefreshCycle, RefreshState},
	},
	store::IdentityStore,
};

const SUPERSEDED: &str = "the session was reset while its refresh was in flight";

/// Why a refresh cycle did not renew the session.
enum RefreshFailure {
	/// The refresh endpoint answered with a failure; the session is unrecoverable.
	Rejected { reason: String },
	/// The refresh call never produced an answer.
	Unreachable(TransportError),
}
impl From<TransportError> for RefreshFailure {
	fn from(e: TransportError) -> Self {
		Self::Unreachable(e)
	}
}

/// Sends session-gated requests and recovers expired sessions transparently.
///
/// One instance is built per client session and shared by every caller; its refresh flag and
/// queue are the only shared mutable state, and they are only touched inside short critical
/// sections that never span an `.await`.
pub struct SessionCoordinator<T>
where
	T: ?Sized + SessionTransport,
{
	transport: Arc<T>,
	navigator: Arc<dyn Navigator>,
	identity: Arc<dyn IdentityStore>,
	refresh_endpoint: Url,
	logout_endpoint: Url,
	login_route: String,
	refresh_timeout: Option<StdDuration>,
	max_refresh_rounds: u8,
	metrics: Arc<RefreshMetrics>,
	state: Mutex<RefreshState>,
}
impl<T> SessionCoordinator<T>
where
	T: ?Sized + SessionTransport,
{
	/// Creates a coordinator for the endpoints described by `config`.
	pub fn new(
		config: &ClientConfig,
		transport: impl Into<Arc<T>>,
		navigator: Arc<dyn Navigator>,
		identity: Arc<dyn IdentityStore>,
	) -> Result<Self, ConfigError> {
		let endpoints = Endpoints::from_config(config)?;

		Ok(Self::with_endpoints(config, &endpoints, transport, navigator, identity))
	}

	pub(crate) fn with_endpoints(
		config: &ClientConfig,
		endpoints: &Endpoints,
		transport: impl Into<Arc<T>>,
		navigator: Arc<dyn Navigator>,
		identity: Arc<dyn IdentityStore>,
	) -> Self {
		Self {
			transport: transport.into(),
			navigator,
			identity,
			refresh_endpoint: endpoints.refresh.clone(),
			logout_endpoint: endpoints.logout.clone(),
			login_route: config.login_route.clone(),
			refresh_timeout: config.refresh_timeout(),
			max_refresh_rounds: config.max_refresh_rounds.max(1),
			metrics: Default::default(),
			state: Default::default(),
		}
	}

	/// Sends `request` with session credentials, renewing the session once if it expired.
	///
	/// Non-401 responses (including other failures) come back unchanged. A 401 either starts the
	/// refresh cycle or parks the call behind the one already in flight; either way the caller
	/// observes a single suspension and receives the replayed response, a
	/// [`Error::SessionExpired`] when the session cannot be renewed, or the transport failure
	/// that interrupted the refresh.
	pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
		let request = request.with_credentials(true);

		obs::observe(
			SessionOp::Request,
			"execute",
			self.dispatch(request, self.max_refresh_rounds),
		)
		.await
	}

	/// Session health derived from the refresh state.
	pub fn status(&self) -> SessionStatus {
		self.state.lock().status()
	}

	/// `true` while a refresh call is in flight.
	pub fn is_refreshing(&self) -> bool {
		self.state.lock().is_refreshing()
	}

	/// Number of callers parked behind the in-flight refresh.
	pub fn queued(&self) -> usize {
		self.state.lock().queued()
	}

	/// Refresh counters.
	pub fn metrics(&self) -> &Arc<RefreshMetrics> {
		&self.metrics
	}

	/// Returns to idle after a login or logout; parked callers are released as interrupted.
	pub fn reset(&self) {
		let interrupted = self.state.lock().reset();

		if !interrupted.is_empty() {
			tracing::debug!(queued = interrupted.len(), "releasing queued requests on reset");
		}

		for pending in interrupted {
			pending.interrupt("the session was reset");
		}
	}

	fn dispatch(&self, request: ApiRequest, rounds_left: u8) -> BoxFuture<'_, Result<ApiResponse>> {
		Box::pin(async move {
			let response = self.transport.send(request.clone()).await?;

			if !response.is_unauthorized() {
				return Ok(response);
			}
			if rounds_left == 0 {
				tracing::debug!(request = %request.label(), "refresh budget spent; returning 401");

				return Ok(response);
			}

			let claim = self.state.lock().claim(&request, rounds_left - 1);

			match claim {
				Claim::Lead(epoch) => self.lead_refresh(epoch, request).await,
				Claim::Wait(waiter) => {
					self.metrics.record_queued();

					tracing::debug!(request = %request.label(), "queued behind in-flight refresh");

					waiter.await.unwrap_or_else(|_| {
						Err(TransportError::Interrupted {
							reason: "the refresh cycle ended without releasing this request".into(),
						}
						.into())
					})
				},
				Claim::LoggedOut =>
					Err(Error::SessionExpired { reason: "the session was logged out".into() }),
			}
		})
	}

	async fn lead_refresh(&self, epoch: u64, request: ApiRequest) -> Result<ApiResponse> {
		let cycle = RefreshCycle::new(&self.state, epoch);

		tracing::info!(epoch, trigger = %request.label(), "authorization expired; refreshing session");

		match self.refresh().await {
			Ok(()) => {
				let queued = cycle.finish(CycleEnd::Renewed).unwrap_or_default();

				tracing::info!(epoch, queued = queued.len(), "session renewed; replaying queue");

				// Replays are issued in arrival order before the trigger is retried.
				let replays = future::join_all(queued.into_iter().map(|pending| self.replay(pending)));
				let (_, retried) = future::join(replays, self.transport.send(request)).await;

				Ok(retried?)
			},
			Err(RefreshFailure::Rejected { reason }) => {
				let Some(queued) = cycle.finish(CycleEnd::Expired) else {
					tracing::info!(epoch, %reason, "stale refresh rejected after a reset; keeping the session");

					return Err(TransportError::Interrupted { reason: SUPERSEDED.into() }.into());
				};

				tracing::warn!(epoch, queued = queued.len(), %reason, "session refresh rejected; logging out");

				for pending in queued {
					pending.settle(Err(Error::SessionExpired { reason: reason.clone() }));
				}

				self.sign_out().await;

				Err(Error::SessionExpired { reason })
			},
			Err(RefreshFailure::Unreachable(e)) => {
				let queued = cycle.finish(CycleEnd::Interrupted).unwrap_or_default();
				let reason = e.to_string();

				tracing::warn!(epoch, queued = queued.len(), %reason, "session refresh did not complete");

				for pending in queued {
					pending.interrupt(&reason);
				}

				Err(e.into())
			},
		}
	}

	async fn replay(&self, pending: PendingRequest) {
		if pending.is_abandoned() {
			tracing::debug!(request = %pending.request.label(), "skipping replay for departed caller");

			return;
		}

		let outcome = obs::observe(
			SessionOp::Replay,
			"replay",
			self.dispatch(pending.request.clone(), pending.rounds_left),
		)
		.await;

		pending.settle(outcome);
	}

	async fn refresh(&self) -> Result<(), RefreshFailure> {
		self.metrics.record_attempt();

		let result = obs::observe(SessionOp::Refresh, "refresh", async {
			let request = ApiRequest::post(self.refresh_endpoint.clone()).with_credentials(true);
			let call = self.transport.send(request);
			let response = match self.refresh_timeout {
				Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
					TransportError::TimedOut { operation: "session refresh", after: limit }
				})??,
				None => call.await?,
			};

			if response.is_success() {
				Ok(())
			} else {
				Err(RefreshFailure::Rejected {
					reason: ErrorPayload::from_response(&response).message,
				})
			}
		})
		.await;

		match &result {
			Ok(()) => self.metrics.record_success(),
			Err(_) => self.metrics.record_failure(),
		}

		result
	}

	/// Tears the session down once per failed cycle: revoke, forget, redirect.
	async fn sign_out(&self) {
		let request = ApiRequest::post(self.logout_endpoint.clone()).with_credentials(true);

		match self.transport.send(request).await {
			Ok(response) if response.is_success() => {},
			Ok(response) => {
				tracing::warn!(status = response.status, "best-effort logout was rejected");
			},
			Err(e) => {
				tracing::warn!(error = %e, "best-effort logout failed");
			},
		}

		if let Err(e) = self.identity.clear().await {
			tracing::warn!(error = %e, "failed to clear cached identity");
		}

		self.navigator.redirect(&self.login_route);
	}
}
impl<T> Debug for SessionCoordinator<T>
where
	T: ?Sized + SessionTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("SessionCoordinator")
			.field("refresh_endpoint", &self.refresh_endpoint.as_str())
			.field("status", &state.status())
			.field("queued", &state.queued())
			.finish()
	}
}
