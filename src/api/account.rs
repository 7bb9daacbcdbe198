//! Login, registration, logout, and identity lookups.

// self
use crate::{
	_prelude::*,
	api::{Colleague, CurrentUser, Credentials, ErrorPayload, HeroClient, Registration, expect_json},
	http::{ApiRequest, SessionTransport},
	obs::{self, SessionOp},
};

#[derive(Deserialize)]
struct LoginResponse {
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	user: Option<CurrentUser>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RegisterResponse {
	Wrapped { user: CurrentUser },
	Flat(CurrentUser),
}

impl<T> HeroClient<T>
where
	T: ?Sized + SessionTransport,
{
	/// Authenticates and starts a new session.
	///
	/// A 401 here means bad credentials, so the call bypasses the coordinator. On success the
	/// coordinator returns to idle (leaving any logged-out state) and the user is cached; when the
	/// response omits the user it is fetched from `GET me`.
	pub async fn login(&self, credentials: &Credentials) -> Result<CurrentUser> {
		obs::observe(SessionOp::Account, "login", async move {
			let request = ApiRequest::post(self.endpoints.login.clone())
				.with_credentials(true)
				.with_json(credentials)?;
			let response = self.transport.send(request).await?;
			let LoginResponse { message, user } = expect_json(response)?;

			self.coordinator.reset();

			let user = match user {
				Some(user) => user,
				None => self.gated_json(ApiRequest::get(self.endpoints.me.clone())).await?,
			};

			self.identity.save_user(user.clone()).await?;

			tracing::info!(user = %user.id, message = message.as_deref(), "logged in");

			Ok(user)
		})
		.await
	}

	/// Creates an account; does not log in.
	pub async fn register(&self, registration: &Registration) -> Result<CurrentUser> {
		obs::observe(SessionOp::Account, "register", async move {
			let request =
				ApiRequest::post(self.endpoints.register.clone()).with_json(registration)?;
			let response = self.transport.send(request).await?;

			match expect_json(response)? {
				RegisterResponse::Wrapped { user } | RegisterResponse::Flat(user) => Ok(user),
			}
		})
		.await
	}

	/// Ends the session on the server and locally.
	///
	/// Local state (coordinator, identity cache) is torn down even when the server call fails;
	/// that failure is still returned.
	pub async fn logout(&self) -> Result<()> {
		obs::observe(SessionOp::Account, "logout", async move {
			let request = ApiRequest::post(self.endpoints.logout.clone()).with_credentials(true);
			let outcome = self.transport.send(request).await;

			self.coordinator.reset();
			self.identity.clear().await?;

			let response = outcome?;

			if response.is_success() {
				Ok(())
			} else {
				Err(ErrorPayload::from_response(&response).into_error(response.status))
			}
		})
		.await
	}

	/// Fetches the current user and refreshes the cached copy.
	pub async fn fetch_user(&self) -> Result<CurrentUser> {
		obs::observe(SessionOp::Request, "fetch_user", async move {
			let user: CurrentUser =
				self.gated_json(ApiRequest::get(self.endpoints.me.clone())).await?;

			self.identity.save_user(user.clone()).await?;

			Ok(user)
		})
		.await
	}

	/// Fetches every colleague except the current user and refreshes the cached list.
	pub async fn fetch_colleagues(&self) -> Result<Vec<Colleague>> {
		obs::observe(SessionOp::Request, "fetch_colleagues", async move {
			let colleagues: Vec<Colleague> =
				self.gated_json(ApiRequest::get(self.endpoints.users.clone())).await?;

			self.identity.save_colleagues(colleagues.clone()).await?;

			Ok(colleagues)
		})
		.await
	}
}
