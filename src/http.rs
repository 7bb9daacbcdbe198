//! Transport primitives for session-gated API calls.
//!
//! The module exposes [`SessionTransport`] alongside the owned [`ApiRequest`] and
//! [`ApiResponse`] values so downstream crates can plug in custom HTTP stacks (or scripted fakes)
//! without touching the coordinator. A request is a plain value the coordinator can clone, queue,
//! and replay; a response is fully buffered so its status can be inspected before the body is
//! decoded.

// crates.io
use futures::future::BoxFuture;
#[cfg(feature = "reqwest")] use reqwest::cookie::Jar;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

/// Boxed future returned by [`SessionTransport::send`].
pub type TransportFuture<'a> = BoxFuture<'a, Result<ApiResponse, TransportError>>;

/// Abstraction over HTTP stacks capable of executing API requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can back the coordinator and
/// the facade at the same time. `include_credentials` on the request decides whether session
/// credentials (cookies) travel with it.
pub trait SessionTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends the request and buffers the full response.
	fn send(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// HTTP verbs used by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl HttpMethod {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Patch => "PATCH",
			HttpMethod::Delete => "DELETE",
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Owned request parameters: target, method, headers, body, and credential inclusion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: HttpMethod,
	/// Absolute target URL.
	pub target: Url,
	/// Header name/value pairs, sent in order.
	pub headers: Vec<(String, String)>,
	/// Raw request body.
	pub body: Option<Vec<u8>>,
	/// Whether session credentials accompany the request.
	pub include_credentials: bool,
}
impl ApiRequest {
	/// Creates a request without headers, body, or credentials.
	pub fn new(method: HttpMethod, target: Url) -> Self {
		Self { method, target, headers: Vec::new(), body: None, include_credentials: false }
	}

	/// Shorthand for a `GET` request.
	pub fn get(target: Url) -> Self {
		Self::new(HttpMethod::Get, target)
	}

	/// Shorthand for a `POST` request.
	pub fn post(target: Url) -> Self {
		Self::new(HttpMethod::Post, target)
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Sets a raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `payload` as the JSON body and sets the matching content type.
	pub fn with_json<T>(self, payload: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let body =
			serde_json::to_vec(payload).map_err(|source| ConfigError::EncodeBody { source })?;

		Ok(self.with_header("content-type", "application/json").with_body(body))
	}

	/// Overrides the credential-inclusion flag.
	pub fn with_credentials(mut self, include: bool) -> Self {
		self.include_credentials = include;

		self
	}

	/// Returns a compact `METHOD path` label for logs.
	pub fn label(&self) -> String {
		format!("{} {}", self.method, self.target.path())
	}
}

/// Fully buffered HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers with lower-case names; repeated headers keep the last value.
	pub headers: BTreeMap<String, String>,
	/// Raw body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response without headers.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Adds a header (name is lower-cased).
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// `true` for any 2xx status.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// `true` when the server rejected the session credentials.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	/// Returns the body as lossy UTF-8.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { status: self.status, source })
	}
}

/// Cookie-aware reqwest transport.
///
/// Credentialed requests go through a client sharing one cookie [`Jar`], so the session cookies set
/// by login and refresh are sent back automatically. Requests with `include_credentials == false`
/// use a second client with no cookie store. Neither client follows redirects into the login page;
/// the coordinator decides what an expired session means.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	credentialed: ReqwestClient,
	anonymous: ReqwestClient,
	jar: Arc<Jar>,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with default client settings.
	pub fn new() -> Result<Self, ConfigError> {
		Self::from_builders(ReqwestClient::builder(), ReqwestClient::builder())
	}

	/// Builds a transport from caller-tuned builders; the cookie jar is attached to the first one.
	pub fn from_builders(
		credentialed: reqwest::ClientBuilder,
		anonymous: reqwest::ClientBuilder,
	) -> Result<Self, ConfigError> {
		let jar = Arc::new(Jar::default());
		let credentialed = credentialed
			.cookie_provider(jar.clone())
			.redirect(reqwest::redirect::Policy::none())
			.build()?;
		let anonymous = anonymous.redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self { credentialed, anonymous, jar })
	}

	/// Shared cookie jar holding the session credentials.
	pub fn cookie_jar(&self) -> &Arc<Jar> {
		&self.jar
	}

	fn client_for(&self, request: &ApiRequest) -> &ReqwestClient {
		if request.include_credentials { &self.credentialed } else { &self.anonymous }
	}
}
#[cfg(feature = "reqwest")]
impl SessionTransport for ReqwestTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let method = match request.method {
				HttpMethod::Get => reqwest::Method::GET,
				HttpMethod::Post => reqwest::Method::POST,
				HttpMethod::Put => reqwest::Method::PUT,
				HttpMethod::Patch => reqwest::Method::PATCH,
				HttpMethod::Delete => reqwest::Method::DELETE,
			};
			let mut builder = self.client_for(&request).request(method, request.target.clone());

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, headers, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn target(path: &str) -> Url {
		Url::parse("http://localhost:5000/api/")
			.and_then(|base| base.join(path))
			.expect("Test target URL should parse.")
	}

	#[test]
	fn json_body_sets_content_type() {
		let request = ApiRequest::post(target("reviews"))
			.with_json(&serde_json::json!({ "positive": "Helpful" }))
			.expect("JSON payload should encode.");

		assert_eq!(request.headers, vec![("content-type".into(), "application/json".into())]);
		assert_eq!(request.body.as_deref(), Some(&b"{\"positive\":\"Helpful\"}"[..]));
		assert!(!request.include_credentials);
		assert_eq!(request.label(), "POST /api/reviews");
	}

	#[test]
	fn response_decode_reports_failing_path() {
		#[derive(Debug, Deserialize)]
		struct Named {
			#[allow(dead_code)]
			name: String,
		}

		let response = ApiResponse::new(200, r#"[{"name":"Ada"},{"name":7}]"#);
		let err = response.json::<Vec<Named>>().expect_err("Second entry has the wrong type.");

		match err {
			Error::Decode { status, source } => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "[1].name");
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[test]
	fn status_helpers_classify_responses() {
		assert!(ApiResponse::new(201, "").is_success());
		assert!(ApiResponse::new(401, "").is_unauthorized());
		assert!(!ApiResponse::new(403, "").is_unauthorized());
		assert_eq!(
			ApiResponse::new(200, "").with_header("Set-Cookie", "a=b").headers.get("set-cookie"),
			Some(&"a=b".to_string())
		);
	}
}
