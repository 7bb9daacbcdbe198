#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use kyh_session::{
	api::{Credentials, ReqwestHeroClient, UserId},
	config::ClientConfig,
	error::Error,
	http::ReqwestTransport,
	session::NoopNavigator,
	store::{FileIdentityStore, IdentityStore},
};

fn temp_store_path(name: &str) -> std::path::PathBuf {
	let path = std::env::temp_dir()
		.join(format!("kyh-session-{}-{name}", std::process::id()))
		.join("identity.json");
	let _ = std::fs::remove_file(&path);

	path
}

#[tokio::test]
async fn review_colleague_posts_backend_payload_and_persists_identity() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let path = temp_store_path("review");
	let store = FileIdentityStore::open(&path)?;
	let config = ClientConfig::new(server.url("/api"))?;
	let client = ReqwestHeroClient::with_transport(
		&config,
		ReqwestTransport::new()?,
		Arc::new(NoopNavigator),
		Arc::new(store.clone()),
	)?;
	let login = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/auth/login")
				.json_body(json!({ "email": "ada@example.com", "password": "hunter2" }));
			then.status(200)
				.header("set-cookie", "access_token=issued; Path=/; HttpOnly")
				.json_body(json!({ "message": "Login successful" }));
		})
		.await;
	let me = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/me").header("cookie", "access_token=issued");
			then.status(200).json_body(json!({ "id": "1", "name": "Ada", "email": "ada@example.com" }));
		})
		.await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/reviews").header("cookie", "access_token=issued").json_body(
				json!({ "positive": "Great mentor", "adresed_id": "7", "author_id": "1" }),
			);
			then.status(201).json_body(json!({ "message": "Review created", "id": 12 }));
		})
		.await;
	let user = client.login(&Credentials::new(" ada@example.com ", "hunter2")).await?;

	login.assert_async().await;
	me.assert_async().await;

	assert_eq!(user.name, "Ada");

	let receipt = client.review_colleague(&UserId::new("7")?, "Great mentor", Some("   ")).await?;

	create.assert_async().await;

	assert_eq!(receipt.id.as_deref(), Some("12"));
	assert_eq!(receipt.message.as_deref(), Some("Review created"));

	let reopened = FileIdentityStore::open(&path)?;

	assert_eq!(reopened.load().await?.user, Some(user));

	client.coordinator().reset();
	store.clear().await?;

	assert!(FileIdentityStore::open(&path)?.load().await?.is_empty());

	Ok(())
}

#[tokio::test]
async fn self_review_is_rejected_before_sending() {
	let server = MockServer::start_async().await;
	let path = temp_store_path("self-review");
	let store = FileIdentityStore::open(&path).expect("File store should open.");
	let config = ClientConfig::new(server.url("/api")).expect("Mock server URL should be valid.");
	let client = ReqwestHeroClient::with_transport(
		&config,
		ReqwestTransport::new().expect("Reqwest transport should build."),
		Arc::new(NoopNavigator),
		Arc::new(store),
	)
	.expect("Client should build for the mock server.");
	let me = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/me");
			then.status(200).json_body(json!({ "id": 1, "name": "Ada", "email": "ada@example.com" }));
		})
		.await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/reviews");
			then.status(201);
		})
		.await;
	let err = client
		.review_colleague(&UserId::new("1").expect("Fixture id is valid."), "Great", None)
		.await
		.expect_err("Users cannot review themselves.");

	assert!(matches!(err, Error::Validation(_)));

	me.assert_calls_async(1).await;
	create.assert_calls_async(0).await;
}
