//! Test infrastructure for deterministic testing.
//!
//! [`TestEnv`] wires the real router to an in-memory SQLite store, a
//! deterministic clock, and a wiremock server standing in for both the
//! messaging API and the gold quote service.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use chatlog_api::{create_router, crypto, AppState, ChannelSettings};
use chatlog_core::{Clock, Storage, StorageOptions, TestClock};
use chatlog_messaging::{ClientConfig, GoldPriceClient, MessagingClient, ReplyComposer};
use tower::ServiceExt;
use wiremock::MockServer;

pub mod fixtures;
pub mod http;

pub use fixtures::PayloadBuilder;

/// Channel secret used by [`TestEnv`] unless overridden.
pub const TEST_CHANNEL_SECRET: &str = "test-channel-secret";

/// Access token the mock messaging API expects.
pub const TEST_ACCESS_TOKEN: &str = "test-access-token";

/// Path of the gold quote list on the mock server.
pub const GOLD_PRICE_PATH: &str = "/goldjsonv2";

/// Isolated environment for integration tests.
///
/// Every environment owns a private in-memory database, so tests never
/// observe each other's rows.
pub struct TestEnv {
    /// Mock of the messaging API and the quote service
    pub http_mock: MockServer,
    /// Deterministic clock used for all stored timestamps
    pub clock: TestClock,
    /// Secret deliveries must be signed with
    pub secret: String,
    state: AppState,
}

/// Builder for [`TestEnv`] with non-default channel settings.
#[derive(Debug, Clone)]
pub struct TestEnvBuilder {
    secret: String,
    channel_id: String,
    bot_user_id: String,
    api_timeout: Duration,
}

impl Default for TestEnvBuilder {
    fn default() -> Self {
        Self {
            secret: TEST_CHANNEL_SECRET.to_string(),
            channel_id: "1234567890".to_string(),
            bot_user_id: "Ubot".to_string(),
            api_timeout: Duration::from_secs(2),
        }
    }
}

impl TestEnvBuilder {
    /// Sets the channel secret.
    #[must_use]
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Sets the channel id and bot user id reported by `/info`.
    #[must_use]
    pub fn channel(mut self, channel_id: impl Into<String>, bot_user_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self.bot_user_id = bot_user_id.into();
        self
    }

    /// Sets the timeout for outbound API calls.
    #[must_use]
    pub fn api_timeout(mut self, timeout: Duration) -> Self {
        self.api_timeout = timeout;
        self
    }

    /// Starts the mock server and opens the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or an HTTP client cannot be created.
    pub async fn build(self) -> Result<TestEnv> {
        let http_mock = MockServer::start().await;
        let clock = TestClock::new();
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());

        let storage = Storage::connect("sqlite::memory:", &StorageOptions::default(), &shared_clock)
            .await
            .context("failed to open in-memory storage")?;

        let messaging = MessagingClient::new(ClientConfig {
            base_url: http_mock.uri(),
            access_token: TEST_ACCESS_TOKEN.to_string(),
            timeout: self.api_timeout,
            ..ClientConfig::default()
        })?;
        let gold =
            GoldPriceClient::new(format!("{}{GOLD_PRICE_PATH}", http_mock.uri()), self.api_timeout)?;

        let channel = ChannelSettings {
            secret: self.secret.clone(),
            channel_id: self.channel_id,
            bot_user_id: self.bot_user_id,
        };

        let state =
            AppState::new(storage, messaging, ReplyComposer::new(gold), channel, shared_clock);

        Ok(TestEnv { http_mock, clock, secret: self.secret, state })
    }
}

impl TestEnv {
    /// Creates an environment with default channel settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment cannot be built.
    pub async fn new() -> Result<Self> {
        Self::builder().build().await
    }

    /// Returns a builder for customised environments.
    pub fn builder() -> TestEnvBuilder {
        TestEnvBuilder::default()
    }

    /// Application state shared with the router.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Storage behind the router.
    pub fn storage(&self) -> &Storage {
        &self.state.storage
    }

    /// A fresh router over this environment's state.
    pub fn router(&self) -> Router {
        create_router(self.state())
    }

    /// Sends one request through the router.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the router's error type is uninhabited.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Body>> {
        Ok(self.router().oneshot(request).await?)
    }

    /// Builds a `POST` of `body` to `path` signed with this environment's
    /// secret.
    pub fn signed_request(&self, path: &str, body: &[u8]) -> Request<Body> {
        let signature = sign(body, &self.secret);
        webhook_request(path, body, Some(&signature))
    }

    /// Signs and delivers `body` to `/callback`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn deliver(&self, body: &[u8]) -> Result<Response<Body>> {
        self.send(self.signed_request("/callback", body)).await
    }

    /// Issues a `GET` to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Result<Response<Body>> {
        let request = Request::builder().method("GET").uri(path).body(Body::empty())?;
        self.send(request).await
    }

    /// Number of stored users.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn user_count(&self) -> Result<i64> {
        Ok(self.storage().users.count().await?)
    }

    /// Number of stored messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn message_count(&self) -> Result<i64> {
        Ok(self.storage().messages.count().await?)
    }

    /// Advances the test clock.
    pub fn advance_time(&self, duration: Duration) {
        self.clock.advance(duration);
    }
}

/// Base64 HMAC-SHA256 signature of `body` under `secret`.
pub fn sign(body: &[u8], secret: &str) -> String {
    crypto::sign(body, secret).expect("HMAC accepts keys of any length")
}

/// Builds a webhook `POST` with an optional signature header.
pub fn webhook_request(path: &str, body: &[u8], signature: Option<&str>) -> Request<Body> {
    let mut builder =
        Request::builder().method("POST").uri(path).header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(crypto::SIGNATURE_HEADER, signature);
    }

    builder.body(Body::from(body.to_vec())).expect("webhook request parts are valid")
}

/// Reads a response body as JSON.
///
/// # Errors
///
/// Returns an error if the body cannot be read or is not JSON.
pub async fn body_json(response: Response<Body>) -> Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Reads a response body as text.
///
/// # Errors
///
/// Returns an error if the body cannot be read or is not UTF-8.
pub async fn body_text(response: Response<Body>) -> Result<String> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}
