//! Shared handler state.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chatlog_core::{Clock, Storage};
use chatlog_messaging::{GoldPriceClient, MessagingClient, ReplyComposer};

use crate::Config;

/// Channel identity and webhook secret.
#[derive(Debug, Clone)]
pub struct ChannelSettings {
    /// HMAC key for webhook signatures.
    pub secret: String,
    /// Channel id reported by `/info`.
    pub channel_id: String,
    /// Bot user id reported by `/info`.
    pub bot_user_id: String,
}

impl ChannelSettings {
    /// Settings with only a secret, for tests and tooling.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self { secret: secret.into(), channel_id: String::new(), bot_user_id: String::new() }
    }
}

/// Application state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// User and message repositories.
    pub storage: Arc<Storage>,
    /// Outbound messaging API client.
    pub messaging: Arc<MessagingClient>,
    /// Reply text selection.
    pub composer: Arc<ReplyComposer>,
    /// Channel identity and webhook secret.
    pub channel: Arc<ChannelSettings>,
    /// Clock for health timestamps.
    pub clock: Arc<dyn Clock>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl AppState {
    /// Creates application state from its parts.
    pub fn new(
        storage: Storage,
        messaging: MessagingClient,
        composer: ReplyComposer,
        channel: ChannelSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage: Arc::new(storage),
            messaging: Arc::new(messaging),
            composer: Arc::new(composer),
            channel: Arc::new(channel),
            clock,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Builds state from loaded configuration and an opened store.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn from_config(config: &Config, storage: Storage, clock: Arc<dyn Clock>) -> Result<Self> {
        let messaging = MessagingClient::new(config.to_client_config())
            .context("Failed to create messaging client")?;
        let gold =
            GoldPriceClient::new(&config.gold_price_url, Duration::from_secs(config.api_timeout))
                .context("Failed to create gold price client")?;

        let channel = ChannelSettings {
            secret: config.channel_secret.clone(),
            channel_id: config.channel_id.clone(),
            bot_user_id: config.bot_user_id.clone(),
        };

        Ok(Self::new(storage, messaging, ReplyComposer::new(gold), channel, clock)
            .with_request_timeout(config.request_timeout()))
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
