//! Gold price quote lookup.
//!
//! The quote service returns a JSON list of quotes, newest first. Only the
//! first entry is used.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    client::check_status,
    error::{MessagingError, Result},
};

/// Default quote service URL.
pub const DEFAULT_GOLD_PRICE_URL: &str = "https://karndiy.pythonanywhere.com/goldjsonv2";

/// A price that the quote service may send as a number or as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    /// Numeric price.
    Number(f64),
    /// Preformatted price.
    Text(String),
}

impl fmt::Display for PriceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) if value.fract() == 0.0 => write!(f, "{value:.0}"),
            Self::Number(value) => write!(f, "{value:.2}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// One gold bar quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldQuote {
    /// Quote date as published.
    #[serde(rename = "asdate")]
    pub as_of: String,
    /// Buy price in baht.
    #[serde(rename = "blbuy")]
    pub buy: PriceValue,
    /// Sell price in baht.
    #[serde(rename = "blsell")]
    pub sell: PriceValue,
    /// Change against the previous quote.
    pub diff: PriceValue,
}

impl GoldQuote {
    /// Formats the quote as a chat reply.
    pub fn to_message(&self) -> String {
        format!(
            "ราคาทองคำล่าสุด\nวันที่: {}\nราคารับซื้อ: {} บาท\nราคาขาย: {} บาท\nส่วนต่าง: {} บาท",
            self.as_of, self.buy, self.sell, self.diff
        )
    }
}

/// Client for the gold price quote service.
#[derive(Debug, Clone)]
pub struct GoldPriceClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl GoldPriceClient {
    /// Creates a client for the quote list at `url`.
    ///
    /// # Errors
    ///
    /// Returns `MessagingError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            MessagingError::configuration(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self { client, url: url.into(), timeout })
    }

    /// Fetches the most recent quote, or `None` if the list is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unreachable, answers with an
    /// error status, or sends an unexpected body.
    #[instrument(name = "gold_price_latest", skip(self), fields(url = %self.url))]
    pub async fn latest(&self) -> Result<Option<GoldQuote>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| MessagingError::from_reqwest(&e, self.timeout.as_secs()))?;

        let response = check_status(response).await?;
        let quotes: Vec<GoldQuote> =
            response.json().await.map_err(|e| MessagingError::decode(e.to_string()))?;

        debug!(quotes = quotes.len(), "Fetched gold quotes");
        Ok(quotes.into_iter().next())
    }
}
