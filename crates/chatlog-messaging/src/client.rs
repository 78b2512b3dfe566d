//! HTTP client for the chat platform's messaging API.
//!
//! Sends text replies and pushes, and looks up user profiles. Calls are made
//! once; failures are returned to the caller without retrying.

use std::{fmt, time::Duration};

use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{MessagingError, Result};

/// Longest text the messaging API accepts in a single message.
pub const MAX_TEXT_CHARS: usize = 5000;

/// Configuration for the messaging client.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API base URL without trailing path, e.g. `https://api.line.me`.
    pub base_url: String,
    /// Channel access token sent as a bearer token.
    pub access_token: String,
    /// Timeout for each API request.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.line.me".to_string(),
            access_token: String::new(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("chatlog/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"***")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Profile of a platform user as returned by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Platform user identifier.
    #[serde(default)]
    pub user_id: String,
    /// Name shown in the chat client.
    pub display_name: String,
    /// Profile image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
    /// Status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

impl<'a> TextMessage<'a> {
    fn new(text: &'a str) -> Self {
        Self { kind: "text", text }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

/// Client for the messaging API.
#[derive(Debug, Clone)]
pub struct MessagingClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl MessagingClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `MessagingError::Configuration` if the access token is empty
    /// or the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.access_token.trim().is_empty() {
            return Err(MessagingError::configuration("channel access token is empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                MessagingError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Replies to a message event using its single-use reply token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    #[instrument(name = "messaging_reply", skip(self, reply_token, text), fields(text_len = text.len()))]
    pub async fn reply(&self, reply_token: &str, text: &str) -> Result<()> {
        let text = truncate_text(text);
        let body = ReplyRequest { reply_token, messages: [TextMessage::new(text)] };

        self.post_json("/v2/bot/message/reply", &body).await
    }

    /// Pushes a message to a user, group or room without a reply token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    #[instrument(name = "messaging_push", skip(self, text), fields(text_len = text.len()))]
    pub async fn push(&self, to: &str, text: &str) -> Result<()> {
        let text = truncate_text(text);
        let body = PushRequest { to, messages: [TextMessage::new(text)] };

        self.post_json("/v2/bot/message/push", &body).await
    }

    /// Fetches the profile of a user who is a friend of the bot.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API rejects it, or the
    /// body is not a profile.
    #[instrument(name = "messaging_profile", skip(self))]
    pub async fn profile(&self, user_id: &str) -> Result<Profile> {
        let response = self
            .client
            .get(self.profile_url(user_id)?)
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let response = check_status(response).await?;

        response.json::<Profile>().await.map_err(|e| MessagingError::decode(e.to_string()))
    }

    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<()> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.config.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        check_status(response).await?;
        debug!(path, "Messaging API call succeeded");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Profile endpoint for `user_id`, percent-encoded as one path segment.
    fn profile_url(&self, user_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url("/v2/bot/profile/"))
            .map_err(|e| MessagingError::configuration(format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| MessagingError::configuration("base URL cannot carry a path"))?
            .pop_if_empty()
            .push(user_id);
        Ok(url)
    }

    fn transport_error(&self, err: &reqwest::Error) -> MessagingError {
        warn!(error = %err, "Messaging API request failed");
        MessagingError::from_reqwest(err, self.config.timeout.as_secs())
    }
}

/// Turns non-success responses into `MessagingError::Api`.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), body = %body, "API returned error status");

    Err(MessagingError::Api { status_code: status.as_u16(), body })
}

fn truncate_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_TEXT_CHARS) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_access_token_rejected() {
        let result = MessagingClient::new(ClientConfig::default());
        assert!(matches!(result, Err(MessagingError::Configuration { .. })));
    }

    #[test]
    fn url_joins_without_double_slash() {
        let config = ClientConfig {
            base_url: "http://localhost:9000/".to_string(),
            access_token: "token".to_string(),
            ..Default::default()
        };
        let client = MessagingClient::new(config).unwrap();

        assert_eq!(client.url("/v2/bot/message/reply"), "http://localhost:9000/v2/bot/message/reply");
    }

    #[test]
    fn profile_url_encodes_user_id() {
        let config = ClientConfig {
            base_url: "http://localhost:9000".to_string(),
            access_token: "token".to_string(),
            ..Default::default()
        };
        let client = MessagingClient::new(config).unwrap();

        assert_eq!(client.profile_url("U1").unwrap().path(), "/v2/bot/profile/U1");
        assert_eq!(client.profile_url("U/1 x").unwrap().path(), "/v2/bot/profile/U%2F1%20x");
        assert_eq!(client.profile_url("../quota").unwrap().path(), "/v2/bot/profile/..%2Fquota");
    }

    #[test]
    fn debug_masks_access_token() {
        let config = ClientConfig { access_token: "super-secret".to_string(), ..Default::default() };
        let rendered = format!("{config:?}");

        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn truncates_long_text_on_char_boundary() {
        let long = "ทอง".repeat(MAX_TEXT_CHARS);
        let truncated = truncate_text(&long);

        assert_eq!(truncated.chars().count(), MAX_TEXT_CHARS);
        assert_eq!(truncate_text("short"), "short");
    }

    #[test]
    fn reply_request_uses_platform_field_names() {
        let body = ReplyRequest { reply_token: "rt", messages: [TextMessage::new("hi")] };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["replyToken"], "rt");
        assert_eq!(json["messages"][0]["type"], "text");
        assert_eq!(json["messages"][0]["text"], "hi");
    }
}
