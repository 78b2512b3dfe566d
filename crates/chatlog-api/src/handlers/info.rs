//! Bot information and index endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Webhook paths served by this process.
pub const WEBHOOK_ENDPOINTS: [&str; 2] = ["/callback", "/webhook"];

/// Response body for `GET /info`.
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    /// Channel id from configuration.
    pub channel_id: String,
    /// Bot user id from configuration.
    pub user_id: String,
    /// Always `"active"` while the process serves requests.
    pub status: &'static str,
    /// Paths accepting webhook deliveries.
    pub webhook_endpoints: [&'static str; 2],
}

/// Describes the bot and its webhook endpoints.
pub async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        channel_id: state.channel.channel_id.clone(),
        user_id: state.channel.bot_user_id.clone(),
        status: "active",
        webhook_endpoints: WEBHOOK_ENDPOINTS,
    })
}

/// Plain-text greeting.
pub async fn index() -> &'static str {
    "Hello World"
}
