//! Canned responses for the mocked messaging API and quote service.

use serde_json::{json, Value};
use wiremock::{
    matchers::{header, method, path},
    Mock, ResponseTemplate,
};

use crate::{TestEnv, GOLD_PRICE_PATH, TEST_ACCESS_TOKEN};

/// Messaging API reply path.
pub const REPLY_PATH: &str = "/v2/bot/message/reply";

/// Messaging API push path.
pub const PUSH_PATH: &str = "/v2/bot/message/push";

fn bearer() -> String {
    format!("Bearer {TEST_ACCESS_TOKEN}")
}

impl TestEnv {
    /// Serves a profile with `display_name` for `user_id`.
    pub async fn mock_profile(&self, user_id: &str, display_name: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v2/bot/profile/{user_id}")))
            .and(header("authorization", bearer().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "userId": user_id,
                "displayName": display_name,
                "pictureUrl": format!("https://profile.example.com/{user_id}.png"),
            })))
            .mount(&self.http_mock)
            .await;
    }

    /// Makes profile lookups for `user_id` fail with `status`.
    pub async fn mock_profile_failure(&self, user_id: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/v2/bot/profile/{user_id}")))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({"message": "error"})))
            .mount(&self.http_mock)
            .await;
    }

    /// Accepts replies.
    pub async fn mock_reply_ok(&self) {
        Mock::given(method("POST"))
            .and(path(REPLY_PATH))
            .and(header("authorization", bearer().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&self.http_mock)
            .await;
    }

    /// Rejects replies with `status`.
    pub async fn mock_reply_failure(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(REPLY_PATH))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(json!({"message": "Invalid reply token"})),
            )
            .mount(&self.http_mock)
            .await;
    }

    /// Accepts pushes.
    pub async fn mock_push_ok(&self) {
        Mock::given(method("POST"))
            .and(path(PUSH_PATH))
            .and(header("authorization", bearer().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&self.http_mock)
            .await;
    }

    /// Serves `quotes` as the gold quote list.
    pub async fn mock_gold_quotes(&self, quotes: Value) {
        Mock::given(method("GET"))
            .and(path(GOLD_PRICE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(quotes))
            .mount(&self.http_mock)
            .await;
    }

    /// JSON bodies of every request received on `request_path`, oldest
    /// first.
    pub async fn requests_to(&self, request_path: &str) -> Vec<Value> {
        self.http_mock
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == request_path)
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }

    /// Reply bodies sent so far.
    pub async fn sent_replies(&self) -> Vec<Value> {
        self.requests_to(REPLY_PATH).await
    }

    /// Push bodies sent so far.
    pub async fn sent_pushes(&self) -> Vec<Value> {
        self.requests_to(PUSH_PATH).await
    }
}
