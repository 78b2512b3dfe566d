//! Integration tests for the messaging API client and gold quote lookup.
//!
//! Runs against a wiremock server standing in for the platform API and the
//! quote service.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use chatlog_messaging::{
    ClientConfig, GoldPriceClient, MessagingClient, MessagingError, ReplyComposer,
};
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn client_for(server: &MockServer) -> MessagingClient {
    MessagingClient::new(ClientConfig {
        base_url: server.uri(),
        access_token: "test-token".to_string(),
        timeout: Duration::from_secs(2),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn reply_posts_token_and_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/reply"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "replyToken": "reply-token-1",
            "messages": [{"type": "text", "text": "Received: hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).reply("reply-token-1", "Received: hi").await.unwrap();
}

#[tokio::test]
async fn push_posts_recipient_and_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/push"))
        .and(body_json(json!({
            "to": "U123",
            "messages": [{"type": "text", "text": "hello"}]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).push("U123", "hello").await.unwrap();
}

#[tokio::test]
async fn rejected_reply_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/reply"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid reply token"))
        .mount(&server)
        .await;

    let err = client_for(&server).reply("expired", "hi").await.unwrap_err();

    match err {
        MessagingError::Api { status_code, body } => {
            assert_eq!(status_code, 400);
            assert_eq!(body, "Invalid reply token");
        },
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn profile_returns_display_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/bot/profile/U123"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": "U123",
            "displayName": "Alice",
            "pictureUrl": "https://example.com/a.png",
            "language": "en"
        })))
        .mount(&server)
        .await;

    let profile = client_for(&server).profile("U123").await.unwrap();

    assert_eq!(profile.user_id, "U123");
    assert_eq!(profile.display_name, "Alice");
    assert_eq!(profile.picture_url.as_deref(), Some("https://example.com/a.png"));
    assert!(profile.status_message.is_none());
}

#[tokio::test]
async fn profile_not_found_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/bot/profile/Ugone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not found"})))
        .mount(&server)
        .await;

    let err = client_for(&server).profile("Ugone").await.unwrap_err();

    assert!(matches!(err, MessagingError::Api { status_code: 404, .. }));
}

#[tokio::test]
async fn slow_api_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/push"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = MessagingClient::new(ClientConfig {
        base_url: server.uri(),
        access_token: "test-token".to_string(),
        timeout: Duration::from_millis(100),
        ..Default::default()
    })
    .unwrap();

    let err = client.push("U1", "hi").await.unwrap_err();

    assert!(matches!(err, MessagingError::Timeout { .. }));
}

#[tokio::test]
async fn gold_client_returns_first_quote() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/goldjsonv2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"asdate": "02/05/2024", "blbuy": 40150, "blsell": 40250, "diff": 50},
            {"asdate": "01/05/2024", "blbuy": 40100, "blsell": 40200, "diff": 0}
        ])))
        .mount(&server)
        .await;

    let client =
        GoldPriceClient::new(format!("{}/goldjsonv2", server.uri()), Duration::from_secs(2))
            .unwrap();
    let quote = client.latest().await.unwrap().unwrap();

    assert_eq!(quote.as_of, "02/05/2024");
    assert_eq!(quote.buy.to_string(), "40150");
}

#[tokio::test]
async fn gold_client_empty_list_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/goldjsonv2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client =
        GoldPriceClient::new(format!("{}/goldjsonv2", server.uri()), Duration::from_secs(2))
            .unwrap();

    assert!(client.latest().await.unwrap().is_none());
}

#[tokio::test]
async fn composer_formats_quote_for_gold_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/goldjsonv2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"asdate": "02/05/2024", "blbuy": 40150, "blsell": 40250, "diff": 50}
        ])))
        .mount(&server)
        .await;

    let gold = GoldPriceClient::new(format!("{}/goldjsonv2", server.uri()), Duration::from_secs(2))
        .unwrap();
    let reply = ReplyComposer::new(gold).compose("gold please").await;

    assert!(reply.starts_with("ราคาทองคำล่าสุด"));
    assert!(reply.contains("ราคาขาย: 40250 บาท"));
}

#[tokio::test]
async fn composer_reports_unavailable_quote() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/goldjsonv2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let gold = GoldPriceClient::new(format!("{}/goldjsonv2", server.uri()), Duration::from_secs(2))
        .unwrap();
    let reply = ReplyComposer::new(gold).compose("ราคาทอง").await;

    assert_eq!(reply, chatlog_messaging::reply::GOLD_UNAVAILABLE);
}
