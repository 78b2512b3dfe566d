//! Webhook delivery handler.
//!
//! Verifies the delivery signature, records each text message under its
//! sender, and answers the sender. Reply failures are logged and never
//! change the response, so the platform does not redeliver events that
//! were already stored.

use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_LENGTH, HeaderMap},
    Json,
};
use bytes::Bytes;
use chatlog_core::ChatlogError;
use chatlog_messaging::reply::PROCESSING_FAILED;
use serde::Serialize;
use tracing::{debug, field, info, instrument, warn, Span};

use crate::{
    crypto::{verify_signature, SIGNATURE_HEADER},
    error::ApiError,
    webhook::{IncomingText, Sender, SourceKind, WebhookPayload},
    AppState,
};

/// Largest accepted delivery body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Acknowledgement returned for accepted deliveries.
#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    /// Always `"OK"`.
    pub message: &'static str,
}

/// Receives a webhook delivery.
///
/// # Errors
///
/// Returns appropriate HTTP status codes:
/// - 400: Missing or invalid signature, or malformed payload
/// - 413: Body larger than [`MAX_BODY_BYTES`]
/// - 500: Storage failure; the sender is sent [`PROCESSING_FAILED`]
#[instrument(name = "callback", skip_all, fields(body_len = field::Empty))]
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<CallbackResponse>, ApiError> {
    let body = read_body(&headers, body).await?;
    Span::current().record("body_len", body.len());

    authenticate(&headers, &body, &state.channel.secret)?;

    let payload = WebhookPayload::parse(&body).inspect_err(|e| warn!(error = %e, "Rejected payload"))?;
    let messages = payload.text_messages();

    debug!(
        events = payload.events.len(),
        text_messages = messages.len(),
        destination = payload.destination.as_deref().unwrap_or("unknown"),
        "Parsed webhook delivery"
    );

    for incoming in &messages {
        record_and_reply(&state, incoming).await?;
    }

    info!(recorded = messages.len(), "Webhook delivery processed");
    Ok(Json(CallbackResponse { message: "OK" }))
}

/// Buffers at most [`MAX_BODY_BYTES`] of the delivery.
///
/// A declared `Content-Length` over the limit is refused before reading.
async fn read_body(headers: &HeaderMap, body: Body) -> Result<Bytes, ChatlogError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());

    if let Some(size) = declared.filter(|&size| size > MAX_BODY_BYTES) {
        return Err(payload_too_large(size));
    }

    axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| payload_too_large(declared.unwrap_or(MAX_BODY_BYTES + 1)))
}

fn payload_too_large(size_bytes: usize) -> ChatlogError {
    warn!(payload_size = size_bytes, limit = MAX_BODY_BYTES, "Payload exceeds size limit");
    ChatlogError::PayloadTooLarge { size_bytes, limit_bytes: MAX_BODY_BYTES }
}

fn authenticate(headers: &HeaderMap, body: &[u8], secret: &str) -> Result<(), ChatlogError> {
    let Some(value) = headers.get(SIGNATURE_HEADER) else {
        warn!("Signature header missing");
        return Err(ChatlogError::MissingSignature { header: SIGNATURE_HEADER });
    };

    let signature = value.to_str().map_err(|_| ChatlogError::InvalidSignature)?;

    verify_signature(body, signature, secret).map_err(|e| {
        warn!(reason = %e, "Webhook signature validation failed");
        ChatlogError::InvalidSignature
    })
}

#[instrument(
    name = "record_message",
    skip(state, incoming),
    fields(sender = %incoming.sender.id, kind = %incoming.sender.kind, message_id = %incoming.message_id)
)]
async fn record_and_reply(state: &AppState, incoming: &IncomingText) -> Result<(), ChatlogError> {
    let display_name = resolve_display_name(state, &incoming.sender).await;

    if let Err(e) = record(state, incoming, display_name.as_deref()).await {
        send_reply(state, incoming, PROCESSING_FAILED).await;
        return Err(e);
    }

    let reply = state.composer.compose(&incoming.text).await;
    send_reply(state, incoming, &reply).await;

    Ok(())
}

async fn record(
    state: &AppState,
    incoming: &IncomingText,
    display_name: Option<&str>,
) -> Result<(), ChatlogError> {
    let user = state.storage.users.upsert_user(&incoming.sender.id, display_name).await?;
    let message = state.storage.messages.insert_message(&user.user_id, &incoming.text).await?;
    debug!(message_row = message.id, display_name = %user.display_name, "Message recorded");
    Ok(())
}

/// Name to store for the sender, or `None` to keep what is stored.
async fn resolve_display_name(state: &AppState, sender: &Sender) -> Option<String> {
    if sender.kind != SourceKind::User {
        return sender.conversation_name();
    }

    match state.messaging.profile(sender.id.as_str()).await {
        Ok(profile) if !profile.display_name.trim().is_empty() => Some(profile.display_name),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "Profile lookup failed, keeping stored display name");
            None
        },
    }
}

async fn send_reply(state: &AppState, incoming: &IncomingText, text: &str) {
    let result = match &incoming.reply_token {
        Some(token) => state.messaging.reply(token, text).await,
        None => state.messaging.push(incoming.sender.id.as_str(), text).await,
    };

    if let Err(e) = result {
        let err = ChatlogError::MessagingApi(e.to_string());
        warn!(code = err.code(), error = %err, "Reply not delivered");
    }
}
