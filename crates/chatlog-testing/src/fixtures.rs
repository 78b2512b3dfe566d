//! Webhook payload builders.

use serde_json::{json, Value};

/// Builder for webhook delivery bodies.
///
/// Reply tokens and message ids are numbered by event position, so the
/// first event carries `reply-token-1` and message id `1`.
///
/// # Example
///
/// ```
/// use chatlog_testing::PayloadBuilder;
///
/// let body = PayloadBuilder::new().text_from_user("U1", "hello").build();
/// assert!(!body.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    destination: String,
    events: Vec<Value>,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadBuilder {
    /// Creates an empty delivery addressed to `Ubot`.
    pub fn new() -> Self {
        Self { destination: "Ubot".to_string(), events: Vec::new() }
    }

    /// Sets the destination bot id.
    #[must_use]
    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Adds a text message from a user in a one-to-one chat.
    #[must_use]
    pub fn text_from_user(self, user_id: &str, text: &str) -> Self {
        self.text_message(json!({"type": "user", "userId": user_id}), text, true)
    }

    /// Adds a text message from a user without a reply token.
    #[must_use]
    pub fn text_from_user_without_token(self, user_id: &str, text: &str) -> Self {
        self.text_message(json!({"type": "user", "userId": user_id}), text, false)
    }

    /// Adds a text message posted in a group.
    #[must_use]
    pub fn text_in_group(self, group_id: &str, user_id: &str, text: &str) -> Self {
        self.text_message(json!({"type": "group", "groupId": group_id, "userId": user_id}), text, true)
    }

    /// Adds a text message posted in a room.
    #[must_use]
    pub fn text_in_room(self, room_id: &str, text: &str) -> Self {
        self.text_message(json!({"type": "room", "roomId": room_id}), text, true)
    }

    /// Adds a sticker message from a user.
    #[must_use]
    pub fn sticker_from_user(mut self, user_id: &str) -> Self {
        let n = self.events.len() + 1;
        self.events.push(json!({
            "type": "message",
            "mode": "active",
            "timestamp": 1_700_000_000_000_i64 + n as i64,
            "replyToken": format!("reply-token-{n}"),
            "source": {"type": "user", "userId": user_id},
            "message": {"type": "sticker", "id": n.to_string(), "packageId": "446", "stickerId": "1988"}
        }));
        self
    }

    /// Adds a follow event.
    #[must_use]
    pub fn follow(mut self, user_id: &str) -> Self {
        let n = self.events.len() + 1;
        self.events.push(json!({
            "type": "follow",
            "mode": "active",
            "timestamp": 1_700_000_000_000_i64 + n as i64,
            "replyToken": format!("reply-token-{n}"),
            "source": {"type": "user", "userId": user_id}
        }));
        self
    }

    /// Adds an arbitrary event.
    #[must_use]
    pub fn event(mut self, event: Value) -> Self {
        self.events.push(event);
        self
    }

    /// The delivery as JSON.
    pub fn build_json(&self) -> Value {
        json!({"destination": self.destination, "events": self.events})
    }

    /// The delivery as request body bytes.
    pub fn build(&self) -> Vec<u8> {
        self.build_json().to_string().into_bytes()
    }

    fn text_message(mut self, source: Value, text: &str, with_token: bool) -> Self {
        let n = self.events.len() + 1;
        let mut event = json!({
            "type": "message",
            "mode": "active",
            "timestamp": 1_700_000_000_000_i64 + n as i64,
            "source": source,
            "message": {"type": "text", "id": n.to_string(), "text": text}
        });
        if with_token {
            event["replyToken"] = json!(format!("reply-token-{n}"));
        }

        self.events.push(event);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_events_by_position() {
        let payload = PayloadBuilder::new()
            .follow("U1")
            .text_from_user("U1", "hi")
            .text_from_user_without_token("U1", "again")
            .build_json();

        let events = payload["events"].as_array().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1]["replyToken"], "reply-token-2");
        assert_eq!(events[1]["message"]["id"], "2");
        assert!(events[2].get("replyToken").is_none());
    }

    #[test]
    fn empty_builder_is_verification_request() {
        let payload = PayloadBuilder::new().destination("Uother").build_json();

        assert_eq!(payload, json!({"destination": "Uother", "events": []}));
    }
}
