//! Webhook payload model.
//!
//! Only the parts of a delivery the service acts on are modelled. Unknown
//! event, source, and message types deserialize to an `Other` variant so a
//! delivery mixing supported and unsupported events still parses.

use std::fmt;

use chatlog_core::{ChatlogError, UserId};
use serde::Deserialize;

/// Body of a webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    /// Bot user id the delivery is addressed to.
    #[serde(default)]
    pub destination: Option<String>,
    /// Events in delivery order. Empty for verification requests.
    pub events: Vec<Event>,
}

/// One webhook event.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    /// A message sent to the bot.
    Message(MessageEvent),
    /// Follow, unfollow, postback and every other event type.
    #[serde(other)]
    Other,
}

/// Message event body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    /// Single-use token for answering this event.
    #[serde(default)]
    pub reply_token: Option<String>,
    /// Where the message came from.
    #[serde(default)]
    pub source: Option<Source>,
    /// Event time in milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// The message itself.
    pub message: MessageContent,
}

/// Event source.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
    /// One-to-one chat.
    User {
        /// Sending user.
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
    },
    /// Group chat.
    Group {
        /// Group the message was sent in.
        #[serde(rename = "groupId", default)]
        group_id: Option<String>,
    },
    /// Multi-person chat.
    Room {
        /// Room the message was sent in.
        #[serde(rename = "roomId", default)]
        room_id: Option<String>,
    },
    /// Unrecognised source type.
    #[serde(other)]
    Other,
}

/// Message payload of a message event.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    /// Plain text message.
    Text {
        /// Platform message id.
        id: String,
        /// Text as sent.
        text: String,
    },
    /// Stickers, images, locations and other non-text messages.
    #[serde(other)]
    Other,
}

/// Kind of conversation a sender id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A user; has a profile.
    User,
    /// A group.
    Group,
    /// A room.
    Room,
}

/// Identity messages are recorded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    /// User, group, or room id.
    pub id: UserId,
    /// What the id refers to.
    pub kind: SourceKind,
}

impl Sender {
    /// Display name for senders without a profile.
    ///
    /// Returns `None` for users, whose name comes from a profile lookup.
    pub fn conversation_name(&self) -> Option<String> {
        match self.kind {
            SourceKind::User => None,
            SourceKind::Group => Some(format!("Group {}", self.id)),
            SourceKind::Room => Some(format!("Room {}", self.id)),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Group => write!(f, "group"),
            Self::Room => write!(f, "room"),
        }
    }
}

/// A text message extracted from a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingText {
    /// Who sent it.
    pub sender: Sender,
    /// Reply token, when the event carries a usable one.
    pub reply_token: Option<String>,
    /// Platform message id.
    pub message_id: String,
    /// Text as sent.
    pub text: String,
}

impl WebhookPayload {
    /// Parses a raw request body.
    ///
    /// # Errors
    ///
    /// Returns `ChatlogError::MalformedPayload` if the body is not a
    /// webhook delivery.
    pub fn parse(body: &[u8]) -> Result<Self, ChatlogError> {
        serde_json::from_slice(body)
            .map_err(|e| ChatlogError::MalformedPayload { reason: e.to_string() })
    }

    /// Text messages with a known sender, in delivery order.
    pub fn text_messages(&self) -> Vec<IncomingText> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Message(message) => message.as_incoming_text(),
                Event::Other => None,
            })
            .collect()
    }
}

impl MessageEvent {
    fn as_incoming_text(&self) -> Option<IncomingText> {
        let MessageContent::Text { id, text } = &self.message else {
            return None;
        };
        let sender = self.source.as_ref().and_then(Source::sender)?;
        let reply_token = self.reply_token.clone().filter(|token| !token.trim().is_empty());

        Some(IncomingText { sender, reply_token, message_id: id.clone(), text: text.clone() })
    }
}

impl Source {
    /// Sender identity, if the source names one.
    pub fn sender(&self) -> Option<Sender> {
        let (id, kind) = match self {
            Self::User { user_id } => (user_id.as_deref(), SourceKind::User),
            Self::Group { group_id } => (group_id.as_deref(), SourceKind::Group),
            Self::Room { room_id } => (room_id.as_deref(), SourceKind::Room),
            Self::Other => return None,
        };

        id.filter(|id| !id.trim().is_empty())
            .map(|id| Sender { id: UserId::from(id), kind })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: &serde_json::Value) -> WebhookPayload {
        WebhookPayload::parse(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn extracts_user_text_message() {
        let payload = parse(&json!({
            "destination": "Ubot",
            "events": [{
                "type": "message",
                "replyToken": "token-1",
                "timestamp": 1_700_000_000_000_i64,
                "source": {"type": "user", "userId": "U1"},
                "message": {"type": "text", "id": "100", "text": "Hello"}
            }]
        }));

        let messages = payload.text_messages();

        assert_eq!(payload.destination.as_deref(), Some("Ubot"));
        assert_eq!(messages, vec![IncomingText {
            sender: Sender { id: UserId::from("U1"), kind: SourceKind::User },
            reply_token: Some("token-1".to_string()),
            message_id: "100".to_string(),
            text: "Hello".to_string(),
        }]);
    }

    #[test]
    fn group_and_room_sources_use_conversation_ids() {
        let payload = parse(&json!({
            "events": [
                {
                    "type": "message",
                    "source": {"type": "group", "groupId": "C1", "userId": "U1"},
                    "message": {"type": "text", "id": "1", "text": "in group"}
                },
                {
                    "type": "message",
                    "source": {"type": "room", "roomId": "R1"},
                    "message": {"type": "text", "id": "2", "text": "in room"}
                }
            ]
        }));

        let senders: Vec<Sender> = payload.text_messages().into_iter().map(|m| m.sender).collect();

        assert_eq!(senders[0], Sender { id: UserId::from("C1"), kind: SourceKind::Group });
        assert_eq!(senders[0].conversation_name().as_deref(), Some("Group C1"));
        assert_eq!(senders[1].conversation_name().as_deref(), Some("Room R1"));
    }

    #[test]
    fn non_text_and_non_message_events_are_skipped() {
        let payload = parse(&json!({
            "events": [
                {"type": "follow", "replyToken": "t", "source": {"type": "user", "userId": "U1"}},
                {
                    "type": "message",
                    "source": {"type": "user", "userId": "U1"},
                    "message": {"type": "sticker", "id": "5", "packageId": "1", "stickerId": "2"}
                },
                {"type": "postback", "postback": {"data": "x"}}
            ]
        }));

        assert_eq!(payload.events.len(), 3);
        assert!(payload.text_messages().is_empty());
    }

    #[test]
    fn events_without_usable_source_are_skipped() {
        let payload = parse(&json!({
            "events": [
                {"type": "message", "message": {"type": "text", "id": "1", "text": "a"}},
                {
                    "type": "message",
                    "source": {"type": "user", "userId": ""},
                    "message": {"type": "text", "id": "2", "text": "b"}
                },
                {
                    "type": "message",
                    "source": {"type": "unknown"},
                    "message": {"type": "text", "id": "3", "text": "c"}
                }
            ]
        }));

        assert!(payload.text_messages().is_empty());
    }

    #[test]
    fn blank_reply_token_is_dropped() {
        let payload = parse(&json!({
            "events": [{
                "type": "message",
                "replyToken": "",
                "source": {"type": "user", "userId": "U1"},
                "message": {"type": "text", "id": "1", "text": "hi"}
            }]
        }));

        assert_eq!(payload.text_messages()[0].reply_token, None);
    }

    #[test]
    fn empty_event_list_is_valid() {
        let payload = parse(&json!({"destination": "Ubot", "events": []}));

        assert!(payload.events.is_empty());
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        for body in [&b"not json"[..], b"{}", b"[]", br#"{"events": "nope"}"#] {
            let err = WebhookPayload::parse(body).unwrap_err();
            assert_eq!(err.code(), "E1003", "body {:?}", String::from_utf8_lossy(body));
        }
    }
}
