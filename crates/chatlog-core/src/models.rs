//! Domain models for recorded chat users and messages.
//!
//! Users are keyed by the chat platform's identifier; messages reference
//! their sender and are append-only.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Strongly-typed user identifier.
///
/// Wraps the platform identifier of the conversation partner. For direct
/// chats this is the user id, for group and room chats the group or room id.
///
/// # Example
///
/// ```
/// use chatlog_core::models::UserId;
/// let id = UserId::from("U4af4980629");
/// assert_eq!(id.as_str(), "U4af4980629");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Auto-incrementing message identifier assigned by the database.
pub type MessageId = i64;

/// A conversation partner that has messaged the bot at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Platform identifier, primary key.
    pub user_id: UserId,

    /// Display name, refreshed from the platform profile.
    pub display_name: String,

    /// When the first message from this user was recorded.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name stored for a user whose profile could not be resolved.
    pub fn fallback_name(user_id: &UserId) -> String {
        format!("User {user_id}")
    }
}

/// A text message received from a user. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    /// Database-assigned identifier, increasing in insertion order.
    pub id: MessageId,

    /// Sender of the message.
    pub user_id: UserId,

    /// Message text as sent.
    #[serde(rename = "message")]
    #[sqlx(rename = "message")]
    pub text: String,

    /// When the message was recorded.
    pub created_at: DateTime<Utc>,
}
