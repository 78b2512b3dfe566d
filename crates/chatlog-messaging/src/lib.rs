//! Outbound side of the chat bot.
//!
//! [`MessagingClient`] talks to the platform's messaging API (replies,
//! pushes, profile lookups); [`ReplyComposer`] decides what to answer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod gold;
pub mod reply;

pub use client::{ClientConfig, MessagingClient, Profile};
pub use error::{MessagingError, Result};
pub use gold::{GoldPriceClient, GoldQuote, PriceValue};
pub use reply::ReplyComposer;
