//! chatlog HTTP API.
//!
//! Receives signed webhook deliveries on `/callback`, records senders and
//! messages, replies through the messaging API, and serves the recorded
//! history on `/users` and `/messages/{user_id}`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod server;
pub mod state;
pub mod webhook;

pub use config::Config;
pub use error::ApiError;
pub use server::{create_router, start_server};
pub use state::{AppState, ChannelSettings};
