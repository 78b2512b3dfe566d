//! Core domain models, storage and error handling.
//!
//! Provides the user and message models recorded from inbound chat webhooks,
//! the SQLite-backed repositories that persist them, and the error taxonomy
//! shared by the HTTP and messaging crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod storage;
pub mod time;

pub use error::{ChatlogError, CoreError, Result};
pub use models::{Message, MessageId, User, UserId};
pub use storage::{Storage, StorageOptions};
pub use time::{Clock, RealClock, TestClock};
