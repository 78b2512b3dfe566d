//! HTTP request handlers.
//!
//! - `callback` - Webhook deliveries
//! - `records` - Recorded users and messages
//! - `health` - Health, readiness and liveness probes
//! - `info` - Bot information and index page
//!
//! Failing handlers return [`ApiError`](crate::ApiError), rendered with an
//! error code from the E1001-E9999 taxonomy.

pub mod callback;
pub mod health;
pub mod info;
pub mod records;

pub use callback::callback;
pub use health::{health_check, liveness_check, readiness_check};
pub use info::{index, info};
pub use records::{list_messages, list_users};
