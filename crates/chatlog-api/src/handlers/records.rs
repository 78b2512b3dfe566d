//! Read endpoints over recorded users and messages.

use axum::{
    extract::{Path, State},
    Json,
};
use chatlog_core::{Message, User, UserId};
use tracing::{debug, instrument};

use crate::{error::ApiError, AppState};

/// Lists every user in the order they were first seen.
///
/// # Errors
///
/// Returns 500 if the store cannot be read.
#[instrument(name = "list_users", skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.storage.users.list_users().await?;
    debug!(count = users.len(), "Listed users");
    Ok(Json(users))
}

/// Lists one user's messages in insertion order.
///
/// Unknown users have no messages and get an empty list.
///
/// # Errors
///
/// Returns 500 if the store cannot be read.
#[instrument(name = "list_messages", skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state.storage.messages.list_messages(&UserId::from(user_id)).await?;
    debug!(count = messages.len(), "Listed messages");
    Ok(Json(messages))
}
