//! Error types and result handling for webhook and storage operations.
//!
//! Storage code reports [`CoreError`]; request handling reports
//! [`ChatlogError`], whose codes are stable and returned to clients.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for storage operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Entity not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Constraint violation.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("requested entity not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::ConstraintViolation(format!("unique constraint violation: {db_err}"))
            },
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                Self::ConstraintViolation(format!("foreign key constraint violation: {db_err}"))
            },
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                Self::ConstraintViolation(format!("check constraint violation: {db_err}"))
            },
            _ => Self::Database(err.to_string()),
        }
    }
}

/// Request-level errors with client-facing codes.
#[derive(Debug, Error)]
pub enum ChatlogError {
    // Webhook errors (E1001-E1004)
    /// HMAC signature did not match the request body (E1001).
    #[error("[E1001] Invalid signature: HMAC validation failed")]
    InvalidSignature,

    /// Signature header absent from the webhook request (E1002).
    #[error("[E1002] Missing signature: {header} header is required")]
    MissingSignature {
        /// Name of the expected header
        header: &'static str,
    },

    /// Body is not a valid webhook payload (E1003).
    #[error("[E1003] Malformed payload: {reason}")]
    MalformedPayload {
        /// Parser error description
        reason: String,
    },

    /// Body exceeds the accepted size (E1004).
    #[error("[E1004] Payload too large: size {size_bytes} bytes exceeds {limit_bytes} bytes")]
    PayloadTooLarge {
        /// Size of the payload in bytes
        size_bytes: usize,
        /// Accepted size in bytes
        limit_bytes: usize,
    },

    // Upstream errors (E2001)
    /// Messaging API call failed (E2001).
    #[error("[E2001] Messaging API error: {0}")]
    MessagingApi(String),

    // System errors (E3001)
    /// Storage layer failed (E3001).
    #[error("[E3001] Storage error: {0}")]
    Storage(#[from] CoreError),

    /// Generic error for wrapping other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChatlogError {
    /// Returns the error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "E1001",
            Self::MissingSignature { .. } => "E1002",
            Self::MalformedPayload { .. } => "E1003",
            Self::PayloadTooLarge { .. } => "E1004",
            Self::MessagingApi(_) => "E2001",
            Self::Storage(_) => "E3001",
            Self::Other(_) => "E9999",
        }
    }
}

impl From<sqlx::Error> for ChatlogError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(CoreError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ChatlogError::InvalidSignature.code(), "E1001");
        assert_eq!(ChatlogError::MissingSignature { header: "x-line-signature" }.code(), "E1002");
        assert_eq!(ChatlogError::MalformedPayload { reason: String::new() }.code(), "E1003");
        assert_eq!(
            ChatlogError::PayloadTooLarge { size_bytes: 2, limit_bytes: 1 }.code(),
            "E1004"
        );
        assert_eq!(ChatlogError::MessagingApi("down".into()).code(), "E2001");
        assert_eq!(ChatlogError::Storage(CoreError::Database("x".into())).code(), "E3001");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = CoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn messages_carry_codes() {
        let err = ChatlogError::PayloadTooLarge { size_bytes: 2048, limit_bytes: 1024 };
        assert_eq!(
            err.to_string(),
            "[E1004] Payload too large: size 2048 bytes exceeds 1024 bytes"
        );
    }
}
