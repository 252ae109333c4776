use thiserror::Error;

use tgflow_core::UserId;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A data value exists under `key` but holds a different type.
    #[error("session data {key:?} holds {found}, not {expected}")]
    DataTypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The operation needs a live session and the user has none.
    #[error("no active session for user {user_id}")]
    NoSession { user_id: UserId },
}

pub type Result<T> = std::result::Result<T, SessionError>;
