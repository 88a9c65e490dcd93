use thiserror::Error;

/// Core failure taxonomy. Idempotent re-application (re-join, re-mark-paid)
/// is not an error; mutating something that does not exist is.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("session {0} not found")]
    SessionNotFound(i64),

    #[error("user {0} not found")]
    UserNotFound(i64),

    #[error("no payment for user {user_id} in session {session_id}")]
    PaymentNotFound { session_id: i64, user_id: i64 },

    #[error("session {0} is already settled")]
    AlreadySettled(i64),

    #[error("user {0} has no open proof window")]
    NoProofWindow(i64),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
