//! HTTP adapter between the chat transport and the core. One route per
//! intent; handlers feed the actor through the identity registry, invoke one
//! core operation, and hand back the view the transport renders.

pub mod middleware;
pub mod payments;
pub mod sessions;
pub mod users;

use std::sync::Arc;

use axum::http::StatusCode;
use tracing::error;

use rallysplit_core::{Core, CoreError};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub core: Core,
}

pub(crate) fn error_status(err: CoreError) -> StatusCode {
    match err {
        CoreError::SessionNotFound(_)
        | CoreError::UserNotFound(_)
        | CoreError::PaymentNotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::NoProofWindow(_) => StatusCode::GONE,
        CoreError::AlreadySettled(_) => StatusCode::CONFLICT,
        CoreError::Storage(e) => {
            error!("storage error: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub(crate) fn join_error(e: tokio::task::JoinError) -> StatusCode {
    error!("spawn_blocking join error: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}
