use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use rallysplit_types::api::{SetPayoutQrRequest, UserView};

use crate::{AppState, error_status, join_error};

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let core = state.core.clone();
    let user = tokio::task::spawn_blocking(move || core.user(user_id))
        .await
        .map_err(join_error)?
        .map_err(error_status)?;

    Ok(Json(UserView {
        id: user.id,
        display_name: user.display_name,
        handle: user.handle,
        payout_qr: user.payout_qr,
        created_at: user.created_at,
    }))
}

/// Save a payout-QR reference for later bill cards. The user must already be
/// known; every inbound intent observes its actor, so in practice they are.
pub async fn set_payout_qr(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<SetPayoutQrRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let core = state.core.clone();
    tokio::task::spawn_blocking(move || core.set_payout_ref(user_id, &req.qr_ref))
        .await
        .map_err(join_error)?
        .map_err(error_status)?;

    Ok(StatusCode::NO_CONTENT)
}
