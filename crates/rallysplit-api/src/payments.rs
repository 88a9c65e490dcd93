use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::warn;

use rallysplit_core::{Core, CoreError};
use rallysplit_types::api::{
    ClaimPaidRequest, PaymentStatusEntry, PaymentStatusView, SubmitProofRequest,
};

use crate::{AppState, error_status, join_error};

pub async fn payment_status(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let core = state.core.clone();
    let view = tokio::task::spawn_blocking(move || status_view(&core, session_id))
        .await
        .map_err(join_error)?
        .map_err(error_status)?;

    Ok(Json(view))
}

/// A participant claims they paid. Marks the obligation and opens a proof
/// window so a follow-up screenshot lands on the right session.
pub async fn claim_paid(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Json(req): Json<ClaimPaidRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let core = state.core.clone();
    let view = tokio::task::spawn_blocking(move || -> Result<PaymentStatusView, CoreError> {
        core.observe_user(req.actor.id, &req.actor.display_name, req.actor.handle.as_deref())?;
        let now = Utc::now();
        core.mark_paid(session_id, req.actor.id, now)?;
        core.open_proof_intent(req.actor.id, session_id, now);
        status_view(&core, session_id)
    })
    .await
    .map_err(join_error)?
    .map_err(error_status)?;

    Ok(Json(view))
}

/// Evidence upload without an explicit session: the target is resolved from
/// the uploader's open proof window. An expired or absent window tells the
/// transport to ask the user to claim again.
pub async fn submit_proof(
    State(state): State<AppState>,
    Json(req): Json<SubmitProofRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let core = state.core.clone();
    tokio::task::spawn_blocking(move || -> Result<(), CoreError> {
        core.observe_user(req.actor.id, &req.actor.display_name, req.actor.handle.as_deref())?;
        let now = Utc::now();
        let Some(session_id) = core.take_proof_intent(req.actor.id, now) else {
            warn!("No open proof window for user {}", req.actor.id);
            return Err(CoreError::NoProofWindow(req.actor.id));
        };
        core.attach_proof(session_id, req.actor.id, &req.evidence_ref)
    })
    .await
    .map_err(join_error)?
    .map_err(error_status)?;

    Ok(StatusCode::NO_CONTENT)
}

fn status_view(core: &Core, session_id: i64) -> Result<PaymentStatusView, CoreError> {
    let entries = core
        .payment_status(session_id)?
        .into_iter()
        .map(|m| PaymentStatusEntry {
            user_id: m.user_id,
            display_name: m.display_name,
            handle: m.handle,
            status: m.status,
            paid_at: m.paid_at,
            amount: m.amount,
        })
        .collect();

    Ok(PaymentStatusView {
        session_id,
        entries,
    })
}
