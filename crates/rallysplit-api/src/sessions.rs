use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use rallysplit_core::{Core, CoreError};
use rallysplit_types::api::{
    CreateSessionRequest, HostInfo, MessageRefsPatch, RosterMember, RosterView, RsvpRequest,
    SettleRequest, SettlementSummary,
};
use rallysplit_types::models::{Participant, SessionPatch};

use crate::{AppState, error_status, join_error};

pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let core = state.core.clone();
    let view = tokio::task::spawn_blocking(move || -> Result<RosterView, CoreError> {
        core.observe_user(req.actor.id, &req.actor.display_name, req.actor.handle.as_deref())?;
        let session_id = core.create_session(
            req.group_id,
            req.actor.id,
            &req.actor.display_name,
            req.actor.handle.as_deref(),
            req.title.as_deref(),
            req.location.as_deref(),
            req.schedule.as_deref(),
            Utc::now(),
        )?;
        roster_view(&core, session_id)
    })
    .await
    .map_err(join_error)?
    .map_err(error_status)?;

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let core = state.core.clone();
    let view = tokio::task::spawn_blocking(move || roster_view(&core, session_id))
        .await
        .map_err(join_error)?
        .map_err(error_status)?;

    Ok(Json(view))
}

pub async fn join_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Json(req): Json<RsvpRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let core = state.core.clone();
    let view = tokio::task::spawn_blocking(move || -> Result<RosterView, CoreError> {
        core.observe_user(req.actor.id, &req.actor.display_name, req.actor.handle.as_deref())?;
        core.join(
            session_id,
            req.actor.id,
            &req.actor.display_name,
            req.actor.handle.as_deref(),
            Utc::now(),
        )?;
        roster_view(&core, session_id)
    })
    .await
    .map_err(join_error)?
    .map_err(error_status)?;

    Ok(Json(view))
}

pub async fn leave_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Json(req): Json<RsvpRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let core = state.core.clone();
    let view = tokio::task::spawn_blocking(move || -> Result<RosterView, CoreError> {
        core.observe_user(req.actor.id, &req.actor.display_name, req.actor.handle.as_deref())?;
        core.leave(session_id, req.actor.id)?;
        roster_view(&core, session_id)
    })
    .await
    .map_err(join_error)?
    .map_err(error_status)?;

    Ok(Json(view))
}

/// The transport owns message-id bookkeeping; the core just stores the
/// references opaquely.
pub async fn patch_messages(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Json(req): Json<MessageRefsPatch>,
) -> Result<impl IntoResponse, StatusCode> {
    let core = state.core.clone();
    tokio::task::spawn_blocking(move || {
        let patch = SessionPatch {
            message_id: req.message_id,
            bill_message_id: req.bill_message_id,
            ..Default::default()
        };
        core.update_session(session_id, &patch)
    })
    .await
    .map_err(join_error)?
    .map_err(error_status)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn settle_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Json(req): Json<SettleRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let core = state.core.clone();
    let summary = tokio::task::spawn_blocking(move || -> Result<SettlementSummary, CoreError> {
        core.observe_user(req.actor.id, &req.actor.display_name, req.actor.handle.as_deref())?;
        let outcome = core.settle(session_id, &req.costs(), Utc::now())?;

        // The bill card needs the host's saved payout QR, if any.
        let host = core.user(outcome.session.host_id)?;
        let host_id = outcome.session.host_id;

        Ok(SettlementSummary {
            session_id: outcome.session.id,
            total: req.total,
            per_person: req.per_person,
            court_fee: outcome.session.court_fee,
            tube_price: outcome.session.tube_price,
            shuttles_used: outcome.session.shuttles_used,
            payment_deadline: outcome.session.payment_deadline,
            host: HostInfo {
                user_id: host.id,
                display_name: host.display_name,
                handle: host.handle,
                payout_qr: host.payout_qr,
            },
            billed: outcome
                .billed
                .into_iter()
                .map(|p| roster_member(p, host_id))
                .collect(),
        })
    })
    .await
    .map_err(join_error)?
    .map_err(error_status)?;

    Ok(Json(summary))
}

fn roster_member(p: Participant, host_id: i64) -> RosterMember {
    RosterMember {
        user_id: p.user_id,
        is_host: p.user_id == host_id,
        display_name: p.display_name,
        handle: p.handle,
        joined_at: p.joined_at,
    }
}

pub(crate) fn roster_view(core: &Core, session_id: i64) -> Result<RosterView, CoreError> {
    let session = core.session(session_id)?;
    let members: Vec<RosterMember> = core
        .roster(session_id)?
        .into_iter()
        .map(|p| roster_member(p, session.host_id))
        .collect();

    Ok(RosterView {
        session_id: session.id,
        group_id: session.group_id,
        status: session.status,
        title: session.title,
        location: session.location,
        schedule: session.schedule,
        host_id: session.host_id,
        member_count: members.len(),
        members,
    })
}
