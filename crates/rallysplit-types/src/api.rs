use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{PaymentStatus, SessionStatus, SettlementInput};

// -- Actor --

/// Identity snapshot of the user behind an intent, as seen by the chat
/// transport. Fed through the identity registry before the intent itself is
/// dispatched, so names and handles stay fresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorInfo {
    pub id: i64,
    pub display_name: String,
    pub handle: Option<String>,
}

// -- Sessions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSessionRequest {
    pub group_id: i64,
    pub actor: ActorInfo,
    pub title: Option<String>,
    pub location: Option<String>,
    pub schedule: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RsvpRequest {
    pub actor: ActorInfo,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageRefsPatch {
    pub message_id: Option<i64>,
    pub bill_message_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettleRequest {
    pub actor: ActorInfo,
    pub court_fee: f64,
    pub tube_price: f64,
    pub shuttles_used: i64,
    pub total: f64,
    pub per_person: f64,
}

impl SettleRequest {
    pub fn costs(&self) -> SettlementInput {
        SettlementInput {
            court_fee: self.court_fee,
            tube_price: self.tube_price,
            shuttles_used: self.shuttles_used,
            total: self.total,
            per_person: self.per_person,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RosterMember {
    pub user_id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    pub is_host: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RosterView {
    pub session_id: i64,
    pub group_id: i64,
    pub status: SessionStatus,
    pub title: String,
    pub location: Option<String>,
    pub schedule: Option<String>,
    pub host_id: i64,
    pub member_count: usize,
    pub members: Vec<RosterMember>,
}

// -- Settlement --

#[derive(Debug, Serialize)]
pub struct HostInfo {
    pub user_id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    /// Saved payout-QR reference, when the host registered one.
    pub payout_qr: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SettlementSummary {
    pub session_id: i64,
    pub total: f64,
    pub per_person: f64,
    pub court_fee: f64,
    pub tube_price: f64,
    pub shuttles_used: i64,
    pub payment_deadline: Option<DateTime<Utc>>,
    pub host: HostInfo,
    pub billed: Vec<RosterMember>,
}

// -- Payments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClaimPaidRequest {
    pub actor: ActorInfo,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitProofRequest {
    pub actor: ActorInfo,
    pub evidence_ref: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusEntry {
    pub user_id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub amount: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusView {
    pub session_id: i64,
    pub entries: Vec<PaymentStatusEntry>,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetPayoutQrRequest {
    pub qr_ref: String,
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    pub payout_qr: Option<String>,
    pub created_at: DateTime<Utc>,
}
