use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default price of a tube of shuttlecocks, in the group's currency.
pub const DEFAULT_TUBE_PRICE: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Open,
    Settled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "open",
            SessionStatus::Settled => "settled",
        }
    }

    /// Unknown values fall back to `Open`. The store only ever writes the
    /// two known strings, so anything else is hand-edited data.
    pub fn from_db(raw: &str) -> Self {
        match raw {
            "open" => SessionStatus::Open,
            "settled" => SessionStatus::Settled,
            other => {
                warn!("Unknown session status '{}', treating as open", other);
                SessionStatus::Open
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    In,
    Out,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::In => "in",
            MemberStatus::Out => "out",
        }
    }

    pub fn from_db(raw: &str) -> Self {
        match raw {
            "in" => MemberStatus::In,
            "out" => MemberStatus::Out,
            other => {
                warn!("Unknown member status '{}', treating as out", other);
                MemberStatus::Out
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn from_db(raw: &str) -> Self {
        match raw {
            "pending" => PaymentStatus::Pending,
            "paid" => PaymentStatus::Paid,
            other => {
                warn!("Unknown payment status '{}', treating as pending", other);
                PaymentStatus::Pending
            }
        }
    }
}

/// A known user. Ids are assigned by the chat platform and stable; the name
/// and handle are refreshed on every observed interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    pub payout_qr: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A single billable event: one evening of court time for one group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub group_id: i64,
    pub host_id: i64,
    pub title: String,
    pub location: Option<String>,
    pub schedule: Option<String>,
    pub court_fee: f64,
    pub tube_price: f64,
    pub shuttles_used: i64,
    pub status: SessionStatus,
    pub settled_at: Option<DateTime<Utc>>,
    pub payment_deadline: Option<DateTime<Utc>>,
    pub message_id: Option<i64>,
    pub bill_message_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Roster membership. The name/handle are a snapshot taken at join time so
/// the roster renders consistently even if the user later renames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub session_id: i64,
    pub user_id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    pub status: MemberStatus,
    pub joined_at: DateTime<Utc>,
}

/// One participant's obligation for one session. Created at settlement time;
/// (session_id, user_id, amount) never change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub session_id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub proof_ref: Option<String>,
    pub reminder_sent: bool,
    pub reminder_sent_at: Option<DateTime<Utc>>,
}

/// Joined roster/ledger view row: every current "in" member with their
/// payment state, defaulting to pending when no obligation row exists yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberPaymentStatus {
    pub user_id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    /// None when the member was never billed (joined after settlement).
    pub amount: Option<f64>,
}

/// A billed member who has not paid yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnpaidMember {
    pub user_id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    pub amount: f64,
}

/// An obligation past its deadline that still needs a reminder, with enough
/// context for the notifier to render one without further lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueObligation {
    pub session_id: i64,
    pub group_id: i64,
    pub bill_message_id: Option<i64>,
    pub user_id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    pub amount: f64,
    pub payment_deadline: DateTime<Utc>,
}

/// Explicitly enumerated mutable session fields for partial updates. Status
/// and the settlement fields are absent on purpose; only the settlement
/// transaction writes those.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionPatch {
    pub title: Option<String>,
    pub location: Option<String>,
    pub schedule: Option<String>,
    pub court_fee: Option<f64>,
    pub tube_price: Option<f64>,
    pub shuttles_used: Option<i64>,
    pub message_id: Option<i64>,
    pub bill_message_id: Option<i64>,
}

impl SessionPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.location.is_none()
            && self.schedule.is_none()
            && self.court_fee.is_none()
            && self.tube_price.is_none()
            && self.shuttles_used.is_none()
            && self.message_id.is_none()
            && self.bill_message_id.is_none()
    }
}

/// Final cost figures for a settlement, as computed by the calculator
/// front-end. The core trusts these as given.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SettlementInput {
    pub court_fee: f64,
    pub tube_price: f64,
    pub shuttles_used: i64,
    pub total: f64,
    pub per_person: f64,
}
