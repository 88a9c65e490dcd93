/// Database row types — these map directly to SQLite rows.
/// Distinct from the rallysplit-types domain models to keep the DB layer
/// independent; timestamps stay as stored strings here and are parsed by the
/// core when rows are lifted into domain types.

pub struct UserRow {
    pub id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    pub payout_qr: Option<String>,
    pub created_at: String,
}

pub struct SessionRow {
    pub id: i64,
    pub group_id: i64,
    pub host_id: i64,
    pub title: String,
    pub location: Option<String>,
    pub schedule: Option<String>,
    pub court_fee: f64,
    pub tube_price: f64,
    pub shuttles_used: i64,
    pub status: String,
    pub settled_at: Option<String>,
    pub payment_deadline: Option<String>,
    pub message_id: Option<i64>,
    pub bill_message_id: Option<i64>,
    pub created_at: String,
}

pub struct ParticipantRow {
    pub session_id: i64,
    pub user_id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    pub status: String,
    pub joined_at: String,
}

pub struct PaymentRow {
    pub session_id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub status: String,
    pub paid_at: Option<String>,
    pub proof_ref: Option<String>,
    pub reminder_sent: bool,
    pub reminder_sent_at: Option<String>,
}

/// LEFT JOIN of roster against payments: a member with no payment row yet
/// carries a NULL amount and a status coalesced to 'pending'.
pub struct MemberPaymentRow {
    pub user_id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    pub payment_status: String,
    pub paid_at: Option<String>,
    pub amount: Option<f64>,
}

pub struct UnpaidRow {
    pub user_id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    pub amount: f64,
}

pub struct OverdueRow {
    pub session_id: i64,
    pub group_id: i64,
    pub bill_message_id: Option<i64>,
    pub user_id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    pub amount: f64,
    pub payment_deadline: String,
}
