//! Payment ledger: each obligation's path from pending to paid, with
//! reminder bookkeeping.

use chrono::{DateTime, Utc};

use rallysplit_types::models::{MemberPaymentStatus, Payment, PaymentStatus, UnpaidMember};
use rallysplit_types::time;

use crate::{Core, CoreError, CoreResult, parse_opt_ts};

impl Core {
    /// Record a participant's claim of payment. Idempotent on an already
    /// paid row (the timestamp is refreshed); fails when the participant was
    /// never billed. No check against the amount: the system records a
    /// claim, it does not verify funds movement.
    pub fn mark_paid(&self, session_id: i64, user_id: i64, now: DateTime<Utc>) -> CoreResult<()> {
        if self.db.mark_payment_paid(session_id, user_id, &time::format_ts(now))? {
            Ok(())
        } else {
            Err(CoreError::PaymentNotFound { session_id, user_id })
        }
    }

    /// Attach an opaque evidence reference (e.g. a submitted screenshot) to
    /// an obligation. Logically independent of `mark_paid`: callers usually
    /// invoke both, but proof never changes status by itself.
    pub fn attach_proof(
        &self,
        session_id: i64,
        user_id: i64,
        evidence_ref: &str,
    ) -> CoreResult<()> {
        if self.db.attach_payment_proof(session_id, user_id, evidence_ref)? {
            Ok(())
        } else {
            Err(CoreError::PaymentNotFound { session_id, user_id })
        }
    }

    /// Payment state for every current "in" member, paid members first in the
    /// order they paid. Members without an obligation row read as pending
    /// with no amount.
    pub fn payment_status(&self, session_id: i64) -> CoreResult<Vec<MemberPaymentStatus>> {
        self.require_session(session_id)?;
        let rows = self.db.member_payment_rows(session_id)?;
        Ok(rows
            .into_iter()
            .map(|row| MemberPaymentStatus {
                user_id: row.user_id,
                display_name: row.display_name,
                handle: row.handle,
                status: PaymentStatus::from_db(&row.payment_status),
                paid_at: parse_opt_ts(row.paid_at.as_deref(), "payment paid_at"),
                amount: row.amount,
            })
            .collect())
    }

    /// Members who were billed and have not paid. Never-billed latecomers
    /// are excluded, not counted as unpaid.
    pub fn unpaid(&self, session_id: i64) -> CoreResult<Vec<UnpaidMember>> {
        self.require_session(session_id)?;
        let rows = self.db.unpaid_rows(session_id)?;
        Ok(rows
            .into_iter()
            .map(|row| UnpaidMember {
                user_id: row.user_id,
                display_name: row.display_name,
                handle: row.handle,
                amount: row.amount,
            })
            .collect())
    }

    /// Flag an obligation as reminded so the overdue sweep never surfaces it
    /// twice. Called by the sweep after the notifier reports success.
    pub fn mark_reminder_sent(
        &self,
        session_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        if self.db.mark_reminder_sent(session_id, user_id, &time::format_ts(now))? {
            Ok(())
        } else {
            Err(CoreError::PaymentNotFound { session_id, user_id })
        }
    }

    pub fn payment(&self, session_id: i64, user_id: i64) -> CoreResult<Option<Payment>> {
        let row = self.db.get_payment(session_id, user_id)?;
        Ok(row.map(|row| Payment {
            session_id: row.session_id,
            user_id: row.user_id,
            amount: row.amount,
            status: PaymentStatus::from_db(&row.status),
            paid_at: parse_opt_ts(row.paid_at.as_deref(), "payment paid_at"),
            proof_ref: row.proof_ref,
            reminder_sent: row.reminder_sent,
            reminder_sent_at: parse_opt_ts(row.reminder_sent_at.as_deref(), "payment reminder_sent_at"),
        }))
    }
}
