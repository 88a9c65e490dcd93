//! Settlement engine: turns entered costs plus the current roster into one
//! payment obligation per participant, exactly once per session.

use chrono::{DateTime, Duration, Utc};

use rallysplit_types::models::{Participant, Session, SessionStatus, SettlementInput};
use rallysplit_types::time;

use crate::{Core, CoreError, CoreResult};

/// Hours between settlement and the payment deadline. A fixed window, not
/// configurable per session.
pub const PAYMENT_WINDOW_HOURS: i64 = 24;

#[derive(Debug)]
pub struct SettlementOutcome {
    /// The session as persisted by the settlement transaction (status
    /// settled, deadline set, final cost figures).
    pub session: Session,
    /// The roster snapshot that was billed, join order ascending.
    pub billed: Vec<Participant>,
}

impl Core {
    /// Settle a session: snapshot the roster, create one payment row per
    /// member (the host's pre-marked paid, since the host collects and does
    /// not owe itself), persist the final cost figures and flip the session
    /// to settled with a deadline of now + 24h. Row creation and the status
    /// flip are one transaction.
    ///
    /// Settlement is strictly once: a second call fails with
    /// `AlreadySettled` rather than silently skewing per-person amounts.
    /// Participants joining afterwards are never billed; participants
    /// leaving afterwards stay billed. The snapshot is final both ways.
    ///
    /// The cost figures come from the calculator collaborator, already
    /// validated as non-negative finite numbers; they are trusted as given.
    pub fn settle(
        &self,
        session_id: i64,
        costs: &SettlementInput,
        now: DateTime<Utc>,
    ) -> CoreResult<SettlementOutcome> {
        let row = self.require_session(session_id)?;
        if SessionStatus::from_db(&row.status) == SessionStatus::Settled {
            return Err(CoreError::AlreadySettled(session_id));
        }

        let billed = self.roster(session_id)?;
        let member_ids: Vec<i64> = billed.iter().map(|p| p.user_id).collect();

        let settled_at = time::format_ts(now);
        let deadline = time::format_ts(now + Duration::hours(PAYMENT_WINDOW_HOURS));

        self.db.settle_session(
            session_id,
            row.host_id,
            &member_ids,
            costs.per_person,
            costs.court_fee,
            costs.tube_price,
            costs.shuttles_used,
            &settled_at,
            &deadline,
        )?;

        let session = self.session(session_id)?;
        Ok(SettlementOutcome { session, billed })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use rallysplit_db::Database;
    use rallysplit_types::models::{PaymentStatus, SessionStatus, SettlementInput};

    use crate::{Core, CoreError};

    fn base() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 18, 0, 0).unwrap()
    }

    fn costs(per_person: f64) -> SettlementInput {
        SettlementInput {
            court_fee: 40.0,
            tube_price: 96.0,
            shuttles_used: 3,
            total: per_person * 3.0,
            per_person,
        }
    }

    fn core_with_roster() -> (Core, i64) {
        let core = Core::new(Arc::new(Database::open_in_memory().unwrap()));
        let sid = core
            .create_session(-42, 1, "Host", None, None, None, None, base())
            .unwrap();
        core.join(sid, 2, "Ana", None, base() + Duration::minutes(1)).unwrap();
        core.join(sid, 3, "Ben", None, base() + Duration::minutes(2)).unwrap();
        (core, sid)
    }

    #[test]
    fn settle_bills_the_roster_host_paid() {
        let (core, sid) = core_with_roster();
        let settled_at = base() + Duration::hours(2);

        let outcome = core.settle(sid, &costs(30.0), settled_at).unwrap();
        assert_eq!(outcome.billed.len(), 3);
        assert_eq!(outcome.session.status, SessionStatus::Settled);
        assert_eq!(outcome.session.settled_at, Some(settled_at));
        assert_eq!(
            outcome.session.payment_deadline,
            Some(settled_at + Duration::hours(24))
        );
        assert_eq!(outcome.session.court_fee, 40.0);
        assert_eq!(outcome.session.shuttles_used, 3);

        let host = core.payment(sid, 1).unwrap().unwrap();
        assert_eq!(host.status, PaymentStatus::Paid);
        for uid in [2, 3] {
            let p = core.payment(sid, uid).unwrap().unwrap();
            assert_eq!(p.status, PaymentStatus::Pending);
            assert_eq!(p.amount, 30.0);
        }
    }

    #[test]
    fn settle_is_strictly_once() {
        let (core, sid) = core_with_roster();
        core.settle(sid, &costs(30.0), base() + Duration::hours(2)).unwrap();

        let err = core.settle(sid, &costs(99.0), base() + Duration::hours(3));
        assert!(matches!(err, Err(CoreError::AlreadySettled(id)) if id == sid));

        // Amounts are untouched by the rejected call.
        assert_eq!(core.payment(sid, 2).unwrap().unwrap().amount, 30.0);
    }

    #[test]
    fn late_joiner_is_on_the_roster_but_not_billed() {
        let (core, sid) = core_with_roster();
        core.settle(sid, &costs(30.0), base() + Duration::hours(2)).unwrap();

        core.join(sid, 4, "Dana", None, base() + Duration::hours(3)).unwrap();
        assert!(core.is_member(sid, 4).unwrap());
        assert!(core.payment(sid, 4).unwrap().is_none());
        assert!(core.unpaid(sid).unwrap().iter().all(|m| m.user_id != 4));
    }

    #[test]
    fn post_settlement_leave_keeps_the_obligation() {
        let (core, sid) = core_with_roster();
        core.settle(sid, &costs(30.0), base() + Duration::hours(2)).unwrap();

        core.leave(sid, 3).unwrap();
        let p = core.payment(sid, 3).unwrap().unwrap();
        assert_eq!(p.status, PaymentStatus::Pending);
        assert_eq!(p.amount, 30.0);
    }
}
