//! Overdue sweep: the stateless query behind the reminder loop.

use chrono::{DateTime, Utc};

use rallysplit_types::models::OverdueObligation;
use rallysplit_types::time;

use crate::{Core, CoreResult, parse_ts_lossy};

impl Core {
    /// Every pending, un-reminded obligation whose session is settled and
    /// past its deadline as of `now`. Stateless beyond `now`: repeated calls
    /// return the same rows until `mark_reminder_sent` flips them out.
    ///
    /// The caller owns the notify-then-flag sequence; a crash between the
    /// two resends on the next tick (at-least-once delivery).
    pub fn overdue(&self, now: DateTime<Utc>) -> CoreResult<Vec<OverdueObligation>> {
        let rows = self.db.overdue_rows(&time::format_ts(now))?;
        Ok(rows
            .into_iter()
            .map(|row| OverdueObligation {
                session_id: row.session_id,
                group_id: row.group_id,
                bill_message_id: row.bill_message_id,
                user_id: row.user_id,
                display_name: row.display_name,
                handle: row.handle,
                amount: row.amount,
                payment_deadline: parse_ts_lossy(&row.payment_deadline, "session payment_deadline"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use rallysplit_db::Database;
    use rallysplit_types::models::SettlementInput;

    use crate::Core;

    fn base() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 18, 0, 0).unwrap()
    }

    fn settled_core() -> (Core, i64) {
        let core = Core::new(Arc::new(Database::open_in_memory().unwrap()));
        let sid = core
            .create_session(-42, 1, "Host", None, None, None, None, base())
            .unwrap();
        core.join(sid, 2, "Ana", None, base() + Duration::minutes(1)).unwrap();
        let costs = SettlementInput {
            court_fee: 40.0,
            tube_price: 95.0,
            shuttles_used: 0,
            total: 40.0,
            per_person: 20.0,
        };
        core.settle(sid, &costs, base()).unwrap();
        (core, sid)
    }

    #[test]
    fn nothing_before_the_deadline() {
        let (core, _) = settled_core();
        assert!(core.overdue(base() + Duration::hours(23)).unwrap().is_empty());
    }

    #[test]
    fn surfaces_each_obligation_until_reminded() {
        let (core, sid) = settled_core();
        let late = base() + Duration::hours(25);

        let first = core.overdue(late).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].user_id, 2);
        assert_eq!(first[0].session_id, sid);
        assert_eq!(first[0].payment_deadline, base() + Duration::hours(24));

        // Stateless: same result on a repeat call.
        assert_eq!(core.overdue(late).unwrap().len(), 1);

        core.mark_reminder_sent(sid, 2, late).unwrap();
        assert!(core.overdue(late).unwrap().is_empty());
        assert!(core.overdue(late + Duration::days(7)).unwrap().is_empty());
    }

    #[test]
    fn paid_obligations_are_never_overdue() {
        let (core, sid) = settled_core();
        core.mark_paid(sid, 2, base() + Duration::hours(1)).unwrap();
        assert!(core.overdue(base() + Duration::hours(25)).unwrap().is_empty());
    }

    #[test]
    fn open_sessions_are_ignored() {
        let (core, _) = settled_core();
        // A second, still-open session with members never surfaces.
        let open_sid = core
            .create_session(-42, 1, "Host", None, None, None, None, base())
            .unwrap();
        core.join(open_sid, 2, "Ana", None, base()).unwrap();

        let overdue = core.overdue(base() + Duration::hours(25)).unwrap();
        assert!(overdue.iter().all(|o| o.session_id != open_sid));
    }
}
