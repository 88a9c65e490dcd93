//! Full lifecycle: open a session, gather RSVPs, settle, track payments,
//! sweep for overdue obligations.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use rallysplit_core::{Core, CoreError};
use rallysplit_db::Database;
use rallysplit_types::models::{PaymentStatus, SessionStatus, SettlementInput};

fn base() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 14, 18, 0, 0).unwrap()
}

#[test]
fn session_lifecycle_end_to_end() {
    let core = Core::new(Arc::new(Database::open_in_memory().unwrap()));

    // Host opens a session; A and B join.
    core.observe_user(1, "Hui", Some("hui")).unwrap();
    let sid = core
        .create_session(-1001, 1, "Hui", Some("hui"), None, Some("Sunway Arena"), Some("Sat 8pm"), base())
        .unwrap();
    core.join(sid, 2, "Ana", None, base() + Duration::minutes(3)).unwrap();
    core.join(sid, 3, "Ben", Some("benz"), base() + Duration::minutes(7)).unwrap();

    assert_eq!(core.roster_count(sid).unwrap(), 3);

    // Host enters costs: court 40, tube 96, 3 shuttles used.
    // The calculator derives shuttle cost 96/12*3 = 24, total 64,
    // per-person 64/3 = 21.33... and hands the figures over.
    let total = 40.0 + 96.0 / 12.0 * 3.0;
    let per_person = total / 3.0;
    let costs = SettlementInput {
        court_fee: 40.0,
        tube_price: 96.0,
        shuttles_used: 3,
        total,
        per_person,
    };
    let settled_at = base() + Duration::hours(4);
    let outcome = core.settle(sid, &costs, settled_at).unwrap();

    assert_eq!(outcome.session.status, SessionStatus::Settled);
    assert_eq!(outcome.session.payment_deadline, Some(settled_at + Duration::hours(24)));
    assert_eq!(outcome.billed.len(), 3);

    let host = core.payment(sid, 1).unwrap().unwrap();
    assert_eq!(host.status, PaymentStatus::Paid);
    assert_eq!(host.amount, per_person);
    for uid in [2, 3] {
        let p = core.payment(sid, uid).unwrap().unwrap();
        assert_eq!(p.status, PaymentStatus::Pending);
        assert_eq!(p.amount, per_person);
    }

    // Ana claims paid and uploads a screenshot through her proof window.
    let claim_at = settled_at + Duration::hours(2);
    core.mark_paid(sid, 2, claim_at).unwrap();
    core.open_proof_intent(2, sid, claim_at);
    let target = core.take_proof_intent(2, claim_at + Duration::minutes(2)).unwrap();
    assert_eq!(target, sid);
    core.attach_proof(target, 2, "photo-77").unwrap();

    let unpaid = core.unpaid(sid).unwrap();
    assert_eq!(unpaid.len(), 1);
    assert_eq!(unpaid[0].user_id, 3);

    // Past the deadline, only Ben surfaces; after the reminder is recorded,
    // nothing does, however often the sweep re-runs.
    let late = settled_at + Duration::hours(30);
    let overdue = core.overdue(late).unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].user_id, 3);
    assert_eq!(overdue[0].group_id, -1001);
    assert_eq!(overdue[0].amount, per_person);

    core.mark_reminder_sent(sid, 3, late).unwrap();
    assert!(core.overdue(late).unwrap().is_empty());

    // Ben eventually pays too; the settled session stays settled.
    core.mark_paid(sid, 3, late + Duration::hours(1)).unwrap();
    assert!(core.unpaid(sid).unwrap().is_empty());
    assert!(matches!(
        core.settle(sid, &costs, late + Duration::hours(2)),
        Err(CoreError::AlreadySettled(_))
    ));

    // Paid-order view: host (settlement), Ana, Ben.
    let ids: Vec<i64> = core.payment_status(sid).unwrap().iter().map(|e| e.user_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}
