use crate::Database;
use crate::models::{
    MemberPaymentRow, OverdueRow, ParticipantRow, PaymentRow, SessionRow, UnpaidRow, UserRow,
};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use rusqlite::types::ToSql;

use rallysplit_types::models::SessionPatch;

impl Database {
    // -- Users --

    pub fn upsert_user(&self, id: i64, display_name: &str, handle: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, display_name, handle) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                     display_name = excluded.display_name,
                     handle = excluded.handle",
                rusqlite::params![id, display_name, handle],
            )?;
            Ok(())
        })
    }

    /// Returns false when no such user exists.
    pub fn set_payout_qr(&self, user_id: i64, qr_ref: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET payout_qr = ?1 WHERE id = ?2",
                rusqlite::params![qr_ref, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, id))
    }

    // -- Sessions --

    pub fn insert_session(
        &self,
        group_id: i64,
        host_id: i64,
        title: &str,
        location: Option<&str>,
        schedule: Option<&str>,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (group_id, host_id, title, location, schedule)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![group_id, host_id, title, location, schedule],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_session(&self, id: i64) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| query_session(conn, id))
    }

    /// Merge only the fields present in the patch. The columns are fixed by
    /// `SessionPatch`; nothing caller-supplied ever reaches the SQL text.
    /// Returns false when the session does not exist or the patch is empty.
    pub fn update_session(&self, id: i64, patch: &SessionPatch) -> Result<bool> {
        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<&dyn ToSql> = Vec::new();

        if let Some(v) = &patch.title {
            sets.push("title = ?");
            params.push(v);
        }
        if let Some(v) = &patch.location {
            sets.push("location = ?");
            params.push(v);
        }
        if let Some(v) = &patch.schedule {
            sets.push("schedule = ?");
            params.push(v);
        }
        if let Some(v) = &patch.court_fee {
            sets.push("court_fee = ?");
            params.push(v);
        }
        if let Some(v) = &patch.tube_price {
            sets.push("tube_price = ?");
            params.push(v);
        }
        if let Some(v) = &patch.shuttles_used {
            sets.push("shuttles_used = ?");
            params.push(v);
        }
        if let Some(v) = &patch.message_id {
            sets.push("message_id = ?");
            params.push(v);
        }
        if let Some(v) = &patch.bill_message_id {
            sets.push("bill_message_id = ?");
            params.push(v);
        }

        if sets.is_empty() {
            return Ok(false);
        }
        params.push(&id);

        let sql = format!("UPDATE sessions SET {} WHERE id = ?", sets.join(", "));
        self.with_conn(|conn| {
            let changed = conn.execute(&sql, params.as_slice())?;
            Ok(changed > 0)
        })
    }

    // -- Participants --

    /// Insert-or-resurrect: a re-join flips a previous "out" row back to
    /// "in" and refreshes the snapshot, never duplicating the row.
    pub fn upsert_participant(
        &self,
        session_id: i64,
        user_id: i64,
        display_name: &str,
        handle: Option<&str>,
        joined_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO session_participants (session_id, user_id, display_name, handle, status, joined_at)
                 VALUES (?1, ?2, ?3, ?4, 'in', ?5)
                 ON CONFLICT(session_id, user_id) DO UPDATE SET
                     status = 'in',
                     display_name = excluded.display_name,
                     handle = excluded.handle,
                     joined_at = excluded.joined_at",
                rusqlite::params![session_id, user_id, display_name, handle, joined_at],
            )?;
            Ok(())
        })
    }

    /// Returns false when the user never joined this session.
    pub fn set_participant_out(&self, session_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE session_participants SET status = 'out'
                 WHERE session_id = ?1 AND user_id = ?2",
                rusqlite::params![session_id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn participants(&self, session_id: i64) -> Result<Vec<ParticipantRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, user_id, display_name, handle, status, joined_at
                 FROM session_participants
                 WHERE session_id = ?1 AND status = 'in'
                 ORDER BY joined_at ASC",
            )?;

            let rows = stmt
                .query_map([session_id], |row| {
                    Ok(ParticipantRow {
                        session_id: row.get(0)?,
                        user_id: row.get(1)?,
                        display_name: row.get(2)?,
                        handle: row.get(3)?,
                        status: row.get(4)?,
                        joined_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn participant_count(&self, session_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM session_participants
                 WHERE session_id = ?1 AND status = 'in'",
                [session_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    pub fn participant_status(&self, session_id: i64, user_id: i64) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT status FROM session_participants
                 WHERE session_id = ?1 AND user_id = ?2",
                rusqlite::params![session_id, user_id],
                |row| row.get(0),
            )
            .optional()
        })
    }

    // -- Payments --

    /// The settlement write: one payment row per member plus the session's
    /// status flip, inside a single transaction so the session can never read
    /// as settled with an incomplete obligation set. The host's row is
    /// created already paid. Returns the number of payment rows inserted.
    #[allow(clippy::too_many_arguments)]
    pub fn settle_session(
        &self,
        session_id: i64,
        host_id: i64,
        member_ids: &[i64],
        amount: f64,
        court_fee: f64,
        tube_price: f64,
        shuttles_used: i64,
        settled_at: &str,
        deadline: &str,
    ) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut inserted = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO payments (session_id, user_id, amount, status, paid_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for &user_id in member_ids {
                    let (status, paid_at) = if user_id == host_id {
                        ("paid", Some(settled_at))
                    } else {
                        ("pending", None)
                    };
                    inserted +=
                        stmt.execute(rusqlite::params![session_id, user_id, amount, status, paid_at])?;
                }
            }

            let flipped = tx.execute(
                "UPDATE sessions
                 SET status = 'settled', court_fee = ?1, tube_price = ?2, shuttles_used = ?3,
                     settled_at = ?4, payment_deadline = ?5
                 WHERE id = ?6 AND status = 'open'",
                rusqlite::params![court_fee, tube_price, shuttles_used, settled_at, deadline, session_id],
            )?;
            if flipped == 0 {
                // Dropping the uncommitted transaction rolls the inserts back.
                return Err(anyhow!("session {} is not open", session_id));
            }

            tx.commit()?;
            Ok(inserted)
        })
    }

    /// Returns false when no obligation row exists. Re-marking an already
    /// paid row is a harmless overwrite.
    pub fn mark_payment_paid(&self, session_id: i64, user_id: i64, paid_at: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE payments SET status = 'paid', paid_at = ?1
                 WHERE session_id = ?2 AND user_id = ?3",
                rusqlite::params![paid_at, session_id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn attach_payment_proof(
        &self,
        session_id: i64,
        user_id: i64,
        proof_ref: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE payments SET proof_ref = ?1
                 WHERE session_id = ?2 AND user_id = ?3",
                rusqlite::params![proof_ref, session_id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn get_payment(&self, session_id: i64, user_id: i64) -> Result<Option<PaymentRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT session_id, user_id, amount, status, paid_at, proof_ref,
                        reminder_sent, reminder_sent_at
                 FROM payments
                 WHERE session_id = ?1 AND user_id = ?2",
                rusqlite::params![session_id, user_id],
                |row| {
                    Ok(PaymentRow {
                        session_id: row.get(0)?,
                        user_id: row.get(1)?,
                        amount: row.get(2)?,
                        status: row.get(3)?,
                        paid_at: row.get(4)?,
                        proof_ref: row.get(5)?,
                        reminder_sent: row.get(6)?,
                        reminder_sent_at: row.get(7)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Current "in" roster joined against payments, paid members first in
    /// the order they paid, unpaid (NULL paid_at) last.
    pub fn member_payment_rows(&self, session_id: i64) -> Result<Vec<MemberPaymentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT sp.user_id, sp.display_name, sp.handle,
                        COALESCE(p.status, 'pending') AS payment_status,
                        p.paid_at, p.amount
                 FROM session_participants sp
                 LEFT JOIN payments p ON p.session_id = sp.session_id
                     AND p.user_id = sp.user_id
                 WHERE sp.session_id = ?1 AND sp.status = 'in'
                 ORDER BY p.paid_at ASC NULLS LAST",
            )?;

            let rows = stmt
                .query_map([session_id], |row| {
                    Ok(MemberPaymentRow {
                        user_id: row.get(0)?,
                        display_name: row.get(1)?,
                        handle: row.get(2)?,
                        payment_status: row.get(3)?,
                        paid_at: row.get(4)?,
                        amount: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Members with an existing pending row: already billed, not yet paid.
    /// Never-billed members (joined post-settlement) are absent, not unpaid.
    pub fn unpaid_rows(&self, session_id: i64) -> Result<Vec<UnpaidRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT sp.user_id, sp.display_name, sp.handle, p.amount
                 FROM session_participants sp
                 JOIN payments p ON p.session_id = sp.session_id
                     AND p.user_id = sp.user_id
                 WHERE sp.session_id = ?1
                     AND sp.status = 'in'
                     AND p.status = 'pending'",
            )?;

            let rows = stmt
                .query_map([session_id], |row| {
                    Ok(UnpaidRow {
                        user_id: row.get(0)?,
                        display_name: row.get(1)?,
                        handle: row.get(2)?,
                        amount: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Pending, un-reminded payments whose session is settled and past its
    /// deadline as of `now`.
    pub fn overdue_rows(&self, now: &str) -> Result<Vec<OverdueRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.group_id, s.bill_message_id,
                        p.user_id, sp.display_name, sp.handle, p.amount, s.payment_deadline
                 FROM sessions s
                 JOIN payments p ON p.session_id = s.id
                 JOIN session_participants sp ON sp.session_id = s.id
                     AND sp.user_id = p.user_id
                 WHERE s.payment_deadline < ?1
                     AND p.status = 'pending'
                     AND p.reminder_sent = 0
                     AND s.status = 'settled'",
            )?;

            let rows = stmt
                .query_map([now], |row| {
                    Ok(OverdueRow {
                        session_id: row.get(0)?,
                        group_id: row.get(1)?,
                        bill_message_id: row.get(2)?,
                        user_id: row.get(3)?,
                        display_name: row.get(4)?,
                        handle: row.get(5)?,
                        amount: row.get(6)?,
                        payment_deadline: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn mark_reminder_sent(&self, session_id: i64, user_id: i64, sent_at: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE payments SET reminder_sent = 1, reminder_sent_at = ?1
                 WHERE session_id = ?2 AND user_id = ?3",
                rusqlite::params![sent_at, session_id, user_id],
            )?;
            Ok(changed > 0)
        })
    }
}

fn query_user(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    conn.query_row(
        "SELECT id, display_name, handle, payout_qr, created_at FROM users WHERE id = ?1",
        [id],
        |row| {
            Ok(UserRow {
                id: row.get(0)?,
                display_name: row.get(1)?,
                handle: row.get(2)?,
                payout_qr: row.get(3)?,
                created_at: row.get(4)?,
            })
        },
    )
    .optional()
}

fn query_session(conn: &Connection, id: i64) -> Result<Option<SessionRow>> {
    conn.query_row(
        "SELECT id, group_id, host_id, title, location, schedule,
                court_fee, tube_price, shuttles_used, status,
                settled_at, payment_deadline, message_id, bill_message_id, created_at
         FROM sessions WHERE id = ?1",
        [id],
        |row| {
            Ok(SessionRow {
                id: row.get(0)?,
                group_id: row.get(1)?,
                host_id: row.get(2)?,
                title: row.get(3)?,
                location: row.get(4)?,
                schedule: row.get(5)?,
                court_fee: row.get(6)?,
                tube_price: row.get(7)?,
                shuttles_used: row.get(8)?,
                status: row.get(9)?,
                settled_at: row.get(10)?,
                payment_deadline: row.get(11)?,
                message_id: row.get(12)?,
                bill_message_id: row.get(13)?,
                created_at: row.get(14)?,
            })
        },
    )
    .optional()
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use rallysplit_types::models::SessionPatch;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn upsert_user_refreshes_name_and_handle() {
        let db = db();
        db.upsert_user(7, "Mei", Some("mei")).unwrap();
        db.upsert_user(7, "Mei Lin", None).unwrap();

        let user = db.get_user(7).unwrap().unwrap();
        assert_eq!(user.display_name, "Mei Lin");
        assert_eq!(user.handle, None);
    }

    #[test]
    fn set_payout_qr_reports_missing_user() {
        let db = db();
        assert!(!db.set_payout_qr(99, "qr-blob").unwrap());

        db.upsert_user(99, "Ana", None).unwrap();
        assert!(db.set_payout_qr(99, "qr-blob").unwrap());
        assert_eq!(db.get_user(99).unwrap().unwrap().payout_qr.as_deref(), Some("qr-blob"));
    }

    #[test]
    fn session_defaults() {
        let db = db();
        let id = db.insert_session(-100, 1, "Tuesday Night", None, None).unwrap();

        let session = db.get_session(id).unwrap().unwrap();
        assert_eq!(session.status, "open");
        assert_eq!(session.court_fee, 0.0);
        assert_eq!(session.tube_price, 95.0);
        assert_eq!(session.shuttles_used, 0);
        assert!(session.payment_deadline.is_none());
    }

    #[test]
    fn update_session_merges_only_supplied_fields() {
        let db = db();
        let id = db.insert_session(-100, 1, "Tuesday Night", Some("Hall A"), None).unwrap();

        let patch = SessionPatch {
            message_id: Some(555),
            court_fee: Some(40.0),
            ..Default::default()
        };
        assert!(db.update_session(id, &patch).unwrap());

        let session = db.get_session(id).unwrap().unwrap();
        assert_eq!(session.message_id, Some(555));
        assert_eq!(session.court_fee, 40.0);
        assert_eq!(session.location.as_deref(), Some("Hall A"));

        assert!(!db.update_session(id, &SessionPatch::default()).unwrap());
        assert!(!db.update_session(id + 1, &patch).unwrap());
    }

    #[test]
    fn participant_upsert_resurrects_single_row() {
        let db = db();
        let sid = db.insert_session(-100, 1, "Tuesday Night", None, None).unwrap();

        db.upsert_participant(sid, 42, "Ben", None, "2025-06-14T10:00:00.000Z").unwrap();
        assert!(db.set_participant_out(sid, 42).unwrap());
        assert_eq!(db.participant_count(sid).unwrap(), 0);

        db.upsert_participant(sid, 42, "Benny", Some("ben"), "2025-06-14T11:00:00.000Z").unwrap();
        let members = db.participants(sid).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].display_name, "Benny");
        assert_eq!(members[0].joined_at, "2025-06-14T11:00:00.000Z");
        assert_eq!(db.participant_status(sid, 42).unwrap().as_deref(), Some("in"));
    }

    #[test]
    fn settle_session_is_transactional_and_single_shot() {
        let db = db();
        let sid = db.insert_session(-100, 1, "Tuesday Night", None, None).unwrap();
        db.upsert_participant(sid, 1, "Host", None, "2025-06-14T10:00:00.000Z").unwrap();
        db.upsert_participant(sid, 2, "Ana", None, "2025-06-14T10:05:00.000Z").unwrap();

        let inserted = db
            .settle_session(
                sid,
                1,
                &[1, 2],
                30.0,
                40.0,
                96.0,
                3,
                "2025-06-14T20:00:00.000Z",
                "2025-06-15T20:00:00.000Z",
            )
            .unwrap();
        assert_eq!(inserted, 2);

        let session = db.get_session(sid).unwrap().unwrap();
        assert_eq!(session.status, "settled");
        assert_eq!(session.payment_deadline.as_deref(), Some("2025-06-15T20:00:00.000Z"));

        let host_row = db.get_payment(sid, 1).unwrap().unwrap();
        assert_eq!(host_row.status, "paid");
        let ana_row = db.get_payment(sid, 2).unwrap().unwrap();
        assert_eq!(ana_row.status, "pending");

        // A second settlement attempt fails and leaves no extra rows behind.
        db.upsert_participant(sid, 3, "Late", None, "2025-06-14T21:00:00.000Z").unwrap();
        let err = db.settle_session(
            sid,
            1,
            &[1, 2, 3],
            99.0,
            40.0,
            96.0,
            3,
            "2025-06-14T22:00:00.000Z",
            "2025-06-15T22:00:00.000Z",
        );
        assert!(err.is_err());
        assert!(db.get_payment(sid, 3).unwrap().is_none());
    }

    #[test]
    fn overdue_rows_respect_flags_and_deadline() {
        let db = db();
        let sid = db.insert_session(-100, 1, "Tuesday Night", None, None).unwrap();
        db.upsert_participant(sid, 1, "Host", None, "2025-06-14T10:00:00.000Z").unwrap();
        db.upsert_participant(sid, 2, "Ana", None, "2025-06-14T10:05:00.000Z").unwrap();
        db.settle_session(
            sid,
            1,
            &[1, 2],
            30.0,
            60.0,
            95.0,
            0,
            "2025-06-14T20:00:00.000Z",
            "2025-06-15T20:00:00.000Z",
        )
        .unwrap();

        // Before the deadline: nothing.
        assert!(db.overdue_rows("2025-06-15T19:59:59.000Z").unwrap().is_empty());

        // Past the deadline: Ana only (host is paid).
        let overdue = db.overdue_rows("2025-06-15T20:00:01.000Z").unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].user_id, 2);
        assert_eq!(overdue[0].group_id, -100);

        // Reminded rows drop out even though the deadline stays past.
        assert!(db.mark_reminder_sent(sid, 2, "2025-06-15T21:00:00.000Z").unwrap());
        assert!(db.overdue_rows("2025-06-15T22:00:00.000Z").unwrap().is_empty());
    }
}
