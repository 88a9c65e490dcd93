//! Roster manager: participant join/leave with idempotent membership.

use chrono::{DateTime, Utc};

use rallysplit_db::models::ParticipantRow;
use rallysplit_types::models::{MemberStatus, Participant};
use rallysplit_types::time;

use crate::{Core, CoreResult, parse_ts_lossy};

impl Core {
    /// Join (or re-join) a session. Idempotent: a second join refreshes the
    /// name/handle snapshot and join time on the same row. Joining is allowed
    /// even after settlement; the latecomer appears on the roster but was
    /// not billed.
    pub fn join(
        &self,
        session_id: i64,
        user_id: i64,
        display_name: &str,
        handle: Option<&str>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.require_session(session_id)?;
        self.db
            .upsert_participant(session_id, user_id, display_name, handle, &time::format_ts(now))?;
        Ok(())
    }

    /// Leave a session. Returns whether a membership row was flipped; leaving
    /// without ever joining is a quiet no-op. Existing payment rows are
    /// untouched: settlement snapshots are final.
    pub fn leave(&self, session_id: i64, user_id: i64) -> CoreResult<bool> {
        self.require_session(session_id)?;
        Ok(self.db.set_participant_out(session_id, user_id)?)
    }

    /// Current "in" members, join order ascending. This ordering numbers the
    /// roster 1..N stably for display.
    pub fn roster(&self, session_id: i64) -> CoreResult<Vec<Participant>> {
        self.require_session(session_id)?;
        let rows = self.db.participants(session_id)?;
        Ok(rows.into_iter().map(participant_from_row).collect())
    }

    pub fn roster_count(&self, session_id: i64) -> CoreResult<i64> {
        self.require_session(session_id)?;
        Ok(self.db.participant_count(session_id)?)
    }

    pub fn is_member(&self, session_id: i64, user_id: i64) -> CoreResult<bool> {
        self.require_session(session_id)?;
        let status = self.db.participant_status(session_id, user_id)?;
        Ok(status.as_deref() == Some("in"))
    }
}

pub(crate) fn participant_from_row(row: ParticipantRow) -> Participant {
    Participant {
        session_id: row.session_id,
        user_id: row.user_id,
        display_name: row.display_name,
        handle: row.handle,
        status: MemberStatus::from_db(&row.status),
        joined_at: parse_ts_lossy(&row.joined_at, "participant joined_at"),
    }
}
