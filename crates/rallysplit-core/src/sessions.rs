//! Session store: session records and their status transitions.

use chrono::{DateTime, Utc};

use rallysplit_db::models::SessionRow;
use rallysplit_types::models::{Session, SessionPatch, SessionStatus};
use rallysplit_types::time;

use crate::{Core, CoreError, CoreResult, parse_opt_ts, parse_ts_lossy};

/// Title used when the chat layer supplies none.
pub const DEFAULT_SESSION_TITLE: &str = "Badminton Session";

impl Core {
    /// Open a new session. The host is enrolled as the first participant in
    /// the same breath; a session without its host on the roster does not
    /// exist in this system.
    #[allow(clippy::too_many_arguments)]
    pub fn create_session(
        &self,
        group_id: i64,
        host_id: i64,
        host_name: &str,
        host_handle: Option<&str>,
        title: Option<&str>,
        location: Option<&str>,
        schedule: Option<&str>,
        now: DateTime<Utc>,
    ) -> CoreResult<i64> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_SESSION_TITLE);

        let session_id = self.db.insert_session(group_id, host_id, title, location, schedule)?;
        self.db
            .upsert_participant(session_id, host_id, host_name, host_handle, &time::format_ts(now))?;
        Ok(session_id)
    }

    pub fn session(&self, id: i64) -> CoreResult<Session> {
        self.require_session(id).map(session_from_row)
    }

    /// Merge the supplied fields into an open-session record. The patch
    /// enumerates exactly the mutable columns; status and the settlement
    /// fields are only ever written by the settlement transaction.
    pub fn update_session(&self, id: i64, patch: &SessionPatch) -> CoreResult<()> {
        if patch.is_empty() {
            // Nothing to merge, but the caller still learns whether the
            // target exists.
            self.require_session(id)?;
            return Ok(());
        }
        if self.db.update_session(id, patch)? {
            Ok(())
        } else {
            Err(CoreError::SessionNotFound(id))
        }
    }

    pub(crate) fn require_session(&self, id: i64) -> CoreResult<SessionRow> {
        self.db.get_session(id)?.ok_or(CoreError::SessionNotFound(id))
    }
}

pub(crate) fn session_from_row(row: SessionRow) -> Session {
    Session {
        id: row.id,
        group_id: row.group_id,
        host_id: row.host_id,
        title: row.title,
        location: row.location,
        schedule: row.schedule,
        court_fee: row.court_fee,
        tube_price: row.tube_price,
        shuttles_used: row.shuttles_used,
        status: SessionStatus::from_db(&row.status),
        settled_at: parse_opt_ts(row.settled_at.as_deref(), "session settled_at"),
        payment_deadline: parse_opt_ts(row.payment_deadline.as_deref(), "session payment_deadline"),
        message_id: row.message_id,
        bill_message_id: row.bill_message_id,
        created_at: parse_ts_lossy(&row.created_at, "session created_at"),
    }
}
