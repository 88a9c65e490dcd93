//! Identity registry: known users and their saved payout-QR reference.

use rallysplit_types::models::User;

use crate::{Core, CoreError, CoreResult, parse_ts_lossy};

impl Core {
    /// Insert-or-refresh a user from an observed interaction. The transport
    /// adapter calls this for the actor behind every inbound intent, so
    /// display names and handles never go stale.
    pub fn observe_user(&self, id: i64, display_name: &str, handle: Option<&str>) -> CoreResult<()> {
        self.db.upsert_user(id, display_name, handle)?;
        Ok(())
    }

    /// Save the user's payout-QR reference (an opaque blob reference owned by
    /// the transport). The user must already be known.
    pub fn set_payout_ref(&self, user_id: i64, qr_ref: &str) -> CoreResult<()> {
        if self.db.set_payout_qr(user_id, qr_ref)? {
            Ok(())
        } else {
            Err(CoreError::UserNotFound(user_id))
        }
    }

    pub fn user(&self, id: i64) -> CoreResult<User> {
        let row = self.db.get_user(id)?.ok_or(CoreError::UserNotFound(id))?;
        Ok(User {
            id: row.id,
            display_name: row.display_name,
            handle: row.handle,
            payout_qr: row.payout_qr,
            created_at: parse_ts_lossy(&row.created_at, "user created_at"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rallysplit_db::Database;

    use crate::{Core, CoreError};

    fn core() -> Core {
        Core::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn observe_is_idempotent_and_refreshing() {
        let core = core();
        core.observe_user(10, "Sam", None).unwrap();
        core.observe_user(10, "Sam T", Some("samt")).unwrap();

        let user = core.user(10).unwrap();
        assert_eq!(user.display_name, "Sam T");
        assert_eq!(user.handle.as_deref(), Some("samt"));
    }

    #[test]
    fn payout_ref_requires_known_user() {
        let core = core();
        assert!(matches!(
            core.set_payout_ref(10, "qr-1"),
            Err(CoreError::UserNotFound(10))
        ));

        core.observe_user(10, "Sam", None).unwrap();
        core.set_payout_ref(10, "qr-1").unwrap();
        assert_eq!(core.user(10).unwrap().payout_qr.as_deref(), Some("qr-1"));
    }

    #[test]
    fn unknown_user_is_not_found() {
        let core = core();
        assert!(matches!(core.user(404), Err(CoreError::UserNotFound(404))));
    }
}
