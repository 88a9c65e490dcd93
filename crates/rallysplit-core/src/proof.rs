//! Proof intents: the short-lived "awaiting evidence upload" window.
//!
//! When a participant claims they paid, the transport invites them to upload
//! a screenshot next. That conversational window is per-user transient state
//! with an explicit TTL, so an abandoned upload never lingers. Intents live
//! in process memory: they guard a minutes-long exchange, not durable data.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use crate::Core;

/// How long an upload window stays open.
pub const PROOF_INTENT_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy)]
struct ProofIntent {
    session_id: i64,
    opened_at: DateTime<Utc>,
}

pub struct ProofIntents {
    ttl: Duration,
    inner: Mutex<HashMap<i64, ProofIntent>>,
}

impl ProofIntents {
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::minutes(PROOF_INTENT_TTL_MINUTES))
    }

    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Open an upload window for a user. A newer claim overwrites an older
    /// intent: only the most recent session is a valid upload target.
    pub fn open(&self, user_id: i64, session_id: i64, now: DateTime<Utc>) {
        let mut map = self.lock();
        Self::purge(&mut map, now, self.ttl);
        map.insert(
            user_id,
            ProofIntent {
                session_id,
                opened_at: now,
            },
        );
    }

    /// Consume the user's intent, returning the target session if the window
    /// is still open. Consuming removes it; an upload window is single-use.
    pub fn take(&self, user_id: i64, now: DateTime<Utc>) -> Option<i64> {
        let mut map = self.lock();
        Self::purge(&mut map, now, self.ttl);
        map.remove(&user_id).map(|intent| intent.session_id)
    }

    fn purge(map: &mut HashMap<i64, ProofIntent>, now: DateTime<Utc>, ttl: Duration) {
        map.retain(|_, intent| now - intent.opened_at <= ttl);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, ProofIntent>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Core {
    pub fn open_proof_intent(&self, user_id: i64, session_id: i64, now: DateTime<Utc>) {
        self.proofs.open(user_id, session_id, now);
    }

    pub fn take_proof_intent(&self, user_id: i64, now: DateTime<Utc>) -> Option<i64> {
        self.proofs.take(user_id, now)
    }
}
