//! The session/participant/payment lifecycle and its consistency rules.
//!
//! Everything here sits between the transport adapter (which delivers
//! chat-layer intents) and the store. The store is a dumb merge; the
//! invariants (settlement happens once, obligations are a point-in-time
//! roster snapshot, the host never owes itself) live in this crate.

pub mod error;
pub mod identity;
pub mod ledger;
pub mod proof;
pub mod roster;
pub mod sessions;
pub mod settlement;
pub mod sweep;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use rallysplit_db::Database;
use rallysplit_types::time;

pub use error::{CoreError, CoreResult};
pub use proof::ProofIntents;
pub use settlement::SettlementOutcome;

#[derive(Clone)]
pub struct Core {
    db: Arc<Database>,
    proofs: Arc<ProofIntents>,
}

impl Core {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            proofs: Arc::new(ProofIntents::with_default_ttl()),
        }
    }
}

/// Stored timestamps are written by us in a fixed format, so a parse failure
/// means hand-edited data; log it and fall back to the epoch rather than
/// poisoning the whole read.
pub(crate) fn parse_ts_lossy(raw: &str, what: &str) -> DateTime<Utc> {
    time::parse_ts(raw).unwrap_or_else(|| {
        warn!("Corrupt {} timestamp '{}'", what, raw);
        DateTime::default()
    })
}

pub(crate) fn parse_opt_ts(raw: Option<&str>, what: &str) -> Option<DateTime<Utc>> {
    raw.map(|r| parse_ts_lossy(r, what))
}
