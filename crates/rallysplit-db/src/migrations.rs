use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY,
            display_name    TEXT NOT NULL,
            handle          TEXT,
            payout_qr       TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id            INTEGER NOT NULL,
            host_id             INTEGER NOT NULL,
            title               TEXT NOT NULL,
            location            TEXT,
            schedule            TEXT,
            court_fee           REAL NOT NULL DEFAULT 0,
            tube_price          REAL NOT NULL DEFAULT 95,
            shuttles_used       INTEGER NOT NULL DEFAULT 0,
            status              TEXT NOT NULL DEFAULT 'open',
            settled_at          TEXT,
            payment_deadline    TEXT,
            message_id          INTEGER,
            bill_message_id     INTEGER,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS session_participants (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id      INTEGER NOT NULL REFERENCES sessions(id),
            user_id         INTEGER NOT NULL,
            display_name    TEXT NOT NULL,
            handle          TEXT,
            status          TEXT NOT NULL DEFAULT 'in',
            joined_at       TEXT NOT NULL,
            UNIQUE(session_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_participants_session
            ON session_participants(session_id, status);

        CREATE TABLE IF NOT EXISTS payments (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id          INTEGER NOT NULL REFERENCES sessions(id),
            user_id             INTEGER NOT NULL,
            amount              REAL NOT NULL,
            status              TEXT NOT NULL DEFAULT 'pending',
            paid_at             TEXT,
            proof_ref           TEXT,
            reminder_sent       INTEGER NOT NULL DEFAULT 0,
            reminder_sent_at    TEXT,
            created_at          TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(session_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_payments_session
            ON payments(session_id, status);

        -- The overdue sweep scans for pending, un-reminded rows.
        CREATE INDEX IF NOT EXISTS idx_payments_reminder
            ON payments(status, reminder_sent);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
