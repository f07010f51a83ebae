use rusqlite::Connection;

use crate::error::Result;

/// Initialise the distribution schema in `conn`.
///
/// Creates the `distribution_queue` table (idempotent) and an index matching
/// the claim query so batch runs stay cheap as the audit history grows.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS distribution_queue (
            id           TEXT    NOT NULL PRIMARY KEY,
            title        TEXT    NOT NULL,
            content      TEXT    NOT NULL,
            link         TEXT,
            hashtags     TEXT    NOT NULL DEFAULT '[]',  -- JSON array of strings
            platforms    TEXT    NOT NULL,               -- JSON array of platform ids
            status       TEXT    NOT NULL DEFAULT 'pending',
            priority     INTEGER NOT NULL DEFAULT 0,
            retry_count  INTEGER NOT NULL DEFAULT 0,
            max_retries  INTEGER NOT NULL DEFAULT 3,
            scheduled_at TEXT    NOT NULL,               -- RFC 3339, millisecond precision
            results      TEXT    NOT NULL DEFAULT '[]',  -- JSON array of PlatformResult
            last_error   TEXT,
            created_at   TEXT    NOT NULL,
            updated_at   TEXT    NOT NULL,
            posted_at    TEXT
        ) STRICT;

        -- Claim query: WHERE status = 'pending' AND scheduled_at <= ?
        --              ORDER BY priority DESC, scheduled_at
        CREATE INDEX IF NOT EXISTS idx_queue_due
            ON distribution_queue (status, priority DESC, scheduled_at);
        ",
    )?;
    Ok(())
}
