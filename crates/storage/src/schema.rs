use rusqlite::Connection;

use crate::error::StorageError;

pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
    ",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, unixepoch())",
        [SCHEMA_VERSION],
    )?;
    Ok(())
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS payloads (
    payload_id INTEGER PRIMARY KEY,
    statements BLOB NOT NULL,
    checksum BLOB NOT NULL CHECK (length(checksum) = 32),
    statement_count INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS actions (
    rowid INTEGER PRIMARY KEY,
    action_id BLOB NOT NULL UNIQUE CHECK (length(action_id) = 16),
    action_type TEXT NOT NULL CHECK (action_type IN ('statement_added', 'statement_removed')),
    user TEXT,
    graph TEXT NOT NULL,
    resource TEXT,
    tstamp BLOB NOT NULL CHECK (length(tstamp) = 12),
    payload_id INTEGER REFERENCES payloads(payload_id),
    rollback_of BLOB CHECK (rollback_of IS NULL OR length(rollback_of) = 16)
);
CREATE INDEX IF NOT EXISTS idx_actions_graph ON actions (graph, tstamp);
CREATE INDEX IF NOT EXISTS idx_actions_resource ON actions (graph, resource, tstamp);
CREATE INDEX IF NOT EXISTS idx_actions_user ON actions (user, tstamp);
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_current_version_once() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        let (count, version): (i64, i32) = conn
            .query_row("SELECT COUNT(*), MAX(version) FROM schema_version", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(version, SCHEMA_VERSION);
    }
}
