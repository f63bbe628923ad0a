//! v001 -- Initial schema creation.
//!
//! One key/value table holding small JSON documents keyed by namespace.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS local_state (
    namespace  TEXT PRIMARY KEY NOT NULL,
    json       TEXT NOT NULL,
    updated_at TEXT NOT NULL                -- RFC-3339
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
