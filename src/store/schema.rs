//! SQLite DDL for the document store.
//!
//! Every collection is one table of JSON documents keyed by record id. All
//! statements use `IF NOT EXISTS` so [`apply_schema`] is idempotent.

use rusqlite::Connection;

use crate::model::Collection;

/// Version stamped into `schema_meta` on a fresh database.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const META_SQL: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// DDL for one collection table.
fn collection_sql(collection: Collection) -> String {
    let table = collection.table();
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n\
         \x20   id         TEXT PRIMARY KEY,\n\
         \x20   body       TEXT NOT NULL,\n\
         \x20   created_at INTEGER NOT NULL DEFAULT 0,\n\
         \x20   updated_at INTEGER NOT NULL DEFAULT 0\n\
         );\n\
         CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table}(created_at);\n"
    )
}

/// Apply the full schema to an open connection and seed the version row.
pub(crate) fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(META_SQL)?;
    for collection in Collection::ALL {
        conn.execute_batch(&collection_sql(collection))?;
    }

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        rusqlite::params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

/// Read the stamped schema version, `None` if missing or unparsable.
pub(crate) fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<u32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_meta WHERE key = 'schema_version'")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().ok())
        }
        None => Ok(None),
    }
}
