//! Local SQLite store for the kitchen inventory.
//!
//! Two tables live here:
//! - `items`: food items, staged as `draft` and later `confirmed`
//! - `recipes`: saved recipe suggestions
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! The connection is opened once by the caller and passed to every operation.

use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

/// Columns added after the first release, applied on every start.
///
/// SQLite has no `ADD COLUMN IF NOT EXISTS`; on an up-to-date file each of these
/// fails with "duplicate column name", which is expected.
const ADDITIVE_MIGRATIONS: &[(&str, &str)] = &[
    ("items.status", "ALTER TABLE items ADD COLUMN status TEXT DEFAULT 'draft'"),
    ("recipes.time", "ALTER TABLE recipes ADD COLUMN time TEXT"),
    ("recipes.difficulty", "ALTER TABLE recipes ADD COLUMN difficulty TEXT"),
    ("recipes.servings", "ALTER TABLE recipes ADD COLUMN servings TEXT"),
];

/// Returns the default database path: ~/.local/share/snap2cook/kitchen.db
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("snap2cook")
        .join("kitchen.db")
}

/// Opens (or creates) the database file and initialises the schema.
pub fn open_database(path: &Path) -> DbResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            match std::fs::create_dir_all(parent) {
                Ok(()) => log::info!("Created directory: {}", parent.display()),
                Err(e) => log::warn!("Failed to create database directory: {}", e),
            }
        }
    }
    log::info!("Kitchen DB: {}", path.display());
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
    init_schema(&conn)?;
    Ok(conn)
}

/// Initialize the database schema
///
/// Table creation errors are returned. The additive column migrations that
/// follow are best-effort: their failures are logged and ignored.
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    if let Err(e) = conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            image_url TEXT,
            quantity INTEGER,
            status TEXT DEFAULT 'draft'
        );

        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            image_url TEXT,
            ingredients TEXT,
            how_to_cook TEXT,
            time TEXT,
            difficulty TEXT,
            servings TEXT
        );
        ",
    ) {
        log::error!("DB init error: {}", e);
        return Err(e);
    }

    for (column, sql) in ADDITIVE_MIGRATIONS {
        match conn.execute(sql, []) {
            Ok(_) => log::info!("Added column {}", column),
            Err(e) => log::debug!("Skipped migration for {}: {}", column, e),
        }
    }

    log::info!("Database schema initialized");
    Ok(())
}

/// Logs a failed store call with its context, then hands the error back.
pub(crate) fn log_failure<T>(context: &str, result: DbResult<T>) -> DbResult<T> {
    if let Err(ref e) = result {
        log::error!("Error {}: {}", context, e);
    }
    result
}

/// Returns the column names of `table`, in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| row.get(0))?
        .collect::<DbResult<Vec<String>>>()?;
    Ok(columns)
}

/// Closes the connection, surfacing any error SQLite reports on close.
pub fn close_database(conn: Connection) -> DbResult<()> {
    conn.close().map_err(|(_, e)| e)?;
    log::info!("Kitchen DB closed");
    Ok(())
}
