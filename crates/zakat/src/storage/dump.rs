//! Raw table snapshots for the SQL backup.

use rusqlite::types::Value;
use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;

/// Structure and contents of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    /// Table name.
    pub name: String,
    /// The `CREATE TABLE` statement stored by `SQLite`.
    pub create_sql: String,
    /// Column names in declaration order.
    pub columns: Vec<String>,
    /// Every row, values in column order.
    pub rows: Vec<Vec<Value>>,
}

/// Names of all user tables in creation order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r"
        SELECT name FROM sqlite_master
        WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
        ORDER BY rowid
        ",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(names)
}

/// Snapshot every user table.
///
/// # Errors
///
/// Returns an error if any query fails.
pub fn snapshot_all(conn: &Connection) -> Result<Vec<TableSnapshot>> {
    table_names(conn)?
        .into_iter()
        .map(|name| snapshot(conn, &name))
        .collect()
}

/// Snapshot a single table. `name` must come from [`table_names`].
///
/// # Errors
///
/// Returns an error if any query fails.
pub fn snapshot(conn: &Connection, name: &str) -> Result<TableSnapshot> {
    let create_sql: String = conn.query_row(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!("SELECT * FROM {} ORDER BY rowid", quote_ident(name)))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!("Snapshot of {} has {} rows", name, rows.len());
    Ok(TableSnapshot {
        name: name.to_string(),
        create_sql,
        columns,
        rows,
    })
}

/// Quote an identifier for use in generated SQL.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
