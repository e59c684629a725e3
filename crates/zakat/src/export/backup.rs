//! Plain-text SQL dump of the whole database.
//!
//! The dump contains, for every table, its `CREATE TABLE` statement followed
//! by one `INSERT` per row with all values written as SQL literals. Loading
//! it into an empty `SQLite` database recreates the data.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use tracing::info;

use super::{ensure_dir, timestamped_path, OutputFile};
use crate::error::Result;
use crate::storage::{Database, TableSnapshot};

/// File name prefix of generated backups.
pub const BACKUP_PREFIX: &str = "zakat_backup";

/// Render the dump for `tables`.
#[must_use]
pub fn render(tables: &[TableSnapshot]) -> String {
    let mut out = String::new();
    for table in tables {
        let _ = writeln!(out, "-- Table structure for {}", table.name);
        let _ = writeln!(out, "{};", table.create_sql.trim());
        out.push('\n');

        if table.rows.is_empty() {
            continue;
        }

        let _ = writeln!(out, "-- Data for {}", table.name);
        let columns = table
            .columns
            .iter()
            .map(|c| ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        for row in &table.rows {
            let values = row.iter().map(literal).collect::<Vec<_>>().join(", ");
            let _ = writeln!(
                out,
                "INSERT INTO {} ({columns}) VALUES ({values});",
                ident(&table.name)
            );
        }
        out.push('\n');
    }
    out
}

/// Write the dump for `tables` to `path` and return the number of rows dumped.
///
/// # Errors
///
/// Returns an error if the file cannot be written. A file this call
/// created is removed.
pub fn write_backup(path: &Path, tables: &[TableSnapshot]) -> Result<usize> {
    let output = OutputFile::begin(path);
    let result = write_file(path, &render(tables));
    if result.is_err() {
        output.discard();
    }
    result?;

    let rows = tables.iter().map(|t| t.rows.len()).sum();
    info!(
        "Wrote backup {} ({} tables, {} rows)",
        path.display(),
        tables.len(),
        rows
    );
    Ok(rows)
}

/// Dump `db` into a timestamped file in `dir`.
///
/// Returns the file path and the number of rows dumped.
///
/// # Errors
///
/// Returns an error if the tables cannot be read or the file cannot be
/// written.
pub fn backup_database(db: &Database, dir: &Path, now: NaiveDateTime) -> Result<(PathBuf, usize)> {
    let tables = db.snapshot()?;
    ensure_dir(dir)?;
    let path = timestamped_path(dir, BACKUP_PREFIX, "sql", now);
    let rows = write_backup(&path, &tables)?;
    Ok((path, rows))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Format a value as an SQL literal.
#[must_use]
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => {
            // keep a decimal point so the value reads back as REAL
            let text = f.to_string();
            if f.is_finite() && !text.contains('.') {
                format!("{text}.0")
            } else {
                text
            }
        }
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Blob(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2 + 3);
            hex.push_str("X'");
            for b in bytes {
                let _ = write!(hex, "{b:02X}");
            }
            hex.push('\'');
            hex
        }
    }
}

/// Table and column names are written bare when they are plain identifiers.
fn ident(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        crate::storage::dump::quote_ident(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::{memory_conn, sample_donation};
    use crate::storage::{donations, dump};

    #[test]
    fn test_literals() {
        assert_eq!(literal(&Value::Null), "NULL");
        assert_eq!(literal(&Value::Integer(42)), "42");
        assert_eq!(literal(&Value::Real(50.0)), "50.0");
        assert_eq!(literal(&Value::Real(12.5)), "12.5");
        assert_eq!(literal(&Value::Text("Ali".to_string())), "'Ali'");
        assert_eq!(literal(&Value::Text("O'Brien".to_string())), "'O''Brien'");
        assert_eq!(literal(&Value::Blob(vec![0x01, 0xAB])), "X'01AB'");
    }

    #[test]
    fn test_ident() {
        assert_eq!(ident("donations"), "donations");
        assert_eq!(ident("price per kg"), "\"price per kg\"");
        assert_eq!(ident("1st"), "\"1st\"");
    }

    #[test]
    fn test_render_contains_structure_and_rows() {
        let conn = memory_conn();
        donations::insert(&conn, &sample_donation("O'Brien")).unwrap();
        let tables = dump::snapshot_all(&conn).unwrap();

        let sql = render(&tables);
        assert!(sql.contains("-- Table structure for donations"));
        assert!(sql.contains("CREATE TABLE donations"));
        assert!(sql.contains(
            "INSERT INTO donations (id, name, category, amount, date) \
             VALUES (1, 'O''Brien', 'Fitrah', 50.0, '2024-01-01');"
        ));
        assert!(!sql.contains("-- Data for rice_types"));
    }

    #[test]
    fn test_dump_restores_into_empty_database() {
        let conn = memory_conn();
        donations::insert(&conn, &sample_donation("Ali")).unwrap();
        donations::insert(&conn, &sample_donation("Siti")).unwrap();
        let sql = render(&dump::snapshot_all(&conn).unwrap());

        let restored = rusqlite::Connection::open_in_memory().unwrap();
        restored.execute_batch(&sql).unwrap();
        let count: i64 = restored
            .query_row("SELECT COUNT(*) FROM donations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_write_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.sql");
        let conn = memory_conn();
        donations::insert(&conn, &sample_donation("Ali")).unwrap();

        let rows = write_backup(&path, &dump::snapshot_all(&conn).unwrap()).unwrap();
        // one donation plus the schema version row
        assert_eq!(rows, 2);
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("INSERT INTO metadata"));
    }

    #[test]
    fn test_backup_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("zakat.db")).unwrap();
        db.create_donation(&sample_donation("Ali")).unwrap();
        let now = chrono::NaiveDate::from_ymd_opt(2024, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();

        let (path, rows) = backup_database(&db, dir.path(), now).unwrap();
        assert_eq!(
            path.file_name().unwrap(),
            "zakat_backup_20241231_235959.sql"
        );
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_write_backup_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("backup.sql");

        let err = write_backup(&path, &[]).unwrap_err();
        assert_eq!(err.class(), crate::error::ErrorClass::FileOutput);
    }
}
