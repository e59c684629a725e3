//! CSV export of listed records.

use std::path::Path;

use csv::Writer;
use tracing::info;

use super::{OutputFile, Tabular};
use crate::error::Result;

/// Write `rows` to `path` with a header row.
///
/// `columns` holds indexes into [`Tabular::COLUMNS`]; an empty slice writes
/// every column. Returns the number of data rows written.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written. A file this
/// call created is removed; an existing file is left in place.
pub fn write_csv<T: Tabular>(path: &Path, rows: &[T], columns: &[usize]) -> Result<usize> {
    let selected: Vec<usize> = if columns.is_empty() {
        (0..T::COLUMNS.len()).collect()
    } else {
        columns.to_vec()
    };

    let output = OutputFile::begin(path);
    let result = write_rows(path, rows, &selected);
    if result.is_err() {
        output.discard();
    }
    let count = result?;

    info!("Wrote {} rows to {}", count, path.display());
    Ok(count)
}

fn write_rows<T: Tabular>(path: &Path, rows: &[T], selected: &[usize]) -> Result<usize> {
    let mut wtr = Writer::from_path(path)?;

    wtr.write_record(selected.iter().map(|&i| T::COLUMNS[i]))?;
    for row in rows {
        let cells = row.cells();
        wtr.write_record(selected.iter().map(|&i| cells[i].to_string()))?;
    }
    wtr.flush()?;

    Ok(rows.len())
}
