//! Fixed-width console tables.

use super::{Cell, Tabular};

/// Separator placed between columns.
const SEPARATOR: &str = " | ";

/// Render rows as a fixed-width table with a header and a rule.
///
/// Text longer than its column is cut to fit. Numbers are right-aligned and
/// never cut; a numeric column widens to its longest value.
#[must_use]
pub fn render<T: Tabular>(rows: &[T]) -> String {
    let rows: Vec<Vec<Cell>> = rows.iter().map(Tabular::cells).collect();
    let widths = column_widths(T::WIDTHS, &rows);

    let header: Vec<String> = T::COLUMNS
        .iter()
        .zip(&widths)
        .map(|(name, width)| pad(&Cell::from(*name), *width))
        .collect();
    let header = header.join(SEPARATOR);
    let rule = "-".repeat(header.chars().count());

    let mut out = String::new();
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad(cell, *width))
            .collect();
        out.push_str(line.join(SEPARATOR).trim_end());
        out.push('\n');
    }
    out
}

/// Declared widths, raised to fit the longest numeric value in each column.
fn column_widths(declared: &[usize], rows: &[Vec<Cell>]) -> Vec<usize> {
    declared
        .iter()
        .enumerate()
        .map(|(i, &width)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .filter(|cell| cell.is_numeric())
                .map(|cell| cell.to_string().chars().count())
                .fold(width, usize::max)
        })
        .collect()
}

/// Render a two-column "label: value" block for a single record.
#[must_use]
pub fn render_record<T: Tabular>(record: &T) -> String {
    let label_width = T::COLUMNS
        .iter()
        .map(|c| c.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (name, cell) in T::COLUMNS.iter().zip(record.cells()) {
        out.push_str(&format!("  {name:<label_width$} : {cell}\n"));
    }
    out
}

fn pad(cell: &Cell, width: usize) -> String {
    if cell.is_numeric() {
        format!("{cell:>width$}", cell = cell.to_string())
    } else {
        let text = truncate(&cell.to_string(), width);
        format!("{text:<width$}")
    }
}

/// Cut `text` to at most `width` characters.
#[must_use]
pub fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}
