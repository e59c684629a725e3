//! Output formats for zakat records.
//!
//! Every record type that can be listed implements [`Tabular`], which gives
//! the console table, the CSV writer, and the spreadsheet writer one shared
//! description of its columns.

pub mod backup;
pub mod csv_file;
pub mod spreadsheet;
pub mod table;

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};
use crate::model::{DistributionDetail, Donation, DonationSummary, RiceType};

/// Timestamp format embedded in generated file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A single typed value in a table row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Identifier or count.
    Int(i64),
    /// Money or weight, shown with two decimals.
    Number(f64),
    /// Free text.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
}

impl Cell {
    /// Whether this cell should be right-aligned in a fixed-width table.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Number(_))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value:.2}"),
            Self::Text(value) => write!(f, "{value}"),
            Self::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A record that can be laid out as a row.
pub trait Tabular {
    /// Column headers, in the order [`Tabular::cells`] returns values.
    const COLUMNS: &'static [&'static str];

    /// Display width of each column in console tables.
    const WIDTHS: &'static [usize];

    /// The row values.
    fn cells(&self) -> Vec<Cell>;
}

impl Tabular for Donation {
    const COLUMNS: &'static [&'static str] = &["ID", "Donor Name", "Category", "Amount", "Date"];
    const WIDTHS: &'static [usize] = &[4, 20, 14, 12, 10];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Int(self.id),
            self.name.as_str().into(),
            self.category.as_str().into(),
            Cell::Number(self.amount),
            Cell::Date(self.date),
        ]
    }
}

impl Tabular for RiceType {
    const COLUMNS: &'static [&'static str] = &["ID", "Rice Name", "Price per Kg"];
    const WIDTHS: &'static [usize] = &[4, 20, 12];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Int(self.id),
            self.name.as_str().into(),
            Cell::Number(self.price_per_kg),
        ]
    }
}

impl Tabular for DistributionDetail {
    const COLUMNS: &'static [&'static str] = &[
        "ID",
        "Donation ID",
        "Donor Name",
        "Category",
        "Rice Type",
        "Quantity (kg)",
        "Total Price",
        "Date",
    ];
    const WIDTHS: &'static [usize] = &[4, 11, 16, 12, 16, 13, 11, 10];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Int(self.id),
            Cell::Int(self.donation_id),
            self.donor_name.as_str().into(),
            self.category.as_str().into(),
            self.rice_name.as_str().into(),
            Cell::Number(self.quantity),
            Cell::Number(self.total_price),
            Cell::Date(self.date),
        ]
    }
}

impl Tabular for DonationSummary {
    const COLUMNS: &'static [&'static str] = &[
        "ID",
        "Donor Name",
        "Category",
        "Amount",
        "Date",
        "Distributions",
        "Distributed (kg)",
        "Distributed Value",
    ];
    const WIDTHS: &'static [usize] = &[4, 20, 14, 12, 10, 13, 16, 17];

    fn cells(&self) -> Vec<Cell> {
        let mut cells = self.donation.cells();
        cells.extend([
            Cell::Int(self.distribution_count),
            Cell::Number(self.distributed_kg),
            Cell::Number(self.distributed_value),
        ]);
        cells
    }
}

/// Build `<dir>/<prefix>_<timestamp>.<extension>`.
#[must_use]
pub fn timestamped_path(dir: &Path, prefix: &str, extension: &str, now: NaiveDateTime) -> PathBuf {
    dir.join(format!(
        "{prefix}_{}.{extension}",
        now.format(FILE_TIMESTAMP_FORMAT)
    ))
}

/// Create the output directory if it is missing.
///
/// # Errors
///
/// Returns [`Error::DirectoryCreate`] if the directory cannot be created.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
        path: dir.to_path_buf(),
        source,
    })
}

/// An output path that is about to be written.
///
/// Remembers whether the file was already there, so a failed write only
/// removes a file it created itself.
#[derive(Debug)]
pub(crate) struct OutputFile<'a> {
    path: &'a Path,
    existed: bool,
}

impl<'a> OutputFile<'a> {
    pub(crate) fn begin(path: &'a Path) -> Self {
        Self {
            path,
            existed: path.exists(),
        }
    }

    /// Remove a partially written file, ignoring failures.
    pub(crate) fn discard(self) {
        if self.existed {
            tracing::debug!("Keeping pre-existing file {}", self.path.display());
            return;
        }
        if self.path.exists() {
            if let Err(err) = std::fs::remove_file(self.path) {
                tracing::warn!(
                    "Could not remove partial file {}: {}",
                    self.path.display(),
                    err
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn donation() -> Donation {
        Donation {
            id: 1,
            name: "Ali".to_string(),
            category: "Fitrah".to_string(),
            amount: 50.0,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Int(7).to_string(), "7");
        assert_eq!(Cell::Number(36.0).to_string(), "36.00");
        assert_eq!(Cell::Number(3.333).to_string(), "3.33");
        assert_eq!(Cell::from("Beras").to_string(), "Beras");
        assert_eq!(
            Cell::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).to_string(),
            "2024-01-01"
        );
    }

    #[test]
    fn test_columns_match_widths_and_cells() {
        assert_eq!(Donation::COLUMNS.len(), Donation::WIDTHS.len());
        assert_eq!(Donation::COLUMNS.len(), donation().cells().len());
        assert_eq!(RiceType::COLUMNS.len(), RiceType::WIDTHS.len());
        assert_eq!(DistributionDetail::COLUMNS.len(), DistributionDetail::WIDTHS.len());
        assert_eq!(DonationSummary::COLUMNS.len(), DonationSummary::WIDTHS.len());

        let summary = DonationSummary {
            donation: donation(),
            distribution_count: 1,
            distributed_kg: 3.0,
            distributed_value: 36.0,
        };
        assert_eq!(summary.cells().len(), DonationSummary::COLUMNS.len());
    }

    #[test]
    fn test_timestamped_path() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 30)
            .unwrap();
        let path = timestamped_path(Path::new("/out"), "zakat_report", "xlsx", now);
        assert_eq!(path, PathBuf::from("/out/zakat_report_20240309_140530.xlsx"));
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b");
        ensure_dir(&target).unwrap();
        assert!(target.is_dir());
        ensure_dir(&target).unwrap();
    }

    #[test]
    fn test_discard_removes_created_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        let output = OutputFile::begin(&path);
        std::fs::write(&path, "ID,Name\n1,").unwrap();
        output.discard();
        assert!(!path.exists());
    }

    #[test]
    fn test_discard_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        std::fs::write(&path, "keep me").unwrap();

        OutputFile::begin(&path).discard();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
    }
}
