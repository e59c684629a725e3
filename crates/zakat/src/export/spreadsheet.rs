//! Multi-sheet spreadsheet report.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info};
use umya_spreadsheet::helper::coordinate::coordinate_from_index;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use super::{ensure_dir, timestamped_path, Cell, OutputFile, Tabular};
use crate::error::{Error, Result};
use crate::model::{DistributionDetail, DonationSummary, RiceType};
use crate::storage::Database;

/// File name prefix of generated reports.
pub const REPORT_PREFIX: &str = "zakat_report";

/// Sheet holding donations with their distribution totals.
pub const DONATIONS_SHEET: &str = "Donation Records";
/// Sheet holding distributions joined with donor and rice names.
pub const DISTRIBUTIONS_SHEET: &str = "Distributions";
/// Sheet holding the rice price list.
pub const RICE_SHEET: &str = "Rice Types";

/// Everything that goes into a report.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// One row per donation.
    pub donations: Vec<DonationSummary>,
    /// One row per distribution.
    pub distributions: Vec<DistributionDetail>,
    /// One row per rice type.
    pub rice_types: Vec<RiceType>,
}

impl Report {
    /// Read every table needed for a report.
    ///
    /// # Errors
    ///
    /// Returns an error if any query fails.
    pub fn load(db: &Database) -> Result<Self> {
        Ok(Self {
            donations: db.donation_summaries()?,
            distributions: db.distribution_details(None)?,
            rice_types: db.rice_types()?,
        })
    }
}

/// Data rows written to each sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    /// Rows on the donations sheet.
    pub donations: usize,
    /// Rows on the distributions sheet.
    pub distributions: usize,
    /// Rows on the rice sheet.
    pub rice_types: usize,
}

/// Write `report` to `path` as an xlsx workbook with three sheets.
///
/// # Errors
///
/// Returns [`Error::Export`] if the workbook cannot be built or saved. A
/// file this call created is removed.
pub fn write_report(path: &Path, report: &Report) -> Result<ReportCounts> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();

    let counts = ReportCounts {
        donations: add_sheet(&mut book, DONATIONS_SHEET, &report.donations, path)?,
        distributions: add_sheet(&mut book, DISTRIBUTIONS_SHEET, &report.distributions, path)?,
        rice_types: add_sheet(&mut book, RICE_SHEET, &report.rice_types, path)?,
    };

    let output = OutputFile::begin(path);
    if let Err(e) = umya_spreadsheet::writer::xlsx::write(&book, path) {
        output.discard();
        return Err(Error::export(path, e.to_string()));
    }

    info!(
        "Wrote report {} ({} donations, {} distributions, {} rice types)",
        path.display(),
        counts.donations,
        counts.distributions,
        counts.rice_types
    );
    Ok(counts)
}

/// Write a timestamped report for `db` into `dir`.
///
/// # Errors
///
/// Returns an error if the tables cannot be read or the file cannot be
/// written.
pub fn export_database(
    db: &Database,
    dir: &Path,
    now: NaiveDateTime,
) -> Result<(PathBuf, ReportCounts)> {
    let report = Report::load(db)?;
    ensure_dir(dir)?;
    let path = timestamped_path(dir, REPORT_PREFIX, "xlsx", now);
    let counts = write_report(&path, &report)?;
    Ok((path, counts))
}

fn add_sheet<T: Tabular>(
    book: &mut Spreadsheet,
    name: &str,
    rows: &[T],
    path: &Path,
) -> Result<usize> {
    let sheet = book
        .new_sheet(name)
        .map_err(|e| Error::export(path, format!("cannot create sheet {name}: {e}")))?;

    for (col, header) in (1u32..).zip(T::COLUMNS) {
        set_cell(sheet, col, 1, &Cell::from(*header));
    }
    for (row, record) in (2u32..).zip(rows) {
        for (col, cell) in (1u32..).zip(record.cells()) {
            set_cell(sheet, col, row, &cell);
        }
    }

    debug!("Sheet {} has {} rows", name, rows.len());
    Ok(rows.len())
}

#[allow(clippy::cast_precision_loss)]
fn set_cell(sheet: &mut Worksheet, col: u32, row: u32, cell: &Cell) {
    let address = coordinate_from_index(&col, &row);
    let target = sheet.get_cell_mut(address.as_str());
    match cell {
        Cell::Int(value) => {
            target.set_value_number(*value as f64);
        }
        Cell::Number(value) => {
            target.set_value_number(*value);
        }
        Cell::Text(_) | Cell::Date(_) => {
            target.set_value(cell.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::Donation;

    fn report() -> Report {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let donation = Donation {
            id: 1,
            name: "Ali".to_string(),
            category: "Fitrah".to_string(),
            amount: 50.0,
            date,
        };
        Report {
            donations: vec![DonationSummary {
                donation,
                distribution_count: 1,
                distributed_kg: 3.0,
                distributed_value: 36.0,
            }],
            distributions: vec![DistributionDetail {
                id: 1,
                donation_id: 1,
                donor_name: "Ali".to_string(),
                category: "Fitrah".to_string(),
                rice_type_id: 1,
                rice_name: "Beras A".to_string(),
                quantity: 3.0,
                total_price: 36.0,
                date,
            }],
            rice_types: vec![
                RiceType {
                    id: 1,
                    name: "Beras A".to_string(),
                    price_per_kg: 12.0,
                },
                RiceType {
                    id: 2,
                    name: "Beras B".to_string(),
                    price_per_kg: 9.5,
                },
            ],
        }
    }

    fn text(sheet: &Worksheet, address: &str) -> String {
        sheet
            .get_cell(address)
            .map(|cell| cell.get_value().to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_write_report_three_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");

        let counts = write_report(&path, &report()).unwrap();
        assert_eq!(
            counts,
            ReportCounts {
                donations: 1,
                distributions: 1,
                rice_types: 2,
            }
        );

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let donations = book.get_sheet_by_name(DONATIONS_SHEET).unwrap();
        let distributions = book.get_sheet_by_name(DISTRIBUTIONS_SHEET).unwrap();
        let rice = book.get_sheet_by_name(RICE_SHEET).unwrap();

        assert_eq!(donations.get_highest_row(), 2);
        assert_eq!(distributions.get_highest_row(), 2);
        assert_eq!(rice.get_highest_row(), 3);

        assert_eq!(text(donations, "B1"), "Donor Name");
        assert_eq!(text(donations, "B2"), "Ali");
        assert_eq!(text(distributions, "E2"), "Beras A");
        assert_eq!(text(rice, "B3"), "Beras B");
    }

    #[test]
    fn test_empty_report_has_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");

        let counts = write_report(&path, &Report::default()).unwrap();
        assert_eq!(counts, ReportCounts::default());

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let rice = book.get_sheet_by_name(RICE_SHEET).unwrap();
        assert_eq!(rice.get_highest_row(), 1);
        assert_eq!(text(rice, "C1"), "Price per Kg");
    }

    #[test]
    fn test_export_database_names_file_by_time() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("zakat.db")).unwrap();
        db.create_donation(&crate::storage::test_support::sample_donation("Ali"))
            .unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(8, 0, 1)
            .unwrap();

        let out = dir.path().join("reports");
        let (path, counts) = export_database(&db, &out, now).unwrap();
        assert_eq!(path, out.join("zakat_report_20240309_080001.xlsx"));
        assert!(path.exists());
        assert_eq!(counts.donations, 1);
        assert_eq!(counts.distributions, 0);
    }

    #[test]
    fn test_unwritable_path_is_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.xlsx");

        let err = write_report(&path, &report()).unwrap_err();
        assert_eq!(err.class(), crate::error::ErrorClass::FileOutput);
        assert!(!path.exists());
    }
}
