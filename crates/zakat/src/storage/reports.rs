//! Aggregate queries used by the report export and the status command.

use rusqlite::Connection;
use serde::Serialize;

use crate::error::Result;
use crate::model::{Donation, DonationSummary};

/// Row counts for each table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StorageStats {
    /// Number of donations.
    pub donations: i64,
    /// Number of rice types.
    pub rice_types: i64,
    /// Number of distributions.
    pub distributions: i64,
}

/// Donations with the count and sums of their distributions.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn donation_summaries(conn: &Connection) -> Result<Vec<DonationSummary>> {
    let mut stmt = conn.prepare(
        r"
        SELECT d.id, d.name, d.category, d.amount, d.date,
               COUNT(t.id),
               COALESCE(SUM(t.quantity), 0.0),
               COALESCE(SUM(t.total_price), 0.0)
        FROM donations d
        LEFT JOIN distributions t ON t.donation_id = d.id
        GROUP BY d.id
        ORDER BY d.id
        ",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(DonationSummary {
                donation: Donation {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get(2)?,
                    amount: row.get(3)?,
                    date: row.get(4)?,
                },
                distribution_count: row.get(5)?,
                distributed_kg: row.get(6)?,
                distributed_value: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Count rows in each table.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn stats(conn: &Connection) -> Result<StorageStats> {
    let stats = conn.query_row(
        r"
        SELECT (SELECT COUNT(*) FROM donations),
               (SELECT COUNT(*) FROM rice_types),
               (SELECT COUNT(*) FROM distributions)
        ",
        [],
        |row| {
            Ok(StorageStats {
                donations: row.get(0)?,
                rice_types: row.get(1)?,
                distributions: row.get(2)?,
            })
        },
    )?;
    Ok(stats)
}
