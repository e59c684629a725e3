//! Queries against the `distributions` table.
//!
//! Distributions are insert-only. The total price is computed from the rice
//! price at insert time and stored, so later price changes do not rewrite
//! history.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::error::Result;
use crate::model::{total_price, Distribution, DistributionDetail, NewDistribution};

use super::{donations, rice};

/// Insert a distribution after checking both references.
///
/// # Errors
///
/// Returns [`crate::Error::NotFound`] if the donation or rice type does not
/// exist, or an error if the insert fails.
pub fn insert(conn: &Connection, new: &NewDistribution) -> Result<Distribution> {
    donations::require(conn, new.donation_id)?;
    let rice = rice::require(conn, new.rice_type_id)?;
    let total = total_price(rice.price_per_kg, new.quantity);

    conn.execute(
        r"
        INSERT INTO distributions (donation_id, rice_type_id, quantity, total_price, date)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ",
        params![
            new.donation_id,
            new.rice_type_id,
            new.quantity,
            total,
            new.date
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(
        "Inserted distribution {} ({} kg of {} for donation {})",
        id, new.quantity, rice.name, new.donation_id
    );

    Ok(Distribution {
        id,
        donation_id: new.donation_id,
        rice_type_id: new.rice_type_id,
        quantity: new.quantity,
        total_price: total,
        date: new.date,
    })
}

/// Fetch a distribution by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get(conn: &Connection, id: i64) -> Result<Option<Distribution>> {
    let distribution = conn
        .query_row(
            r"
            SELECT id, donation_id, rice_type_id, quantity, total_price, date
            FROM distributions WHERE id = ?1
            ",
            [id],
            row_to_distribution,
        )
        .optional()?;
    Ok(distribution)
}

/// List distributions joined with donor and rice names, newest first.
///
/// `donation_id` restricts the result to one donation.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn details(conn: &Connection, donation_id: Option<i64>) -> Result<Vec<DistributionDetail>> {
    let mut stmt = conn.prepare(
        r"
        SELECT t.id, t.donation_id, d.name, d.category, t.rice_type_id, r.name,
               t.quantity, t.total_price, t.date
        FROM distributions t
        JOIN donations d ON d.id = t.donation_id
        JOIN rice_types r ON r.id = t.rice_type_id
        WHERE ?1 IS NULL OR t.donation_id = ?1
        ORDER BY t.date DESC, t.id DESC
        ",
    )?;
    let rows = stmt
        .query_map([donation_id], row_to_detail)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn row_to_distribution(row: &rusqlite::Row) -> rusqlite::Result<Distribution> {
    Ok(Distribution {
        id: row.get(0)?,
        donation_id: row.get(1)?,
        rice_type_id: row.get(2)?,
        quantity: row.get(3)?,
        total_price: row.get(4)?,
        date: row.get(5)?,
    })
}

fn row_to_detail(row: &rusqlite::Row) -> rusqlite::Result<DistributionDetail> {
    Ok(DistributionDetail {
        id: row.get(0)?,
        donation_id: row.get(1)?,
        donor_name: row.get(2)?,
        category: row.get(3)?,
        rice_type_id: row.get(4)?,
        rice_name: row.get(5)?,
        quantity: row.get(6)?,
        total_price: row.get(7)?,
        date: row.get(8)?,
    })
}
