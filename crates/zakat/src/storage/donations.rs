//! Queries against the `donations` table.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{Donation, DonationUpdate, NewDonation};

const SELECT_DONATION: &str = "SELECT id, name, category, amount, date FROM donations";

/// Outcome of an update request.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The row was rewritten with these values.
    Updated(Donation),
    /// The requested values equal the stored ones; nothing was written.
    Unchanged(Donation),
}

/// Insert a donation and return the stored row.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert(conn: &Connection, new: &NewDonation) -> Result<Donation> {
    conn.execute(
        "INSERT INTO donations (name, category, amount, date) VALUES (?1, ?2, ?3, ?4)",
        params![new.name, new.category, new.amount, new.date],
    )?;
    let id = conn.last_insert_rowid();
    info!("Inserted donation {} for {}", id, new.name);

    Ok(Donation {
        id,
        name: new.name.clone(),
        category: new.category.clone(),
        amount: new.amount,
        date: new.date,
    })
}

/// Fetch a donation by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get(conn: &Connection, id: i64) -> Result<Option<Donation>> {
    let donation = conn
        .query_row(
            &format!("{SELECT_DONATION} WHERE id = ?1"),
            [id],
            row_to_donation,
        )
        .optional()?;
    Ok(donation)
}

/// Fetch a donation by id, failing if it does not exist.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if there is no such donation.
pub fn require(conn: &Connection, id: i64) -> Result<Donation> {
    get(conn, id)?.ok_or_else(|| Error::not_found("donation", id))
}

/// List all donations ordered by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list(conn: &Connection) -> Result<Vec<Donation>> {
    let mut stmt = conn.prepare(&format!("{SELECT_DONATION} ORDER BY id"))?;
    let donations = stmt
        .query_map([], row_to_donation)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(donations)
}

/// Apply a partial update.
///
/// When the update would not change any field no statement is issued and
/// [`UpdateOutcome::Unchanged`] is returned.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the donation does not exist or disappears
/// before the write lands.
pub fn update(conn: &Connection, id: i64, update: &DonationUpdate) -> Result<UpdateOutcome> {
    let current = require(conn, id)?;
    if !update.changes(&current) {
        debug!("Donation {} unchanged, skipping write", id);
        return Ok(UpdateOutcome::Unchanged(current));
    }

    let next = current.apply(update);
    let affected = conn.execute(
        "UPDATE donations SET name = ?1, category = ?2, amount = ?3, date = ?4 WHERE id = ?5",
        params![next.name, next.category, next.amount, next.date, id],
    )?;
    if affected == 0 {
        return Err(Error::not_found("donation", id));
    }

    info!("Updated donation {}", id);
    Ok(UpdateOutcome::Updated(next))
}

/// Count distributions that reference a donation.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_distributions(conn: &Connection, id: i64) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM distributions WHERE donation_id = ?1",
        [id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Delete a donation that no distribution references.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the donation does not exist and
/// [`Error::HasDistributions`] if it is still referenced.
pub fn delete(conn: &Connection, id: i64) -> Result<Donation> {
    let donation = require(conn, id)?;

    let count = count_distributions(conn, id)?;
    if count > 0 {
        warn!("Refusing to delete donation {} with {} distributions", id, count);
        return Err(Error::HasDistributions { id, count });
    }

    let affected = conn.execute("DELETE FROM donations WHERE id = ?1", [id])?;
    if affected == 0 {
        return Err(Error::not_found("donation", id));
    }

    info!("Deleted donation {}", id);
    Ok(donation)
}

/// Convert a database row to a [`Donation`].
pub(crate) fn row_to_donation(row: &rusqlite::Row) -> rusqlite::Result<Donation> {
    Ok(Donation {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::storage::test_support::{memory_conn, sample_donation};

    #[test]
    fn test_insert_and_get_roundtrip() {
        let conn = memory_conn();
        let new = sample_donation("Ali");

        let stored = insert(&conn, &new).unwrap();
        let fetched = get(&conn, stored.id).unwrap().unwrap();

        assert_eq!(fetched, stored);
        assert_eq!(fetched.name, "Ali");
        assert_eq!(fetched.category, "Fitrah");
        assert!((fetched.amount - 50.0).abs() < f64::EPSILON);
        assert_eq!(fetched.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_insert_and_get_varied_values() {
        let conn = memory_conn();
        let cases = [
            ("Siti Nurhaliza", "Fitrah", 0.01, (1, 1, 1)),
            ("O'Brien", "Mal'iyah", 1234.56, (2024, 2, 29)),
            ("Zaïnab Rahmân", "Fidyah", 999_999_999.99, (9999, 12, 31)),
            ("عبد الله", "زكاة", 2.5, (1970, 1, 1)),
            ("Robert'); DROP TABLE donations;--", "Mal", 75.125, (2000, 12, 31)),
        ];

        for (name, category, amount, (y, m, d)) in cases {
            let new = NewDonation {
                name: name.to_string(),
                category: category.to_string(),
                amount,
                date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            };
            let stored = insert(&conn, &new).unwrap();
            let fetched = require(&conn, stored.id).unwrap();

            assert_eq!(fetched, stored, "case {name}");
            assert_eq!(fetched.name, name);
            assert_eq!(fetched.category, category);
            assert_eq!(fetched.amount.to_bits(), amount.to_bits());
            assert_eq!(fetched.date, new.date);
        }
        assert_eq!(list(&conn).unwrap().len(), cases.len());
    }

    #[test]
    fn test_get_nonexistent() {
        let conn = memory_conn();
        assert!(get(&conn, 999).unwrap().is_none());
        assert!(require(&conn, 999).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_ordered_by_id() {
        let conn = memory_conn();
        insert(&conn, &sample_donation("Ali")).unwrap();
        insert(&conn, &sample_donation("Budi")).unwrap();

        let all = list(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].id < all[1].id);
        assert_eq!(all[1].name, "Budi");
    }

    #[test]
    fn test_update_changes_only_given_fields() {
        let conn = memory_conn();
        let stored = insert(&conn, &sample_donation("Ali")).unwrap();

        let outcome = update(
            &conn,
            stored.id,
            &DonationUpdate {
                amount: Some(80.0),
                ..DonationUpdate::default()
            },
        )
        .unwrap();
        assert!(matches!(outcome, UpdateOutcome::Updated(_)));

        let fetched = require(&conn, stored.id).unwrap();
        assert_eq!(fetched.name, "Ali");
        assert!((fetched.amount - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_update_without_changes() {
        let conn = memory_conn();
        let stored = insert(&conn, &sample_donation("Ali")).unwrap();

        let outcome = update(
            &conn,
            stored.id,
            &DonationUpdate {
                name: Some("Ali".to_string()),
                ..DonationUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(outcome, UpdateOutcome::Unchanged(stored));
    }

    #[test]
    fn test_update_missing() {
        let conn = memory_conn();
        let err = update(&conn, 5, &DonationUpdate::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_unreferenced() {
        let conn = memory_conn();
        let stored = insert(&conn, &sample_donation("Ali")).unwrap();

        delete(&conn, stored.id).unwrap();
        assert!(get(&conn, stored.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_referenced_is_refused() {
        let conn = memory_conn();
        let stored = insert(&conn, &sample_donation("Ali")).unwrap();
        conn.execute(
            "INSERT INTO rice_types (name, price_per_kg) VALUES ('Beras A', 12.0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO distributions (donation_id, rice_type_id, quantity, total_price, date)
             VALUES (?1, 1, 3.0, 36.0, '2024-01-02')",
            [stored.id],
        )
        .unwrap();

        assert_eq!(count_distributions(&conn, stored.id).unwrap(), 1);
        let err = delete(&conn, stored.id).unwrap_err();
        assert!(matches!(err, Error::HasDistributions { count: 1, .. }));
        assert!(get(&conn, stored.id).unwrap().is_some());
    }
}
