//! Queries against the `rice_types` master list.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{NewRiceType, RiceType, RiceUpsert};

const SELECT_RICE: &str = "SELECT id, name, price_per_kg FROM rice_types";

/// Fetch a rice type by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get(conn: &Connection, id: i64) -> Result<Option<RiceType>> {
    let rice = conn
        .query_row(&format!("{SELECT_RICE} WHERE id = ?1"), [id], row_to_rice)
        .optional()?;
    Ok(rice)
}

/// Fetch a rice type by id, failing if it does not exist.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if there is no such rice type.
pub fn require(conn: &Connection, id: i64) -> Result<RiceType> {
    get(conn, id)?.ok_or_else(|| Error::not_found("rice type", id))
}

/// Look up a rice type by its exact name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<RiceType>> {
    let rice = conn
        .query_row(
            &format!("{SELECT_RICE} WHERE name = ?1"),
            [name],
            row_to_rice,
        )
        .optional()?;
    Ok(rice)
}

/// List all rice types ordered by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list(conn: &Connection) -> Result<Vec<RiceType>> {
    let mut stmt = conn.prepare(&format!("{SELECT_RICE} ORDER BY id"))?;
    let rice = stmt
        .query_map([], row_to_rice)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rice)
}

/// Insert a new rice type.
///
/// # Errors
///
/// Returns [`Error::DuplicateName`] if the name is taken.
pub fn insert(conn: &Connection, new: &NewRiceType) -> Result<RiceType> {
    if find_by_name(conn, &new.name)?.is_some() {
        return Err(Error::DuplicateName {
            name: new.name.clone(),
        });
    }

    conn.execute(
        "INSERT INTO rice_types (name, price_per_kg) VALUES (?1, ?2)",
        params![new.name, new.price_per_kg],
    )?;
    let id = conn.last_insert_rowid();
    info!("Inserted rice type {} ({})", id, new.name);

    Ok(RiceType {
        id,
        name: new.name.clone(),
        price_per_kg: new.price_per_kg,
    })
}

/// Replace the price of an existing rice type.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the rice type does not exist.
pub fn update_price(conn: &Connection, id: i64, price_per_kg: f64) -> Result<RiceType> {
    let affected = conn.execute(
        "UPDATE rice_types SET price_per_kg = ?1 WHERE id = ?2",
        params![price_per_kg, id],
    )?;
    if affected == 0 {
        return Err(Error::not_found("rice type", id));
    }
    info!("Updated price of rice type {} to {:.2}", id, price_per_kg);
    require(conn, id)
}

/// Insert a rice type, or update the price in place when the name exists.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn upsert(conn: &Connection, new: &NewRiceType) -> Result<RiceUpsert> {
    match find_by_name(conn, &new.name)? {
        Some(existing) => {
            let rice = update_price(conn, existing.id, new.price_per_kg)?;
            Ok(RiceUpsert::Updated {
                rice,
                previous_price: existing.price_per_kg,
            })
        }
        None => insert(conn, new).map(RiceUpsert::Inserted),
    }
}

/// Convert a database row to a [`RiceType`].
pub(crate) fn row_to_rice(row: &rusqlite::Row) -> rusqlite::Result<RiceType> {
    Ok(RiceType {
        id: row.get(0)?,
        name: row.get(1)?,
        price_per_kg: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::memory_conn;

    fn beras(price: f64) -> NewRiceType {
        NewRiceType {
            name: "Beras A".to_string(),
            price_per_kg: price,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let conn = memory_conn();
        let stored = insert(&conn, &beras(12.0)).unwrap();

        let found = find_by_name(&conn, "Beras A").unwrap().unwrap();
        assert_eq!(found, stored);
        assert!(find_by_name(&conn, "Beras B").unwrap().is_none());
    }

    #[test]
    fn test_insert_duplicate_name() {
        let conn = memory_conn();
        insert(&conn, &beras(12.0)).unwrap();

        let err = insert(&conn, &beras(13.0)).unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let conn = memory_conn();
        let first = upsert(&conn, &beras(12.0)).unwrap();
        assert!(matches!(first, RiceUpsert::Inserted(_)));

        let second = upsert(&conn, &beras(14.5)).unwrap();
        match second {
            RiceUpsert::Updated {
                rice,
                previous_price,
            } => {
                assert_eq!(rice.id, first.rice().id);
                assert!((rice.price_per_kg - 14.5).abs() < f64::EPSILON);
                assert!((previous_price - 12.0).abs() < f64::EPSILON);
            }
            RiceUpsert::Inserted(_) => panic!("expected update"),
        }

        assert_eq!(list(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_update_price_missing() {
        let conn = memory_conn();
        assert!(update_price(&conn, 9, 1.0).unwrap_err().is_not_found());
    }

    #[test]
    fn test_unique_constraint_enforced_by_schema() {
        let conn = memory_conn();
        insert(&conn, &beras(12.0)).unwrap();

        let result = conn.execute(
            "INSERT INTO rice_types (name, price_per_kg) VALUES ('Beras A', 1.0)",
            [],
        );
        assert!(result.is_err());
    }
}
