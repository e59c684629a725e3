//! Storage layer for zakat.
//!
//! [`Database`] only remembers where the database lives. Every operation
//! opens its own connection, runs inside [`Database::with_connection`] or
//! [`Database::transaction`], and drops the connection before returning, so
//! nothing holds a handle between menu actions.
//!
//! The submodules hold the parameterized queries, written against a plain
//! `&Connection` so they compose inside a single transaction.

pub mod distributions;
pub mod donations;
pub mod dump;
pub mod migrations;
pub mod reports;
pub mod rice;
pub mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, Transaction};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{
    Distribution, DistributionDetail, Donation, DonationSummary, DonationUpdate, NewDistribution,
    NewDonation, NewRiceType, RiceType, RiceUpsert,
};

pub use donations::UpdateOutcome;
pub use dump::TableSnapshot;
pub use reports::StorageStats;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the zakat database file.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open or create the database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist
    /// and brings the schema up to date. No connection is kept open.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Initializing database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;
        drop(conn);

        info!("Database ready at {}", path.display());
        Ok(Self { path })
    }

    /// Refer to an existing database without touching it.
    ///
    /// Connections made through this handle never create the file; a missing
    /// database surfaces as [`Error::DatabaseOpen`].
    #[must_use]
    pub fn existing(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| Error::DatabaseOpen {
            path: self.path.clone(),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    /// Run `f` with a fresh connection that is closed when `f` returns.
    ///
    /// # Errors
    ///
    /// Returns an error if connecting fails or `f` fails.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.connect()?;
        f(&conn)
    }

    /// Run `f` inside a transaction on a fresh connection.
    ///
    /// Commits when `f` returns `Ok`, rolls back otherwise. The connection is
    /// closed on every path.
    ///
    /// # Errors
    ///
    /// Returns an error if connecting, `f`, or the commit fails.
    pub fn transaction<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!("Rollback failed: {}", rollback_err);
                }
                debug!("Transaction rolled back: {}", err);
                Err(err)
            }
        }
    }

    // === Donations ===

    /// Insert a donation.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn create_donation(&self, new: &NewDonation) -> Result<Donation> {
        self.transaction(|tx| donations::insert(tx, new))
    }

    /// Fetch a donation by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn donation(&self, id: i64) -> Result<Option<Donation>> {
        self.with_connection(|conn| donations::get(conn, id))
    }

    /// List all donations.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn donations(&self) -> Result<Vec<Donation>> {
        self.with_connection(donations::list)
    }

    /// Apply a partial update to a donation.
    ///
    /// # Errors
    ///
    /// Returns an error if the donation is missing or the write fails.
    pub fn update_donation(&self, id: i64, update: &DonationUpdate) -> Result<UpdateOutcome> {
        self.transaction(|tx| donations::update(tx, id, update))
    }

    /// Count distributions that reference a donation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn dependent_distributions(&self, id: i64) -> Result<i64> {
        self.with_connection(|conn| donations::count_distributions(conn, id))
    }

    /// Delete a donation with no dependent distributions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HasDistributions`] if the donation is referenced.
    pub fn delete_donation(&self, id: i64) -> Result<Donation> {
        self.transaction(|tx| donations::delete(tx, id))
    }

    // === Rice types ===

    /// Fetch a rice type by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn rice_type(&self, id: i64) -> Result<Option<RiceType>> {
        self.with_connection(|conn| rice::get(conn, id))
    }

    /// Look up a rice type by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn rice_type_by_name(&self, name: &str) -> Result<Option<RiceType>> {
        self.with_connection(|conn| rice::find_by_name(conn, name))
    }

    /// List all rice types.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn rice_types(&self) -> Result<Vec<RiceType>> {
        self.with_connection(rice::list)
    }

    /// Insert a rice type, or update its price if the name exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn upsert_rice_type(&self, new: &NewRiceType) -> Result<RiceUpsert> {
        self.transaction(|tx| rice::upsert(tx, new))
    }

    // === Distributions ===

    /// Insert a distribution, checking both references in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for a missing reference.
    pub fn create_distribution(&self, new: &NewDistribution) -> Result<Distribution> {
        self.transaction(|tx| distributions::insert(tx, new))
    }

    /// List distributions with donor and rice names.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn distribution_details(&self, donation_id: Option<i64>) -> Result<Vec<DistributionDetail>> {
        self.with_connection(|conn| distributions::details(conn, donation_id))
    }

    // === Reports ===

    /// Donations with aggregated distribution figures.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn donation_summaries(&self) -> Result<Vec<DonationSummary>> {
        self.with_connection(reports::donation_summaries)
    }

    /// Row counts per table.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn stats(&self) -> Result<StorageStats> {
        self.with_connection(reports::stats)
    }

    /// Schema version recorded in the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn schema_version(&self) -> Result<i32> {
        self.with_connection(migrations::get_schema_version)
    }

    /// Snapshot every table for a backup.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn snapshot(&self) -> Result<Vec<TableSnapshot>> {
        self.with_connection(dump::snapshot_all)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_donation;
    use super::*;

    fn create_test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let db = Database::open(dir.path().join("zakat.db")).expect("failed to open database");
        (dir, db)
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("zakat.db");

        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path.as_path());
    }

    #[test]
    fn test_missing_database_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::existing(dir.path().join("absent.db"));

        let err = db.donations().unwrap_err();
        assert!(matches!(err, Error::DatabaseOpen { .. }));
        assert_eq!(err.class(), crate::error::ErrorClass::Connection);
        assert!(!dir.path().join("absent.db").exists());
    }

    #[test]
    fn test_create_and_read_back() {
        let (_dir, db) = create_test_db();
        let stored = db.create_donation(&sample_donation("Ali")).unwrap();

        assert_eq!(db.donation(stored.id).unwrap(), Some(stored));
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let (_dir, db) = create_test_db();

        let result: Result<()> = db.transaction(|tx| {
            donations::insert(tx, &sample_donation("Ali"))?;
            Err(Error::not_found("rice type", 1))
        });
        assert!(result.is_err());
        assert!(db.donations().unwrap().is_empty());
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let (_dir, db) = create_test_db();

        let result = db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO distributions (donation_id, rice_type_id, quantity, total_price, date)
                 VALUES (1, 1, 1.0, 1.0, '2024-01-01')",
                [],
            )?;
            Ok(())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_full_flow_example() {
        let (_dir, db) = create_test_db();
        let donation = db.create_donation(&sample_donation("Ali")).unwrap();
        let rice = db
            .upsert_rice_type(&NewRiceType {
                name: "Beras A".to_string(),
                price_per_kg: 12.0,
            })
            .unwrap();
        let distribution = db
            .create_distribution(&NewDistribution {
                donation_id: donation.id,
                rice_type_id: rice.rice().id,
                quantity: 3.0,
                date: donation.date,
            })
            .unwrap();

        assert!((distribution.total_price - 36.0).abs() < f64::EPSILON);
        assert_eq!(db.dependent_distributions(donation.id).unwrap(), 1);

        let err = db.delete_donation(donation.id).unwrap_err();
        assert!(matches!(err, Error::HasDistributions { .. }));
        assert_eq!(db.donations().unwrap().len(), 1);

        let stats = db.stats().unwrap();
        assert_eq!(stats.distributions, 1);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let (dir, db) = create_test_db();
        db.create_donation(&sample_donation("Ali")).unwrap();

        let reopened = Database::open(dir.path().join("zakat.db")).unwrap();
        assert_eq!(reopened.donations().unwrap().len(), 1);
    }
}
