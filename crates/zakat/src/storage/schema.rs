//! `SQLite` schema definitions for zakat.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the donations table.
pub const CREATE_DONATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS donations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    amount REAL NOT NULL CHECK (amount > 0),
    date TEXT NOT NULL
)
";

/// SQL statement to create the rice types table.
pub const CREATE_RICE_TYPES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS rice_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    price_per_kg REAL NOT NULL CHECK (price_per_kg > 0)
)
";

/// SQL statement to create the distributions table.
pub const CREATE_DISTRIBUTIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS distributions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    donation_id INTEGER NOT NULL REFERENCES donations(id) ON DELETE RESTRICT,
    rice_type_id INTEGER NOT NULL REFERENCES rice_types(id) ON DELETE RESTRICT,
    quantity REAL NOT NULL CHECK (quantity > 0),
    total_price REAL NOT NULL,
    date TEXT NOT NULL
)
";

/// SQL statement to index distributions by donation for dependency checks.
pub const CREATE_DONATION_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_distributions_donation ON distributions(donation_id)
";

/// SQL statement to index distributions by rice type.
pub const CREATE_RICE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_distributions_rice ON distributions(rice_type_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DONATIONS_TABLE,
    CREATE_RICE_TYPES_TABLE,
    CREATE_DISTRIBUTIONS_TABLE,
    CREATE_DONATION_INDEX,
    CREATE_RICE_INDEX,
    CREATE_METADATA_TABLE,
];
