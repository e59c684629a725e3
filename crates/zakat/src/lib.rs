//! `zakat` - A record manager for zakat donations and rice distributions
//!
//! This library stores donations, a rice price list, and the rice handed out
//! against each donation in `SQLite`, and renders them as console tables, CSV
//! files, spreadsheet reports, and SQL backups.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod storage;
pub mod validate;

pub use config::Config;
pub use console::{Console, RecordManager};
pub use error::{Error, ErrorClass, Result};
pub use logging::init_logging;
pub use model::{Distribution, DistributionDetail, Donation, DonationSummary, RiceType};
pub use storage::{Database, StorageStats};
