//! Record types for zakat.
//!
//! One struct per table row, plus the `New*` inputs used for inserts and the
//! joined rows produced by the report queries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Round a money or weight value to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Total price of a distribution: price per kg times quantity, rounded.
#[must_use]
pub fn total_price(price_per_kg: f64, quantity: f64) -> f64 {
    round2(price_per_kg * quantity)
}

/// A zakat donation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    /// Row identifier.
    pub id: i64,
    /// Donor name.
    pub name: String,
    /// Free-text zakat category (e.g. "Fitrah", "Mal").
    pub category: String,
    /// Donated amount.
    pub amount: f64,
    /// Date of the donation.
    pub date: NaiveDate,
}

/// Fields for a donation that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDonation {
    /// Donor name.
    pub name: String,
    /// Free-text zakat category.
    pub category: String,
    /// Donated amount.
    pub amount: f64,
    /// Date of the donation.
    pub date: NaiveDate,
}

/// Partial update of a donation. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonationUpdate {
    /// New donor name.
    pub name: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New amount.
    pub amount: Option<f64>,
    /// New date.
    pub date: Option<NaiveDate>,
}

impl Donation {
    /// Apply an update, returning the resulting record.
    #[must_use]
    pub fn apply(&self, update: &DonationUpdate) -> Self {
        Self {
            id: self.id,
            name: update.name.clone().unwrap_or_else(|| self.name.clone()),
            category: update
                .category
                .clone()
                .unwrap_or_else(|| self.category.clone()),
            amount: update.amount.unwrap_or(self.amount),
            date: update.date.unwrap_or(self.date),
        }
    }
}

impl DonationUpdate {
    /// Whether applying this update to `current` would change anything.
    #[must_use]
    pub fn changes(&self, current: &Donation) -> bool {
        current.apply(self) != *current
    }
}

/// A rice type from the master list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiceType {
    /// Row identifier.
    pub id: i64,
    /// Unique rice name.
    pub name: String,
    /// Price per kilogram.
    pub price_per_kg: f64,
}

/// A rice type that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRiceType {
    /// Unique rice name.
    pub name: String,
    /// Price per kilogram.
    pub price_per_kg: f64,
}

/// Outcome of storing a rice type by name.
#[derive(Debug, Clone, PartialEq)]
pub enum RiceUpsert {
    /// A new row was inserted.
    Inserted(RiceType),
    /// An existing row had its price replaced.
    Updated {
        /// The row after the update.
        rice: RiceType,
        /// Price before the update.
        previous_price: f64,
    },
}

impl RiceUpsert {
    /// The stored rice type.
    #[must_use]
    pub fn rice(&self) -> &RiceType {
        match self {
            Self::Inserted(rice) | Self::Updated { rice, .. } => rice,
        }
    }
}

/// A distribution of rice against a donation.
///
/// `total_price` is fixed when the row is created and is never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    /// Row identifier.
    pub id: i64,
    /// Donation this distribution draws on.
    pub donation_id: i64,
    /// Rice type handed out.
    pub rice_type_id: i64,
    /// Quantity in kilograms.
    pub quantity: f64,
    /// Price per kg times quantity at creation time.
    pub total_price: f64,
    /// Date of the distribution.
    pub date: NaiveDate,
}

/// Fields for a distribution that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDistribution {
    /// Donation this distribution draws on.
    pub donation_id: i64,
    /// Rice type handed out.
    pub rice_type_id: i64,
    /// Quantity in kilograms.
    pub quantity: f64,
    /// Date of the distribution.
    pub date: NaiveDate,
}

/// A distribution joined with donor and rice names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionDetail {
    /// Distribution identifier.
    pub id: i64,
    /// Donation identifier.
    pub donation_id: i64,
    /// Donor name.
    pub donor_name: String,
    /// Donation category.
    pub category: String,
    /// Rice type identifier.
    pub rice_type_id: i64,
    /// Rice name.
    pub rice_name: String,
    /// Quantity in kilograms.
    pub quantity: f64,
    /// Stored total price.
    pub total_price: f64,
    /// Distribution date.
    pub date: NaiveDate,
}

/// A donation with aggregated distribution figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationSummary {
    /// The donation itself.
    #[serde(flatten)]
    pub donation: Donation,
    /// Number of distributions referencing this donation.
    pub distribution_count: i64,
    /// Sum of distributed quantities in kilograms.
    pub distributed_kg: f64,
    /// Sum of distribution total prices.
    pub distributed_value: f64,
}
