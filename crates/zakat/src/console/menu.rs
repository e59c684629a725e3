//! Main menu entries.

use std::fmt;

/// One entry of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Record a new donation.
    AddDonation,
    /// Change an existing donation.
    UpdateDonation,
    /// Remove a donation without distributions.
    DeleteDonation,
    /// Show all donations.
    ListDonations,
    /// Show the rice price list.
    ListRiceTypes,
    /// Add a rice type or change its price.
    AddRiceType,
    /// Record rice handed out against a donation.
    AddDistribution,
    /// Show distributions, optionally for one donation.
    ListDistributions,
    /// Write the spreadsheet report.
    ExportReport,
    /// Write the SQL backup.
    Backup,
    /// Describe each entry.
    Help,
    /// Leave the program.
    Exit,
}

impl MenuChoice {
    /// Every entry in display order.
    pub const ALL: [Self; 12] = [
        Self::AddDonation,
        Self::UpdateDonation,
        Self::DeleteDonation,
        Self::ListDonations,
        Self::ListRiceTypes,
        Self::AddRiceType,
        Self::AddDistribution,
        Self::ListDistributions,
        Self::ExportReport,
        Self::Backup,
        Self::Help,
        Self::Exit,
    ];

    /// The number the operator types for this entry.
    #[must_use]
    pub fn number(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).map_or(0, |i| i + 1)
    }

    /// Parse a menu number.
    #[must_use]
    pub fn from_input(raw: &str) -> Option<Self> {
        let n: usize = raw.trim().parse().ok()?;
        n.checked_sub(1).and_then(|i| Self::ALL.get(i)).copied()
    }

    /// Short label shown in the menu.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::AddDonation => "Add Zakat Record",
            Self::UpdateDonation => "Update Zakat Record",
            Self::DeleteDonation => "Delete Zakat Record",
            Self::ListDonations => "View Zakat Records",
            Self::ListRiceTypes => "View Rice Types",
            Self::AddRiceType => "Add or Update Rice Type",
            Self::AddDistribution => "Add Distribution Record",
            Self::ListDistributions => "View Distribution Records",
            Self::ExportReport => "Export Data to Spreadsheet",
            Self::Backup => "Backup Database",
            Self::Help => "Help",
            Self::Exit => "Exit",
        }
    }

    /// Longer description shown by the help entry.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::AddDonation => {
                "Record a donor, zakat category, amount and date. Dates use \
                 YYYY-MM-DD and cannot be in the future."
            }
            Self::UpdateDonation => {
                "Change fields of an existing record. Leave a field blank to \
                 keep its current value."
            }
            Self::DeleteDonation => {
                "Remove a record. Records with distributions cannot be deleted."
            }
            Self::ListDonations => "List all zakat records, with optional CSV export.",
            Self::ListRiceTypes => "List rice types and prices, with optional CSV export.",
            Self::AddRiceType => {
                "Add a rice type with its price per kg. An existing name can \
                 have its price updated instead."
            }
            Self::AddDistribution => {
                "Hand out rice against a zakat record. The total is price per \
                 kg times quantity."
            }
            Self::ListDistributions => {
                "List distributions, optionally for one zakat record, with \
                 optional CSV export."
            }
            Self::ExportReport => {
                "Write records, distributions and rice types to a timestamped \
                 xlsx file."
            }
            Self::Backup => "Write every table as SQL statements to a timestamped file.",
            Self::Help => "Show this help.",
            Self::Exit => "Leave the program after confirmation.",
        }
    }
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}

/// Title printed above the menu.
pub const TITLE: &str = "=== ZAKAT MANAGEMENT SYSTEM ===";

/// The full menu text.
#[must_use]
pub fn render() -> String {
    let mut out = format!("\n{TITLE}\n");
    for choice in MenuChoice::ALL {
        out.push_str(&choice.to_string());
        out.push('\n');
    }
    out
}

/// The help text.
#[must_use]
pub fn help() -> String {
    let mut out = String::from("\n--- Help ---\n");
    for choice in MenuChoice::ALL {
        out.push_str(&format!("{choice}\n   {}\n", choice.description()));
    }
    out
}

/// The prompt asking for a menu number.
#[must_use]
pub fn prompt() -> String {
    format!("Enter your choice (1-{}): ", MenuChoice::ALL.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_round_trip() {
        for (i, choice) in MenuChoice::ALL.iter().enumerate() {
            assert_eq!(choice.number(), i + 1);
            assert_eq!(MenuChoice::from_input(&(i + 1).to_string()), Some(*choice));
        }
    }

    #[test]
    fn test_from_input_rejects_out_of_range() {
        assert_eq!(MenuChoice::from_input("0"), None);
        assert_eq!(MenuChoice::from_input("13"), None);
        assert_eq!(MenuChoice::from_input("x"), None);
        assert_eq!(MenuChoice::from_input(" 12 "), Some(MenuChoice::Exit));
    }

    #[test]
    fn test_render_lists_every_entry() {
        let text = render();
        assert!(text.contains(TITLE));
        assert!(text.contains("1. Add Zakat Record"));
        assert!(text.contains("12. Exit"));
        assert_eq!(prompt(), "Enter your choice (1-12): ");
    }

    #[test]
    fn test_help_describes_every_entry() {
        let text = help();
        for choice in MenuChoice::ALL {
            assert!(text.contains(choice.description()));
        }
    }
}
