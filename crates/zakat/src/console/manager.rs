//! The interactive Record Manager.
//!
//! Each menu action prompts for its input, validates it, and then runs one
//! storage call. Any error is reported by class and the operator is returned
//! to the menu; only a broken terminal ends the loop with an error. Ctrl-C
//! abandons the current action and asks whether to exit.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::{error, info, warn};

use super::menu::{self, MenuChoice};
use super::prompt::{capitalize, Console};
use crate::config::Config;
use crate::error::{Error, ErrorClass, Result};
use crate::export::{self, backup, csv_file, spreadsheet, table, Tabular};
use crate::model::{
    total_price, Donation, DonationUpdate, NewDistribution, NewDonation, NewRiceType, RiceUpsert,
};
use crate::storage::{Database, UpdateOutcome};
use crate::validate;

/// What the loop should do after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Drives the menu over a database and a console.
#[derive(Debug)]
pub struct RecordManager<R, W> {
    db: Database,
    config: Config,
    console: Console<R, W>,
    clock: Option<NaiveDateTime>,
}

impl<R: BufRead, W: Write> RecordManager<R, W> {
    /// Create a manager.
    pub fn new(db: Database, config: Config, console: Console<R, W>) -> Self {
        Self {
            db,
            config,
            console,
            clock: None,
        }
    }

    /// Use a fixed time for "today" and for generated file names.
    #[must_use]
    pub fn with_clock(mut self, now: NaiveDateTime) -> Self {
        self.clock = Some(now);
        self
    }

    /// Consume the manager and return its console.
    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.unwrap_or_else(|| Local::now().naive_local())
    }

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Show the menu until the operator exits.
    ///
    /// # Errors
    ///
    /// Returns an error only if the terminal cannot be read or written.
    pub fn run(&mut self) -> Result<()> {
        info!("Record manager started on {}", self.db.path().display());

        loop {
            self.console.print(menu::render())?;
            let Some(raw) = self.console.read_line(&menu::prompt())? else {
                if self.confirm_exit()? {
                    break;
                }
                continue;
            };

            let Some(choice) = MenuChoice::from_input(&raw) else {
                self.console.say(format!(
                    "Invalid choice. Please enter a number between 1-{}.",
                    MenuChoice::ALL.len()
                ))?;
                continue;
            };

            match self.dispatch(choice) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(err) => self.report(&err)?,
            }

            if self.console.take_interrupted() && self.confirm_exit()? {
                break;
            }
        }

        self.console.say("Exiting program. Thank you!")?;
        info!("Record manager stopped");
        Ok(())
    }

    fn dispatch(&mut self, choice: MenuChoice) -> Result<Flow> {
        match choice {
            MenuChoice::AddDonation => self.add_donation()?,
            MenuChoice::UpdateDonation => self.update_donation()?,
            MenuChoice::DeleteDonation => self.delete_donation()?,
            MenuChoice::ListDonations => self.list_donations()?,
            MenuChoice::ListRiceTypes => self.list_rice_types()?,
            MenuChoice::AddRiceType => self.add_rice_type()?,
            MenuChoice::AddDistribution => self.add_distribution()?,
            MenuChoice::ListDistributions => self.list_distributions()?,
            MenuChoice::ExportReport => self.export_report()?,
            MenuChoice::Backup => self.backup()?,
            MenuChoice::Help => self.console.say(menu::help())?,
            MenuChoice::Exit => {
                if self.confirm_exit()? {
                    return Ok(Flow::Exit);
                }
            }
        }
        Ok(Flow::Continue)
    }

    /// Ask whether to leave. A second end of input or Ctrl-C counts as yes.
    fn confirm_exit(&mut self) -> Result<bool> {
        self.console.take_interrupted();
        let answer = self
            .console
            .ask("Are you sure you want to exit? (y/n): ", validate::confirmation)?;
        self.console.take_interrupted();
        Ok(answer.unwrap_or(true))
    }

    fn report(&mut self, err: &Error) -> Result<()> {
        let class = err.class();
        if class == ErrorClass::Validation {
            warn!("{}", err);
        } else {
            error!("{}: {}", class, err);
        }
        self.console
            .say(format!("{}: {}.", capitalize(&class.to_string()), err))
    }

    fn cancelled(&mut self) -> Result<()> {
        self.console.say("Operation cancelled.")
    }

    // === Donations ===

    fn add_donation(&mut self) -> Result<()> {
        self.console.say("\n--- Add New Zakat Record ---")?;
        let today = self.today();
        let max_amount = self.config.limits.max_amount;

        let Some(name) = self
            .console
            .ask("Enter donor name: ", |s| validate::non_empty("name", s))?
        else {
            return self.cancelled();
        };
        let Some(category) = self
            .console
            .ask("Enter zakat type: ", |s| validate::non_empty("zakat type", s))?
        else {
            return self.cancelled();
        };
        let Some(amount) = self.console.ask("Enter zakat amount: ", |s| {
            validate::positive_amount("amount", s, Some(max_amount))
        })?
        else {
            return self.cancelled();
        };
        let Some(date) = self.console.ask("Enter date (YYYY-MM-DD): ", |s| {
            validate::past_or_present_date(s, today)
        })?
        else {
            return self.cancelled();
        };

        let donation = self.db.create_donation(&NewDonation {
            name,
            category,
            amount,
            date,
        })?;
        self.console.say(format!(
            "Zakat record added successfully with ID {}!",
            donation.id
        ))
    }

    /// Ask for a donation id and fetch the record.
    fn pick_donation(&mut self, prompt: &str) -> Result<Option<Donation>> {
        let Some(id) = self.console.ask(prompt, validate::record_id)? else {
            return Ok(None);
        };
        let donation = self
            .db
            .donation(id)?
            .ok_or_else(|| Error::not_found("zakat record", id))?;
        Ok(Some(donation))
    }

    fn update_donation(&mut self) -> Result<()> {
        self.console.say("\n--- Update Zakat Record ---")?;
        let Some(current) = self.pick_donation("Enter ID of zakat record to update: ")? else {
            return self.cancelled();
        };
        self.console.say("\nCurrent record:")?;
        self.console.print(table::render_record(&current))?;
        self.console.say("Leave a field blank to keep its current value.")?;

        let today = self.today();
        let max_amount = self.config.limits.max_amount;

        let Some(name) = self
            .console
            .ask(&format!("Enter new name [{}]: ", current.name), |s| {
                validate::optional(s, |v| validate::non_empty("name", v))
            })?
        else {
            return self.cancelled();
        };
        let Some(category) = self.console.ask(
            &format!("Enter new zakat type [{}]: ", current.category),
            |s| validate::optional(s, |v| validate::non_empty("zakat type", v)),
        )?
        else {
            return self.cancelled();
        };
        let Some(amount) = self
            .console
            .ask(&format!("Enter new amount [{:.2}]: ", current.amount), |s| {
                validate::optional(s, |v| {
                    validate::positive_amount("amount", v, Some(max_amount))
                })
            })?
        else {
            return self.cancelled();
        };
        let Some(date) = self.console.ask(
            &format!("Enter new date [{}]: ", current.date),
            |s| validate::optional(s, |v| validate::past_or_present_date(v, today)),
        )?
        else {
            return self.cancelled();
        };

        let update = DonationUpdate {
            name,
            category,
            amount,
            date,
        };
        if !update.changes(&current) {
            return self.console.say("No changes made.");
        }

        self.console.say("\nUpdated record:")?;
        self.console
            .print(table::render_record(&current.apply(&update)))?;
        if !self.console.confirm("Save these changes?")? {
            return self.console.say("Update cancelled.");
        }

        match self.db.update_donation(current.id, &update)? {
            UpdateOutcome::Updated(_) => self.console.say("Zakat record updated successfully!"),
            UpdateOutcome::Unchanged(_) => self.console.say("No changes made."),
        }
    }

    fn delete_donation(&mut self) -> Result<()> {
        self.console.say("\n--- Delete Zakat Record ---")?;
        let Some(donation) = self.pick_donation("Enter ID of zakat record to delete: ")? else {
            return self.cancelled();
        };
        self.console.say("\nRecord to delete:")?;
        self.console.print(table::render_record(&donation))?;

        let count = self.db.dependent_distributions(donation.id)?;
        if count > 0 {
            warn!(
                "Refusing to delete donation {} with {} distributions",
                donation.id, count
            );
            self.console.say(format!(
                "This record has {count} distribution(s) and cannot be deleted."
            ))?;
            if self.console.confirm("Show its distributions?")? {
                let rows = self.db.distribution_details(Some(donation.id))?;
                self.console.print(table::render(&rows))?;
            }
            return Ok(());
        }

        if !self
            .console
            .confirm("Are you sure you want to delete this record?")?
        {
            return self.console.say("Deletion cancelled.");
        }
        if !self.console.confirm(&format!(
            "This cannot be undone. Delete zakat record {}?",
            donation.id
        ))? {
            return self.console.say("Deletion cancelled.");
        }

        self.db.delete_donation(donation.id)?;
        self.console.say("Zakat record deleted successfully!")
    }

    fn list_donations(&mut self) -> Result<()> {
        self.console.say("\n--- Zakat Records ---")?;
        let rows = self.db.donations()?;
        if rows.is_empty() {
            return self.console.say("No zakat records found.");
        }
        self.show_rows(&rows, "Total records")?;
        self.offer_csv(&rows, "zakat_records")
    }

    // === Rice types ===

    fn list_rice_types(&mut self) -> Result<()> {
        self.console.say("\n--- Rice Master Data ---")?;
        let rows = self.db.rice_types()?;
        if rows.is_empty() {
            return self.console.say("No rice types found in database.");
        }
        self.show_rows(&rows, "Total rice types")?;
        self.offer_csv(&rows, "rice_types")
    }

    fn add_rice_type(&mut self) -> Result<()> {
        self.console.say("\n--- Add New Rice Type ---")?;
        let max_price = self.config.limits.max_price_per_kg;

        let Some(name) = self
            .console
            .ask("Enter rice name: ", |s| validate::non_empty("rice name", s))?
        else {
            return self.cancelled();
        };

        if let Some(existing) = self.db.rice_type_by_name(&name)? {
            self.console.say(format!(
                "Rice type '{}' already exists with price {:.2} per kg.",
                existing.name, existing.price_per_kg
            ))?;
            if !self.console.confirm("Update its price instead?")? {
                return self.console.say("No changes made.");
            }
        }

        let Some(price_per_kg) = self.console.ask("Enter price per kg: ", |s| {
            validate::positive_amount("price per kg", s, Some(max_price))
        })?
        else {
            return self.cancelled();
        };

        match self.db.upsert_rice_type(&NewRiceType { name, price_per_kg })? {
            RiceUpsert::Inserted(rice) => self.console.say(format!(
                "Rice type added successfully with ID {}!",
                rice.id
            )),
            RiceUpsert::Updated {
                rice,
                previous_price,
            } => self.console.say(format!(
                "Price of '{}' updated from {:.2} to {:.2} per kg.",
                rice.name, previous_price, rice.price_per_kg
            )),
        }
    }

    // === Distributions ===

    fn add_distribution(&mut self) -> Result<()> {
        self.console.say("\n--- Add Zakat Distribution ---")?;
        let Some(donation) = self.pick_donation("Enter zakat record ID: ")? else {
            return self.cancelled();
        };
        self.console.print(table::render_record(&donation))?;

        let Some(rice_id) = self
            .console
            .ask("Enter rice type ID: ", validate::record_id)?
        else {
            return self.cancelled();
        };
        let rice = self
            .db
            .rice_type(rice_id)?
            .ok_or_else(|| Error::not_found("rice type", rice_id))?;
        self.console.print(table::render_record(&rice))?;

        let today = self.today();
        let max_quantity = self.config.limits.max_quantity_kg;
        let Some(quantity) = self.console.ask("Enter rice amount (kg): ", |s| {
            validate::positive_amount("quantity", s, Some(max_quantity))
        })?
        else {
            return self.cancelled();
        };
        let Some(date) = self
            .console
            .ask("Enter distribution date (YYYY-MM-DD): ", |s| {
                validate::past_or_present_date(s, today)
            })?
        else {
            return self.cancelled();
        };

        self.console.say(format!(
            "\nDistribution summary:\n  \
             Donor       : {} (record {})\n  \
             Rice type   : {} at {:.2} per kg\n  \
             Quantity    : {:.2} kg\n  \
             Total price : {:.2}\n  \
             Date        : {}",
            donation.name,
            donation.id,
            rice.name,
            rice.price_per_kg,
            quantity,
            total_price(rice.price_per_kg, quantity),
            date
        ))?;
        if !self.console.confirm("Record this distribution?")? {
            return self.console.say("Distribution cancelled.");
        }

        let distribution = self.db.create_distribution(&NewDistribution {
            donation_id: donation.id,
            rice_type_id: rice.id,
            quantity,
            date,
        })?;
        self.console.say(format!(
            "Zakat distribution recorded successfully with ID {}! Total price: {:.2}",
            distribution.id, distribution.total_price
        ))
    }

    fn list_distributions(&mut self) -> Result<()> {
        self.console.say("\n--- Zakat Distribution Records ---")?;
        let filter_prompt = "Filter by zakat record ID (blank for all): ";
        let Some(mut filter) = self.console.ask(filter_prompt, |s| {
            validate::optional(s, validate::record_id)
        })?
        else {
            return Ok(());
        };

        loop {
            let rows = self.db.distribution_details(filter)?;
            if rows.is_empty() {
                match filter {
                    Some(id) => self.console.say(format!(
                        "No distribution records found for zakat record {id}."
                    ))?,
                    None => self.console.say("No distribution records found.")?,
                }
            } else {
                self.show_rows(&rows, "Total distributions")?;
                self.offer_csv(&rows, "zakat_distributions")?;
            }

            let next = self.console.ask(
                "Filter by another zakat record ID (blank to finish): ",
                |s| validate::optional(s, validate::record_id),
            )?;
            match next {
                Some(Some(id)) => filter = Some(id),
                Some(None) | None => return Ok(()),
            }
        }
    }

    // === Files ===

    fn show_rows<T: Tabular>(&mut self, rows: &[T], total_label: &str) -> Result<()> {
        self.console.print(format!("\n{}", table::render(rows)))?;
        self.console
            .say(format!("\n{total_label}: {}", rows.len()))
    }

    /// Offer to write the listed rows to a CSV file.
    fn offer_csv<T: Tabular>(&mut self, rows: &[T], prefix: &str) -> Result<()> {
        if !self.console.confirm("Export these rows to CSV?")? {
            return Ok(());
        }

        let dir = self.config.export.output_dir.clone();
        let default_path = export::timestamped_path(&dir, prefix, "csv", self.now());
        let Some(file) = self.console.ask(
            &format!("CSV file name [{}]: ", default_path.display()),
            |s| validate::optional(s, |v| validate::non_empty("file name", v)),
        )?
        else {
            return self.cancelled();
        };

        let available: Vec<String> = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{}={name}", i + 1))
            .collect();
        self.console
            .say(format!("Columns: {}", available.join(", ")))?;
        let Some(columns) = self.console.ask(
            "Columns to include (numbers or names, comma-separated, blank for all): ",
            |s| validate::columns(s, T::COLUMNS),
        )?
        else {
            return self.cancelled();
        };

        let path = match file {
            Some(name) => dir.join(PathBuf::from(name)),
            None => default_path,
        };
        if let Some(parent) = path.parent() {
            export::ensure_dir(parent)?;
        }
        let count = csv_file::write_csv(&path, rows, &columns)?;
        self.console.say(format!(
            "Exported {count} rows to '{}'",
            path.display()
        ))
    }

    fn export_report(&mut self) -> Result<()> {
        self.console.say("\n--- Export Data to Spreadsheet ---")?;
        let (path, counts) =
            spreadsheet::export_database(&self.db, &self.config.export.output_dir, self.now())?;
        self.console.say(format!(
            "Data successfully exported to '{}' ({} records, {} distributions, {} rice types)",
            path.display(),
            counts.donations,
            counts.distributions,
            counts.rice_types
        ))
    }

    fn backup(&mut self) -> Result<()> {
        self.console.say("\n--- Backup Database ---")?;
        let (path, rows) =
            backup::backup_database(&self.db, &self.config.export.output_dir, self.now())?;
        self.console.say(format!(
            "Backup written to '{}' ({rows} rows)",
            path.display()
        ))
    }
}
