//! `zakatctl` - CLI for zakat
//!
//! This binary opens the interactive record manager and exposes the
//! reporting operations as scriptable subcommands.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use clap::Parser;

use zakat::cli::{
    BackupCommand, Cli, Command, ConfigCommand, ExportCommand, ListCommand, ListTarget,
    OutputFormat, StatusCommand,
};
use zakat::export::{backup, csv_file, spreadsheet, table, Tabular};
use zakat::{console, init_logging, validate, Config, Database, RecordManager};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Execute the command
    match cli.command.unwrap_or(Command::Menu) {
        Command::Menu => handle_menu(config),
        Command::Init => handle_init(&config),
        Command::Status(cmd) => handle_status(&config, &cmd),
        Command::Export(cmd) => handle_export(&config, cmd),
        Command::Backup(cmd) => handle_backup(&config, cmd),
        Command::List(cmd) => handle_list(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_database(config: &Config) -> anyhow::Result<Database> {
    let path = config.database_path();
    Database::open(&path).with_context(|| format!("cannot use database {}", path.display()))
}

fn handle_menu(config: Config) -> anyhow::Result<()> {
    let db = open_database(&config)?;
    let mut manager = RecordManager::new(db, config, console::stdio()?);
    manager.run()?;
    Ok(())
}

fn handle_init(config: &Config) -> anyhow::Result<()> {
    let db = open_database(config)?;
    println!(
        "Database ready at {} (schema version {})",
        db.path().display(),
        db.schema_version()?
    );
    Ok(())
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let path = config.database_path();
    if !path.exists() {
        if cmd.json {
            let status = serde_json::json!({
                "database_path": path,
                "initialized": false,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            println!("Database:      {} (not created yet)", path.display());
            println!("Run `zakatctl init` to create it.");
        }
        return Ok(());
    }

    let db = Database::existing(&path);
    let stats = db.stats()?;
    let version = db.schema_version()?;

    if cmd.json {
        let status = serde_json::json!({
            "database_path": path,
            "initialized": true,
            "schema_version": version,
            "counts": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("zakatctl status");
        println!("---------------");
        println!("Database:      {}", path.display());
        println!("Schema:        v{version}");
        println!("Donations:     {}", stats.donations);
        println!("Rice types:    {}", stats.rice_types);
        println!("Distributions: {}", stats.distributions);
    }
    Ok(())
}

fn output_dir(config: &Config, requested: Option<PathBuf>) -> PathBuf {
    requested.unwrap_or_else(|| config.export.output_dir.clone())
}

fn handle_export(config: &Config, cmd: ExportCommand) -> anyhow::Result<()> {
    let db = open_database(config)?;
    let dir = output_dir(config, cmd.output_dir);
    let (path, counts) = spreadsheet::export_database(&db, &dir, Local::now().naive_local())?;
    println!(
        "Data successfully exported to '{}' ({} records, {} distributions, {} rice types)",
        path.display(),
        counts.donations,
        counts.distributions,
        counts.rice_types
    );
    Ok(())
}

fn handle_backup(config: &Config, cmd: BackupCommand) -> anyhow::Result<()> {
    let db = open_database(config)?;
    let dir = output_dir(config, cmd.output_dir);
    let (path, rows) = backup::backup_database(&db, &dir, Local::now().naive_local())?;
    println!("Backup written to '{}' ({rows} rows)", path.display());
    Ok(())
}

fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    let db = open_database(config)?;
    match cmd.target {
        ListTarget::Donations => print_rows(&db.donations()?, cmd, "Total records"),
        ListTarget::RiceTypes => print_rows(&db.rice_types()?, cmd, "Total rice types"),
        ListTarget::Distributions => print_rows(
            &db.distribution_details(cmd.donation)?,
            cmd,
            "Total distributions",
        ),
    }
}

fn print_rows<T: Tabular + serde::Serialize>(
    rows: &[T],
    cmd: &ListCommand,
    total_label: &str,
) -> anyhow::Result<()> {
    match cmd.format {
        OutputFormat::Table => {
            print!("{}", table::render(rows));
            println!("\n{total_label}: {}", rows.len());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
    }

    if let Some(csv_path) = &cmd.csv {
        let columns = validate::columns(cmd.columns.as_deref().unwrap_or(""), T::COLUMNS)?;
        write_csv(csv_path, rows, &columns)?;
    }
    Ok(())
}

fn write_csv<T: Tabular>(path: &Path, rows: &[T], columns: &[usize]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        zakat::export::ensure_dir(parent)?;
    }
    let count = csv_file::write_csv(path, rows, columns)?;
    eprintln!("Exported {count} rows to '{}'", path.display());
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Database]");
                println!("  Path:               {}", config.database_path().display());
                println!();
                println!("[Export]");
                println!(
                    "  Output directory:   {}",
                    config.export.output_dir.display()
                );
                println!();
                println!("[Limits]");
                println!(
                    "  Max price per kg:   {:.2}",
                    config.limits.max_price_per_kg
                );
                println!("  Max quantity (kg):  {:.2}", config.limits.max_quantity_kg);
                println!("  Max amount:         {:.2}", config.limits.max_amount);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
