//! Planes-of-interest CLI commands.
//!
//! The list lives in `data.planes_of_interest` and is watched with
//! `glycol start --mode poi`.

use std::path::Path;

use clap::Subcommand;
use glycol::config::ConfigFile;
use glycol::reference::{PlaneOfInterest, PlaneUpdate, PoiDatabase};

use crate::error::CliError;

/// Poi subcommands.
#[derive(Debug, Subcommand)]
pub enum PoiCommands {
    /// List all planes of interest
    List,

    /// Show one plane
    Show {
        /// ICAO24 address or tail number
        identifier: String,
    },

    /// Add a plane
    Add {
        /// Tail number (e.g., N12345)
        tail: String,

        /// ICAO24 transponder address
        #[arg(long)]
        icao24: Option<String>,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Make and model
        #[arg(long)]
        model: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Change details of a plane
    Update {
        /// ICAO24 address or tail number
        identifier: String,

        #[arg(long)]
        icao24: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Remove a plane
    Remove {
        /// ICAO24 address or tail number
        identifier: String,
    },
}

/// Run a poi subcommand against the configured planes-of-interest file.
pub fn run(command: PoiCommands) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    run_with_path(command, &config.data.planes_of_interest)
}

/// Run a poi subcommand against an explicit file.
pub fn run_with_path(command: PoiCommands, path: &Path) -> Result<(), CliError> {
    let mut db = PoiDatabase::load(path)?;

    match command {
        PoiCommands::List => {
            if db.is_empty() {
                println!("No planes of interest. Add one with 'glycol poi add <tail>'.");
                return Ok(());
            }
            println!(
                "{:<20} {:<8} {:<10} {:<24} Notes",
                "Name", "ICAO24", "Tail", "Make/Model"
            );
            for plane in db.planes() {
                println!(
                    "{:<20} {:<8} {:<10} {:<24} {}",
                    plane.name, plane.icao24, plane.tailnumber, plane.make_model, plane.notes
                );
            }
            println!();
            println!("Total: {} planes", db.len());
            return Ok(());
        }
        PoiCommands::Show { identifier } => {
            let plane = db
                .get(&identifier)
                .ok_or_else(|| CliError::Config(format!("Plane '{}' not found", identifier)))?;
            println!("Name:        {}", plane.name);
            println!("ICAO24:      {}", plane.icao24);
            println!("Tail Number: {}", plane.tailnumber);
            println!("Make/Model:  {}", plane.make_model);
            println!("Notes:       {}", plane.notes);
            return Ok(());
        }
        PoiCommands::Add {
            tail,
            icao24,
            name,
            model,
            notes,
        } => {
            let plane = PlaneOfInterest::new(&tail)
                .with_icao24(icao24.as_deref().unwrap_or(""))
                .with_name(name.as_deref().unwrap_or(""))
                .with_make_model(model.as_deref().unwrap_or(""))
                .with_notes(notes.as_deref().unwrap_or(""));
            let label = plane.display_name().to_string();
            db.add(plane)?;
            println!("Added plane: {}", label);
        }
        PoiCommands::Update {
            identifier,
            icao24,
            name,
            model,
            notes,
        } => {
            let update = PlaneUpdate {
                name,
                icao24,
                make_model: model,
                notes,
            };
            if update.is_empty() {
                return Err(CliError::Config("No updates provided".to_string()));
            }
            db.update(&identifier, update)?;
            println!("Updated plane: {}", identifier);
        }
        PoiCommands::Remove { identifier } => {
            let removed = db.remove(&identifier)?;
            println!("Removed plane: {}", removed.display_name());
        }
    }

    db.save(path)?;
    Ok(())
}
