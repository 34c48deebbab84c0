//! Type group management CLI commands.
//!
//! Groups live in the type groups file (`data.type_groups`) and are used by
//! `glycol start --mode group`.

use std::path::Path;

use clap::Subcommand;
use glycol::config::ConfigFile;
use glycol::reference::{AircraftType, TypeGroupLookup, TypeGroupsDatabase};

use crate::error::CliError;

/// Groups subcommands.
#[derive(Debug, Subcommand)]
pub enum GroupCommands {
    /// List all groups with their size
    List,

    /// Show the type codes in a group
    Show {
        /// Group name (case-insensitive)
        name: String,
    },

    /// Create a new group
    Create {
        /// Group name
        name: String,

        /// Initial ICAO type codes (e.g., B738 A320)
        codes: Vec<String>,
    },

    /// Add a type code to a group
    Add {
        /// Group name
        name: String,

        /// ICAO type code
        code: String,
    },

    /// Remove a type code from a group
    Remove {
        /// Group name
        name: String,

        /// ICAO type code
        code: String,
    },

    /// Delete a group
    Delete {
        /// Group name
        name: String,
    },

    /// Search the type glossary
    Types {
        /// Text to look for in code, make, model or notes
        query: Option<String>,
    },

    /// Add or replace a glossary entry
    Describe {
        /// ICAO type code
        code: String,

        /// Manufacturer
        #[arg(long)]
        make: String,

        /// Model name
        #[arg(long)]
        model: String,

        /// Free-form notes
        #[arg(long, default_value = "")]
        notes: String,
    },
}

/// Run a groups subcommand against the configured type groups file.
pub fn run(command: GroupCommands) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    run_with_path(command, &config.data.type_groups)
}

/// Run a groups subcommand against an explicit file.
pub fn run_with_path(command: GroupCommands, path: &Path) -> Result<(), CliError> {
    let mut db = TypeGroupsDatabase::load(path)?;

    match command {
        GroupCommands::List => {
            let names = db.group_names();
            if names.is_empty() {
                println!("No groups defined. Create one with 'glycol groups create <name>'.");
            }
            for name in names {
                let size = db.group(&name).map(<[String]>::len).unwrap_or(0);
                println!("{:<20} {} types", name, size);
            }
            return Ok(());
        }
        GroupCommands::Show { name } => {
            let codes = db
                .group(&name)
                .ok_or_else(|| CliError::Config(format!("Group '{}' not found", name)))?;
            println!("{}", name);
            for code in codes {
                match db.aircraft_type(code) {
                    Some(t) => println!("  {:<6} {} {}", code, t.make, t.model),
                    None => println!("  {}", code),
                }
            }
            return Ok(());
        }
        GroupCommands::Types { query } => {
            for (code, t) in db.search_types(query.as_deref().unwrap_or("")) {
                println!("{:<6} {:<20} {:<24} {}", code, t.make, t.model, t.notes);
            }
            return Ok(());
        }
        GroupCommands::Create { name, codes } => {
            db.create_group(&name, &codes)?;
            println!("Created group '{}' with {} types", name, codes.len());
        }
        GroupCommands::Add { name, code } => {
            db.add_to_group(&name, &code)?;
            println!("Added {} to '{}'", code.to_uppercase(), name);
        }
        GroupCommands::Remove { name, code } => {
            db.remove_from_group(&name, &code)?;
            println!("Removed {} from '{}'", code.to_uppercase(), name);
        }
        GroupCommands::Delete { name } => {
            db.delete_group(&name)?;
            println!("Deleted group '{}'", name);
        }
        GroupCommands::Describe {
            code,
            make,
            model,
            notes,
        } => {
            db.set_aircraft_type(&code, AircraftType { make, model, notes });
            println!("Saved glossary entry for {}", code.to_uppercase());
        }
    }

    db.save(path)?;
    Ok(())
}
