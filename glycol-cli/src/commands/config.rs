//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path`.

use std::path::Path;

use clap::Subcommand;
use glycol::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., monitor.airport)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., monitor.airport)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand against the default configuration file.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    run_with_path(command, &config_file_path())
}

/// Run a config subcommand against an explicit file.
pub fn run_with_path(command: ConfigCommands, path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let config = ConfigFile::load_from(path)?;
            let value = parse_key(&key)?.get(&config);
            if value.is_empty() {
                println!("(not set)");
            } else {
                println!("{}", value);
            }
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let config_key = parse_key(&key)?;
            set_value(path, config_key, &value)?;
            println!("Set {} = {}", config_key.name(), value);
            Ok(())
        }
        ConfigCommands::List => {
            let config = ConfigFile::load_from(path)?;
            print_list(&config);
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'glycol config list' to see available keys.",
            key
        ))
    })
}

/// Loads, updates and saves one key.
fn set_value(path: &Path, key: ConfigKey, value: &str) -> Result<(), CliError> {
    let mut config = ConfigFile::load_from(path)?;
    key.set(&mut config, value)?;
    config.save_to(path)?;
    Ok(())
}

fn print_list(config: &ConfigFile) {
    println!("Configuration Settings");
    println!("======================");

    let mut current_section = "";
    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            println!();
            println!("[{}]", section);
            current_section = section;
        }

        let value = key.get(config);
        if value.is_empty() {
            println!("  {} = (not set)", key.key_name());
        } else {
            println!("  {} = {}", key.key_name(), value);
        }
    }
}
