//! Glycol CLI - Command-line interface
//!
//! Watches the airspace around an airport and prints takeoffs and landings
//! as they are detected.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::bbox::BboxArgs;
use commands::common::FilterMode;
use commands::config::ConfigCommands;
use commands::groups::GroupCommands;
use commands::poi::PoiCommands;
use commands::start::StartArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "glycol")]
#[command(version, about = "Airport takeoff and landing monitor", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Monitor an airport until Ctrl+C
    Start {
        /// ICAO airport code (default: monitor.airport from config.ini)
        #[arg(short, long)]
        airport: Option<String>,

        /// Reference latitude, overriding the airport database
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Reference longitude, overriding the airport database
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// What to watch
        #[arg(short, long, value_enum)]
        mode: Option<FilterMode>,

        /// Comma-separated identifiers or groups for the chosen mode
        #[arg(short, long)]
        filter: Option<String>,

        /// Poll interval in seconds (5-120)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Monitoring radius in nautical miles
        #[arg(short, long)]
        radius: Option<f64>,

        /// Ignore airborne aircraft above this altitude in feet
        #[arg(long, conflicts_with = "no_ceiling")]
        ceiling: Option<f64>,

        /// Track airborne aircraft at any altitude
        #[arg(long)]
        no_ceiling: bool,
    },

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Manage aircraft type groups
    Groups {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Manage planes of interest (watch them with --mode poi)
    Poi {
        #[command(subcommand)]
        command: PoiCommands,
    },

    /// Show the monitoring box for an airport
    Bbox {
        /// ICAO airport code
        airport: String,

        /// Reference latitude, overriding the airport database
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Reference longitude, overriding the airport database
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Radius in nautical miles
        #[arg(short, long)]
        radius: Option<f64>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Start {
            airport,
            lat,
            lon,
            mode,
            filter,
            interval,
            radius,
            ceiling,
            no_ceiling,
        } => commands::start::run(StartArgs {
            airport,
            lat,
            lon,
            mode,
            filter,
            interval,
            radius,
            ceiling,
            no_ceiling,
            verbose: cli.verbose,
        }),
        Commands::Config { command } => commands::config::run(command),
        Commands::Groups { command } => commands::groups::run(command),
        Commands::Poi { command } => commands::poi::run(command),
        Commands::Bbox {
            airport,
            lat,
            lon,
            radius,
        } => commands::bbox::run(BboxArgs {
            airport,
            lat,
            lon,
            radius,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_start() {
        let cli = Cli::parse_from([
            "glycol", "start", "--airport", "KSFO", "--mode", "group", "--filter", "passenger",
            "--interval", "15",
        ]);
        match cli.command {
            Commands::Start {
                airport,
                mode,
                filter,
                interval,
                ..
            } => {
                assert_eq!(airport.as_deref(), Some("KSFO"));
                assert_eq!(mode, Some(FilterMode::Group));
                assert_eq!(filter.as_deref(), Some("passenger"));
                assert_eq!(interval, Some(15));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_negative_coordinates() {
        let cli = Cli::parse_from(["glycol", "bbox", "KSFO", "--lat", "37.6", "--lon", "-122.4"]);
        match cli.command {
            Commands::Bbox { lon, .. } => assert_eq!(lon, Some(-122.4)),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_poi_add() {
        let cli = Cli::parse_from([
            "glycol", "poi", "add", "N12345", "--icao24", "a1b2c3", "--model", "Cessna 172",
        ]);
        match cli.command {
            Commands::Poi {
                command:
                    PoiCommands::Add {
                        tail,
                        icao24,
                        model,
                        ..
                    },
            } => {
                assert_eq!(tail, "N12345");
                assert_eq!(icao24.as_deref(), Some("a1b2c3"));
                assert_eq!(model.as_deref(), Some("Cessna 172"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_ceiling_conflicts_with_no_ceiling() {
        let result = Cli::try_parse_from([
            "glycol",
            "start",
            "--ceiling",
            "2000",
            "--no-ceiling",
        ]);
        assert!(result.is_err());
    }
}
