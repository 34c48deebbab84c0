//! Start command - watch an airport and print takeoffs and landings.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Notify;
use tracing::{debug, warn};

use glycol::monitor::{MonitorConfig, MonitorMessage, MonitorService};
use glycol::source::{OpenSkyClient, OpenSkyConfig};

use super::common::{effective_mode, format_event, print_summary, resolve_filter_spec, FilterMode};
use crate::error::CliError;
use crate::runner::{resolve_airport, CliRunner};

/// Arguments for the start command.
pub struct StartArgs {
    pub airport: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub mode: Option<FilterMode>,
    pub filter: Option<String>,
    pub interval: Option<u64>,
    pub radius: Option<f64>,
    pub ceiling: Option<f64>,
    pub no_ceiling: bool,
    pub verbose: bool,
}

/// Run the start command.
pub fn run(args: StartArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("start");
    let config = runner.config();

    // Airport: CLI > config
    let code = args
        .airport
        .clone()
        .or_else(|| config.monitor.airport.clone())
        .ok_or_else(|| {
            CliError::Config(
                "No airport given. Use --airport or set monitor.airport in config.ini.".to_string(),
            )
        })?;
    // Explicit coordinates make the airport database optional.
    let explicit = args.lat.is_some() && args.lon.is_some();
    let airports = runner.load_airports(!explicit)?;
    let airport = resolve_airport(&airports, &code, args.lat, args.lon)?;

    let planes = match effective_mode(args.mode, args.filter.as_deref()) {
        FilterMode::Poi => Some(runner.load_planes()?),
        _ => None,
    };
    let filter = resolve_filter_spec(args.mode, args.filter.as_deref(), planes.as_ref())?;
    let interval = Duration::from_secs(args.interval.unwrap_or(config.monitor.interval_secs));

    let mut monitor_config = MonitorConfig::from_config_file(config);
    if let Some(radius) = args.radius {
        monitor_config = monitor_config.with_radius_nm(radius);
    }
    if args.no_ceiling {
        monitor_config.tracker = monitor_config.tracker.with_ceiling_ft(None);
    } else if let Some(ceiling) = args.ceiling {
        monitor_config.tracker = monitor_config.tracker.with_ceiling_ft(Some(ceiling));
    }

    let source = OpenSkyClient::new(OpenSkyConfig::from_settings(&config.opensky))?;
    let groups = runner.load_type_groups()?;
    let registry = runner.load_aircraft_db()?;

    println!("Glycol Airport Monitor v{}", glycol::VERSION);
    println!("===========================");
    println!();
    println!("Airport:   {} ({})", airport.code, airport.name);
    println!(
        "Position:  {:.4}, {:.4}",
        airport.latitude, airport.longitude
    );
    println!(
        "Box:       {} ({} NM)",
        airport.bounding_box(monitor_config.radius_nm),
        monitor_config.radius_nm
    );
    println!("Filter:    {}", filter);
    match monitor_config.tracker.ceiling_ft {
        Some(ft) => println!("Ceiling:   {:.0} ft", ft),
        None => println!("Ceiling:   none"),
    }
    println!("Interval:  {}s", interval.as_secs());
    println!(
        "Source:    OpenSky Network ({})",
        if config.opensky.token.is_some() {
            "authenticated"
        } else {
            "anonymous"
        }
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let mut service = MonitorService::new(
        monitor_config,
        Arc::new(source),
        Arc::new(airports),
        Arc::new(groups),
        Arc::new(registry),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(format!("Failed to start async runtime: {}", e)))?;

    // Set up signal handler for graceful shutdown
    let shutdown = Arc::new(Notify::new());
    let signal = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        signal.notify_one();
    })
    .map_err(|e| CliError::Runtime(format!("Failed to set signal handler: {}", e)))?;

    let summary = runtime.block_on(async {
        let messages = service.subscribe();
        service.start_at(airport, filter, interval).await?;
        watch(messages, &shutdown).await;
        service.stop().await
    })?;

    print_summary(&summary);
    Ok(())
}

/// Prints push messages until shutdown or until the monitor goes away.
async fn watch(
    mut messages: tokio::sync::broadcast::Receiver<MonitorMessage>,
    shutdown: &Notify,
) {
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            message = messages.recv() => match message {
                Ok(MonitorMessage::NewEvents(events)) => {
                    for event in &events {
                        println!("{}", format_event(event));
                    }
                }
                Ok(MonitorMessage::RateLimit(notice)) => match notice.retry_after_secs {
                    Some(wait) => println!("Rate limited by OpenSky, resuming in {}s", wait),
                    None => debug!(remaining = ?notice.remaining, "OpenSky quota"),
                },
                Ok(MonitorMessage::AircraftUpdate(aircraft)) => {
                    debug!(count = aircraft.len(), "Aircraft in range");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Output fell behind, messages dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
