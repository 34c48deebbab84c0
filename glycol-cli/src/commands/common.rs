//! Common types and output helpers shared across CLI commands.

use clap::ValueEnum;
use glycol::events::Event;
use glycol::filter::FilterSpec;
use glycol::monitor::SessionSnapshot;
use glycol::reference::PoiDatabase;

use crate::error::CliError;

/// Filter mode selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FilterMode {
    /// Every aircraft in range
    All,
    /// Specific aircraft by ICAO24 address, registration or callsign
    Aircraft,
    /// Aircraft whose type is in a type group or matches a type code
    Group,
    /// The planes-of-interest list, or the planes named in --filter
    Poi,
}

/// Effective mode: a value list without a mode means aircraft identifiers.
pub fn effective_mode(mode: Option<FilterMode>, values: Option<&str>) -> FilterMode {
    match (mode, values) {
        (Some(mode), _) => mode,
        (None, Some(_)) => FilterMode::Aircraft,
        (None, None) => FilterMode::All,
    }
}

/// Builds a filter from `--mode` and `--filter`.
///
/// `planes` must be given for [`FilterMode::Poi`].
pub fn resolve_filter_spec(
    mode: Option<FilterMode>,
    values: Option<&str>,
    planes: Option<&PoiDatabase>,
) -> Result<FilterSpec, CliError> {
    let raw = values.unwrap_or("");
    let spec = match effective_mode(mode, values) {
        FilterMode::All => FilterSpec::None,
        FilterMode::Aircraft => FilterSpec::from_mode_str("aircraft", raw)?,
        FilterMode::Group => FilterSpec::from_mode_str("group", raw)?,
        FilterMode::Poi => {
            let planes = planes.ok_or_else(|| {
                CliError::Config("Planes of interest are not loaded".to_string())
            })?;
            let selection: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            FilterSpec::from_planes(planes, &selection)?
        }
    };
    Ok(spec)
}

/// One line per event.
pub fn format_event(event: &Event) -> String {
    let arrow = match event.event_type {
        glycol::events::EventType::Takeoff => "↑",
        glycol::events::EventType::Landing => "↓",
    };
    format!("{} {}", arrow, event)
}

/// Formats seconds as `1h 02m 03s`, `2m 05s` or `7s`.
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

/// Prints the end-of-session summary.
pub fn print_summary(snapshot: &SessionSnapshot) {
    let duration = snapshot
        .stats
        .last_poll
        .map(|last| (last - snapshot.started_at).num_seconds())
        .unwrap_or(0);

    println!();
    println!("Session Summary");
    println!("───────────────");
    println!(
        "  Airport:   {} ({})",
        snapshot.airport.code, snapshot.airport.name
    );
    println!("  Filter:    {}", snapshot.filter);
    println!("  Duration:  {}", format_duration(duration));
    println!(
        "  Polls:     {} ok, {} failed, {} rate limited",
        snapshot.stats.polls, snapshot.stats.failed_polls, snapshot.stats.rate_limited_polls
    );
    println!(
        "  Events:    {} takeoffs, {} landings",
        snapshot.takeoffs, snapshot.landings
    );
    println!();
}
