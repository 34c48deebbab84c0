//! Bbox command - show the monitoring box for an airport.

use glycol::config::ConfigFile;
use glycol::coord::{bounding_box, BoundingBox};
use glycol::reference::AirportDatabase;

use crate::error::CliError;
use crate::runner::resolve_airport;

/// Arguments for the bbox command.
pub struct BboxArgs {
    pub airport: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius: Option<f64>,
}

/// Run the bbox command.
pub fn run(args: BboxArgs) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let radius = args.radius.unwrap_or(config.monitor.radius_nm);
    if !(radius.is_finite() && radius > 0.0) {
        return Err(CliError::Config(format!("Invalid radius {}", radius)));
    }

    let airports = match (args.lat, args.lon) {
        (Some(_), Some(_)) => AirportDatabase::default(),
        _ => AirportDatabase::load(&config.data.airports)?,
    };
    let airport = resolve_airport(&airports, &args.airport, args.lat, args.lon)?;

    let bbox = bounding_box(airport.latitude, airport.longitude, radius);
    println!("{} ({})", airport.code, airport.name);
    println!("  Center:  {:.4}, {:.4}", airport.latitude, airport.longitude);
    println!("  Radius:  {} NM", radius);
    println!("  Box:     {}", bbox);
    println!(
        "  Span:    {:.4}° lat × {:.4}° lon",
        bbox.lat_span(),
        bbox.lon_span()
    );
    println!("  Query:   {}", opensky_query(&bbox));
    Ok(())
}

/// Query string for `/states/all`.
fn opensky_query(bbox: &BoundingBox) -> String {
    format!(
        "lamin={:.4}&lamax={:.4}&lomin={:.4}&lomax={:.4}",
        bbox.lat_min, bbox.lat_max, bbox.lon_min, bbox.lon_max
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opensky_query() {
        let bbox = bounding_box(0.0, 0.0, 60.0);
        assert_eq!(
            opensky_query(&bbox),
            "lamin=-1.0000&lamax=1.0000&lomin=-1.0000&lomax=1.0000"
        );
    }
}
