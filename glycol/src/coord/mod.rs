//! Bounding box calculation
//!
//! Converts an airport reference point and a radius in nautical miles into
//! the rectangular latitude/longitude box that the upstream API accepts.
//!
//! One nautical mile is one minute of latitude, so the latitude half-height
//! is simply `radius / 60` degrees. Meridians converge towards the poles, so
//! the longitude half-width is stretched by `1 / cos(latitude)` to cover the
//! same ground distance.

use std::fmt;

use serde::Serialize;

/// Default monitoring radius around an airport, in nautical miles.
pub const DEFAULT_RADIUS_NM: f64 = 5.0;

/// Degrees of latitude per nautical mile.
pub const NM_TO_DEG_LAT: f64 = 1.0 / 60.0;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Smallest cosine used for the longitude stretch.
///
/// Keeps the box finite when the reference point sits on a pole.
const MIN_COS_LAT: f64 = 1e-6;

/// A rectangular latitude/longitude region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    /// Southern edge in degrees.
    pub lat_min: f64,
    /// Northern edge in degrees.
    pub lat_max: f64,
    /// Western edge in degrees.
    pub lon_min: f64,
    /// Eastern edge in degrees.
    pub lon_max: f64,
}

impl BoundingBox {
    /// Height of the box in degrees of latitude.
    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Width of the box in degrees of longitude.
    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Whether a point lies inside the box (edges inclusive).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat) && (self.lon_min..=self.lon_max).contains(&lon)
    }

    /// The box as the `(lamin, lamax, lomin, lomax)` tuple used by OpenSky.
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.lat_min, self.lat_max, self.lon_min, self.lon_max)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lat {:.4}..{:.4}, lon {:.4}..{:.4}",
            self.lat_min, self.lat_max, self.lon_min, self.lon_max
        )
    }
}

/// Computes the bounding box around a reference point.
///
/// # Arguments
///
/// * `lat` - Reference latitude in degrees (-90.0 to 90.0)
/// * `lon` - Reference longitude in degrees (-180.0 to 180.0)
/// * `radius_nm` - Radius in nautical miles
///
/// The caller is responsible for passing validated coordinates; see
/// [`crate::reference::AirportRef::new`].
pub fn bounding_box(lat: f64, lon: f64, radius_nm: f64) -> BoundingBox {
    let dlat = radius_nm * NM_TO_DEG_LAT;
    let cos_lat = lat.to_radians().cos().abs().max(MIN_COS_LAT);
    let dlon = dlat / cos_lat;

    BoundingBox {
        lat_min: lat - dlat,
        lat_max: lat + dlat,
        lon_min: lon - dlon,
        lon_max: lon + dlon,
    }
}

/// Whether a latitude/longitude pair is inside the valid WGS84 ranges.
pub fn is_valid_position(lat: f64, lon: f64) -> bool {
    (MIN_LAT..=MAX_LAT).contains(&lat) && (MIN_LON..=MAX_LON).contains(&lon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_box_at_equator() {
        let bbox = bounding_box(0.0, 0.0, 6.0);
        assert!((bbox.lat_min + 0.1).abs() < 1e-12);
        assert!((bbox.lat_max - 0.1).abs() < 1e-12);
        assert!((bbox.lon_min + 0.1).abs() < 1e-12);
        assert!((bbox.lon_max - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_longitude_span_halves_at_sixty_degrees() {
        let equator = bounding_box(0.0, 10.0, DEFAULT_RADIUS_NM);
        let north = bounding_box(60.0, 10.0, DEFAULT_RADIUS_NM);

        // Same latitude extent everywhere
        assert!((equator.lat_span() - north.lat_span()).abs() < 1e-12);

        // cos(60°) = 0.5, so the box is twice as wide in degrees at 60°N
        let ratio = north.lon_span() / equator.lon_span();
        assert!((ratio - 2.0).abs() < 1e-9, "ratio was {}", ratio);
    }

    #[test]
    fn test_southern_hemisphere_is_symmetric() {
        let north = bounding_box(45.0, 0.0, 5.0);
        let south = bounding_box(-45.0, 0.0, 5.0);
        assert!((north.lon_span() - south.lon_span()).abs() < 1e-12);
    }

    #[test]
    fn test_box_at_pole_is_finite() {
        let bbox = bounding_box(90.0, 0.0, 5.0);
        assert!(bbox.lon_span().is_finite());
    }

    #[test]
    fn test_contains_reference_point() {
        // KSFO
        let bbox = bounding_box(37.6188, -122.3750, DEFAULT_RADIUS_NM);
        assert!(bbox.contains(37.6188, -122.3750));
        assert!(!bbox.contains(37.8, -122.3750));
    }

    #[test]
    fn test_display() {
        let bbox = bounding_box(0.0, 0.0, 6.0);
        assert_eq!(bbox.to_string(), "lat -0.1000..0.1000, lon -0.1000..0.1000");
    }

    #[test]
    fn test_is_valid_position() {
        assert!(is_valid_position(37.6, -122.4));
        assert!(!is_valid_position(91.0, 0.0));
        assert!(!is_valid_position(0.0, -180.5));
    }

    proptest! {
        #[test]
        fn prop_box_is_centered_on_reference(lat in -80.0f64..80.0, lon in -170.0f64..170.0, r in 0.5f64..50.0) {
            let bbox = bounding_box(lat, lon, r);
            prop_assert!(((bbox.lat_min + bbox.lat_max) / 2.0 - lat).abs() < 1e-9);
            prop_assert!(((bbox.lon_min + bbox.lon_max) / 2.0 - lon).abs() < 1e-9);
            prop_assert!(bbox.lon_span() >= bbox.lat_span() - 1e-12);
        }

        #[test]
        fn prop_width_scales_with_inverse_cosine(lat in -80.0f64..80.0, r in 0.5f64..50.0) {
            let bbox = bounding_box(lat, 0.0, r);
            let expected = bbox.lat_span() / lat.to_radians().cos();
            prop_assert!((bbox.lon_span() - expected).abs() < 1e-9);
        }
    }
}
