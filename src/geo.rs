//! Geodesic distance between transaction origin and merchant location

use geographiclib_rs::{Geodesic, InverseGeodesic};
use once_cell::sync::Lazy;

static WGS84: Lazy<Geodesic> = Lazy::new(Geodesic::wgs84);

/// Distance in kilometers between two points on the WGS-84 ellipsoid.
///
/// Latitudes outside [-90, 90] (or non-finite input) yield NaN; longitudes
/// are normalized by the solver.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if !valid_latitude(lat1) || !valid_latitude(lat2) || !lon1.is_finite() || !lon2.is_finite() {
        return f64::NAN;
    }

    let meters: f64 = WGS84.inverse(lat1, lon1, lat2, lon2);
    meters.abs() / 1000.0
}

fn valid_latitude(lat: f64) -> bool {
    lat.is_finite() && (-90.0..=90.0).contains(&lat)
}
