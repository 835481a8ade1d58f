//! Great-circle distance and walking-time helpers.

use crate::domain::Coordinates;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default walking speed used for footpath durations.
pub const DEFAULT_WALKING_SPEED_KMH: f64 = 5.0;

/// Haversine distance between two points, in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Whole minutes needed to walk `distance_km` at `speed_kmh`, never less than one.
///
/// ```
/// use transit_server::geo::walk_minutes;
///
/// assert_eq!(walk_minutes(0.5, 5.0), 6);
/// assert_eq!(walk_minutes(0.001, 5.0), 1);
/// ```
pub fn walk_minutes(distance_km: f64, speed_kmh: f64) -> u32 {
    let minutes = (distance_km / speed_kmh * 60.0).ceil();
    if minutes.is_finite() && minutes >= 1.0 {
        minutes as u32
    } else {
        1
    }
}
