//! Spherical distance.

use proxima_protocol::GeoPoint;

/// Sphere radius used for distance queries, in metres.
///
/// Equatorial WGS84 radius, the same figure 2dsphere indexes use.
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// Great-circle distance between two points in metres (haversine).
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}
