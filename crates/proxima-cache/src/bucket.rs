//! Quantized cache keys.

use std::fmt;

use proxima_protocol::LocationSample;

/// Cells per degree: one arc-minute, about 1.8 km at the equator.
///
/// Applied identically to longitude and latitude, so cells narrow east–west
/// towards the poles.
pub const BUCKET_RESOLUTION: f64 = 60.0;

/// The cache cell a location sample falls into.
///
/// `floor(longitude × 60)`, `floor(latitude × 60)`. Two samples share a key
/// iff both floored values match; fractional differences inside a cell are
/// discarded. Renders as `nearby:{lon_cell}:{lat_cell}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketKey {
    lon_cell: i64,
    lat_cell: i64,
}

impl BucketKey {
    pub fn from_sample(sample: LocationSample) -> Self {
        Self {
            lon_cell: (sample.longitude * BUCKET_RESOLUTION).floor() as i64,
            lat_cell: (sample.latitude * BUCKET_RESOLUTION).floor() as i64,
        }
    }

    pub fn lon_cell(&self) -> i64 {
        self.lon_cell
    }

    pub fn lat_cell(&self) -> i64 {
        self.lat_cell
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nearby:{}:{}", self.lon_cell, self.lat_cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(lon: f64, lat: f64) -> BucketKey {
        BucketKey::from_sample(LocationSample::new(lon, lat))
    }

    #[test]
    fn test_key_format() {
        // 4.70 × 60 = 282, 50.88 × 60 = 3052.8 → 3052
        assert_eq!(key(4.70, 50.88).to_string(), "nearby:282:3052");
    }

    #[test]
    fn test_nearby_samples_share_a_cell() {
        assert_eq!(key(4.70, 50.88), key(4.7001, 50.8799));
    }

    #[test]
    fn test_cell_boundary_splits_keys() {
        // 1/60° = 0.016666…; 4.7166 and 4.7167 sit either side of 283/60.
        assert_ne!(key(4.7166, 50.88), key(4.7167, 50.88));
    }

    #[test]
    fn test_negative_coordinates_floor_downwards() {
        // floor, not truncation: -0.001 × 60 = -0.06 → -1
        let k = key(-0.001, -33.9);
        assert_eq!(k.lon_cell(), -1);
        assert_eq!(k.lat_cell(), (-33.9f64 * 60.0).floor() as i64);
        assert_eq!(key(-0.001, 0.0).to_string(), "nearby:-1:0");
    }

    #[test]
    fn test_key_is_pure_function_of_floored_values() {
        // Every sample inside the same arc-minute cell maps to one key.
        let base = key(12.5, 41.905);
        for step in 0..10 {
            let frac = step as f64 * 0.0016;
            assert_eq!(key(12.5 + frac, 41.905 + frac / 2.0), base);
        }
    }
}
