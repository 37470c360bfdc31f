//! Cache keys for per-tile condition lookups.
//!
//! Coordinates are rounded onto a coarse grid so nearby requests share one
//! cache entry; the UTC date scopes entries to the provider's time bucket.

use chrono::NaiveDate;

/// Grid cell size in degrees (~5.5 km of latitude).
pub const COORD_BUCKET_DEG: f64 = 0.05;

/// A rounded (latitude, longitude, date) cache key.
///
/// Nothing else about a request participates in the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    lat_bucket: i32,
    lon_bucket: i32,
    date: NaiveDate,
}

impl TileKey {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, date: NaiveDate) -> Self {
        Self {
            lat_bucket: bucket(latitude),
            lon_bucket: bucket(longitude),
            date,
        }
    }
}

fn bucket(degrees: f64) -> i32 {
    (degrees / COORD_BUCKET_DEG).round() as i32
}
