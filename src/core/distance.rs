use geo::{point, HaversineDistance};

use crate::models::BoundingBox;

const METERS_PER_MILE: f64 = 1609.344;

/// Miles per degree of latitude
const MILES_PER_DEGREE: f64 = 69.0;

/// Great-circle distance between two points in miles
#[inline]
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let a = point!(x: lon1, y: lat1);
    let b = point!(x: lon2, y: lat2);
    a.haversine_distance(&b) / METERS_PER_MILE
}

/// Calculate a bounding box around a center point
///
/// Cheaper than haversine for the datastore pre-filter.
/// 1° latitude ≈ 69mi, 1° longitude ≈ 69mi * cos(latitude)
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_miles: f64) -> BoundingBox {
    let lat_delta = radius_miles / MILES_PER_DEGREE;
    let lon_delta = radius_miles / (MILES_PER_DEGREE * lat.to_radians().cos().abs().max(0.01));

    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    lat >= bbox.min_lat && lat <= bbox.max_lat && lon >= bbox.min_lon && lon <= bbox.max_lon
}
