//! Coordinate handling: great-circle distance and location resolution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Great-circle distance in miles between two points, via the
/// Haversine formula.
pub fn distance_miles(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Resolves free-text place names to coordinates. Returning `None` means
/// the query could not be resolved; callers fall back to text matching.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Option<Coordinates>;
}

/// Fixed lookup table over well-known UK place names and postcodes.
/// Stands in for a real geocoding provider behind the same trait.
pub struct StaticGeocoder;

const PLACES: &[(&str, Coordinates)] = &[
    ("london", Coordinates { lat: 51.5074, lng: -0.1278 }),
    ("manchester", Coordinates { lat: 53.4808, lng: -2.2426 }),
    ("birmingham", Coordinates { lat: 52.4862, lng: -1.8904 }),
    ("leeds", Coordinates { lat: 53.8008, lng: -1.5491 }),
    ("liverpool", Coordinates { lat: 53.4084, lng: -2.9916 }),
    ("bristol", Coordinates { lat: 51.4545, lng: -2.5879 }),
    ("cardiff", Coordinates { lat: 51.4816, lng: -3.1791 }),
    ("edinburgh", Coordinates { lat: 55.9533, lng: -3.1883 }),
    ("glasgow", Coordinates { lat: 55.8642, lng: -4.2518 }),
    ("sw1a 1aa", Coordinates { lat: 51.5014, lng: -0.1419 }),
    ("m1 1aa", Coordinates { lat: 53.4808, lng: -2.2426 }),
    ("ec1v 2nj", Coordinates { lat: 51.5200, lng: -0.1000 }),
];

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, query: &str) -> Option<Coordinates> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        // Exact match first, then substring containment in either direction.
        if let Some((_, coords)) = PLACES.iter().find(|(name, _)| *name == normalized) {
            return Some(*coords);
        }
        PLACES
            .iter()
            .find(|(name, _)| name.contains(&normalized) || normalized.contains(name))
            .map(|(_, coords)| *coords)
    }
}

const SUGGESTION_POOL: &[&str] = &[
    "London",
    "Manchester",
    "Birmingham",
    "Leeds",
    "Liverpool",
    "Bristol",
    "Cardiff",
    "Edinburgh",
    "Glasgow",
    "Newcastle",
    "Sheffield",
    "Bradford",
    "Coventry",
    "Leicester",
    "Nottingham",
];

const MAX_SUGGESTIONS: usize = 5;

/// Type-ahead suggestions for the location search box.
pub fn location_suggestions(query: &str) -> Vec<&'static str> {
    let normalized = query.trim().to_lowercase();
    if normalized.is_empty() {
        return Vec::new();
    }
    SUGGESTION_POOL
        .iter()
        .filter(|place| place.to_lowercase().contains(&normalized))
        .take(MAX_SUGGESTIONS)
        .copied()
        .collect()
}
