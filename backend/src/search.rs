//! Marketplace search: criteria, the filter engine, and distance ranking.
//!
//! Filtering is a conjunction of independent predicates over an
//! already-fetched candidate set; everything here is synchronous and
//! in-memory. Location resolution happens before filtering, in the
//! handler, so the engine only ever sees an optional resolved point.

use serde::{Deserialize, Serialize};

use crate::geo::{self, Coordinates};
use crate::models::{ListingType, Property, PropertyType};

/// Radius options offered by the search form. Unknown values from older
/// clients deserialize to [`SearchRadius::Unspecified`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SearchRadius {
    #[default]
    #[serde(rename = "this-area-only")]
    ThisAreaOnly,
    #[serde(rename = "0.25-miles")]
    QuarterMile,
    #[serde(rename = "0.5-miles")]
    HalfMile,
    #[serde(rename = "1-mile")]
    OneMile,
    #[serde(rename = "3-miles")]
    ThreeMiles,
    #[serde(rename = "5-miles")]
    FiveMiles,
    #[serde(rename = "10-miles")]
    TenMiles,
    #[serde(rename = "15-miles")]
    FifteenMiles,
    #[serde(rename = "20-miles")]
    TwentyMiles,
    #[serde(rename = "30-miles")]
    ThirtyMiles,
    #[serde(rename = "40-miles")]
    FortyMiles,
    #[serde(other)]
    Unspecified,
}

impl SearchRadius {
    pub fn miles(self) -> f64 {
        match self {
            SearchRadius::ThisAreaOnly => 0.5,
            SearchRadius::QuarterMile => 0.25,
            SearchRadius::HalfMile => 0.5,
            SearchRadius::OneMile => 1.0,
            SearchRadius::ThreeMiles => 3.0,
            SearchRadius::FiveMiles => 5.0,
            SearchRadius::TenMiles => 10.0,
            SearchRadius::FifteenMiles => 15.0,
            SearchRadius::TwentyMiles => 20.0,
            SearchRadius::ThirtyMiles => 30.0,
            SearchRadius::FortyMiles => 40.0,
            SearchRadius::Unspecified => 5.0,
        }
    }
}

/// One browsing session's worth of search state. Lives only for the
/// duration of a request; never persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub listing_type: ListingType,
    /// Free text as typed into the location box.
    #[serde(default)]
    pub location: String,
    /// Geocoder result for `location`, when it resolved.
    #[serde(default)]
    pub search_point: Option<Coordinates>,
    #[serde(default)]
    pub radius: SearchRadius,
    /// `None` means "any".
    #[serde(default)]
    pub property_type: Option<PropertyType>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub min_bedrooms: Option<u32>,
    #[serde(default)]
    pub max_bedrooms: Option<u32>,
    #[serde(default)]
    pub include_under_offer: bool,
    #[serde(default)]
    pub include_let_agreed: bool,
}

impl SearchCriteria {
    pub fn new(listing_type: ListingType) -> Self {
        SearchCriteria {
            listing_type,
            location: String::new(),
            search_point: None,
            radius: SearchRadius::default(),
            property_type: None,
            min_price: None,
            max_price: None,
            min_bedrooms: None,
            max_bedrooms: None,
            include_under_offer: false,
            include_let_agreed: false,
        }
    }

    /// Whether a property passes every active predicate.
    pub fn matches(&self, property: &Property) -> bool {
        property.listing_type == self.listing_type
            && self.matches_location(property)
            && self.matches_type(property)
            && self.matches_price(property)
            && self.matches_bedrooms(property)
    }

    /// Coordinate path when the search resolved to a point, text fallback
    /// when only free text was entered, pass-all when the box was empty.
    /// The two paths are mutually exclusive: with a resolved point, a
    /// property without coordinates is excluded rather than falling back
    /// to text matching.
    fn matches_location(&self, property: &Property) -> bool {
        if let Some(point) = self.search_point {
            return match property.address.coordinates() {
                Some(coords) => geo::distance_miles(point, coords) <= self.radius.miles(),
                None => false,
            };
        }
        let text = self.location.trim().to_lowercase();
        if text.is_empty() {
            return true;
        }
        property.title.to_lowercase().contains(&text)
            || property.address.city.to_lowercase().contains(&text)
            || property.address.zip_code.to_lowercase().contains(&text)
    }

    fn matches_type(&self, property: &Property) -> bool {
        match self.property_type {
            Some(wanted) => property.property_type == wanted,
            None => true,
        }
    }

    fn matches_price(&self, property: &Property) -> bool {
        let min = self.min_price.unwrap_or(0.0);
        let max = self.max_price.unwrap_or(f64::INFINITY);
        property.price >= min && property.price <= max
    }

    fn matches_bedrooms(&self, property: &Property) -> bool {
        let min = self.min_bedrooms.unwrap_or(0);
        let max = self.max_bedrooms.unwrap_or(u32::MAX);
        property.bedrooms >= min && property.bedrooms <= max
    }
}

/// Filtered subset in input order.
pub fn filter_properties(properties: Vec<Property>, criteria: &SearchCriteria) -> Vec<Property> {
    properties
        .into_iter()
        .filter(|p| criteria.matches(p))
        .collect()
}

/// With a resolved search point, order ascending by distance (stable, so
/// equal distances keep their input order). Without one, leave the input
/// order untouched.
pub fn rank_by_distance(properties: &mut [Property], search_point: Option<Coordinates>) {
    let Some(point) = search_point else {
        return;
    };
    properties.sort_by(|a, b| {
        let da = distance_from(a, point).unwrap_or(f64::INFINITY);
        let db = distance_from(b, point).unwrap_or(f64::INFINITY);
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Distance from the search point, for filtering and the "X.X miles"
/// result badge.
pub fn distance_from(property: &Property, point: Coordinates) -> Option<f64> {
    property
        .address
        .coordinates()
        .map(|coords| geo::distance_miles(point, coords))
}
