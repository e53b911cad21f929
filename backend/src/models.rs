use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

/// Listing fee charged before a property goes live, in pence.
pub const LISTING_FEE_PENCE: i64 = 2999;
/// Offer deposit is 1% of the offer amount, clamped to the bounds below.
pub const OFFER_DEPOSIT_RATE: f64 = 0.01;
pub const MIN_OFFER_DEPOSIT_PENCE: i64 = 50_000;
pub const MAX_OFFER_DEPOSIT_PENCE: i64 = 500_000;
pub const OFFER_EXPIRY_DAYS: i64 = 7;
pub const MAX_OFFER_MESSAGE_LENGTH: usize = 500;

pub const MIN_TITLE_LENGTH: usize = 5;
pub const MAX_TITLE_LENGTH: usize = 100;
pub const MIN_DESCRIPTION_LENGTH: usize = 10;
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const MAX_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Condo,
    Townhouse,
    Studio,
    Commercial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Sale,
    Rent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    #[default]
    Sqft,
    Sqm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub zip_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

fn default_country() -> String {
    "United Kingdom".to_string()
}

impl Address {
    /// Coordinate pair when the address has been geocoded.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        }
    }
}

/// A marketplace listing. Visible to buyers only while `is_active`
/// and `is_paid` both hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub price: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub size: f64,
    #[serde(default)]
    pub size_unit: SizeUnit,
    pub address: Address,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub floorplans: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub owner_id: String,
    pub is_active: bool,
    pub is_paid: bool,
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
    Solicitor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    Pending,
    Approved,
    Rejected,
    UnderReview,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub is_verified: bool,
    pub kyc_status: KycStatus,
    pub role: UserRole,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    pub property_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub amount: f64,
    pub message: String,
    pub status: OfferStatus,
    pub deposit_paid: bool,
    /// Deposit in pence, computed server-side from the offer amount.
    pub deposit_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Offer {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == OfferStatus::Pending && now > self.expires_at
    }
}

/// 1% of the offer amount, clamped to the deposit bounds.
pub fn offer_deposit_pence(amount: f64) -> i64 {
    let raw = (amount * 100.0 * OFFER_DEPOSIT_RATE).round() as i64;
    raw.clamp(MIN_OFFER_DEPOSIT_PENCE, MAX_OFFER_DEPOSIT_PENCE)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub price: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub size: f64,
    #[serde(default)]
    pub size_unit: SizeUnit,
    pub address: Address,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub floorplans: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub price: Option<f64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub size: Option<f64>,
    pub size_unit: Option<SizeUnit>,
    pub address: Option<Address>,
    pub images: Option<Vec<String>>,
    pub floorplans: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
}

/// Query parameters accepted by the marketplace list endpoint. All
/// optional; active filters combine with logical AND.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub listing_type: Option<ListingType>,
    pub property_type: Option<PropertyType>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferRequest {
    pub property_id: String,
    pub amount: f64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOfferRequest {
    pub status: OfferStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}
