use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_RATING: f64 = 5.0;
pub const MIN_YEAR: i32 = 1900;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: String,
    pub owner_id: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price_per_day: i64,
    pub location: String,
    pub description: Option<String>,
    pub image_url: String,
    pub is_electric: bool,
    pub is_keyless: bool,
    pub has_seven_seats: bool,
    pub rating: f64,
    pub trip_count: i64,
    pub badges: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/cars`. The owner always comes from the session.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCar {
    #[validate(length(min = 1))]
    pub make: String,
    #[validate(length(min = 1))]
    pub model: String,
    pub year: i32,
    #[validate(range(min = 1))]
    pub price_per_day: i64,
    #[validate(length(min = 1))]
    pub location: String,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub image_url: String,
    #[serde(default)]
    pub is_electric: bool,
    #[serde(default)]
    pub is_keyless: bool,
    #[serde(default)]
    pub has_seven_seats: bool,
    #[serde(default)]
    pub badges: Vec<String>,
}

/// Catalog filters. Every `None` is unconstrained; set fields are ANDed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarFilter {
    pub location: Option<String>,
    pub is_electric: Option<bool>,
    pub is_keyless: Option<bool>,
    pub has_seven_seats: Option<bool>,
    /// Only cars with no active booking covering this day.
    pub available_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub days: i64,
    pub price_per_day: i64,
    pub subtotal: i64,
    pub service_fee: i64,
    pub total: i64,
}
