use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::locations::repo::LocationWithOwner;

/// Request body for creating a location. `lat`/`lng` stay optional here so a
/// missing coordinate is our validation error, not a deserialization reject.
#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Deserialize)]
pub struct UpdateLocationRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub tags: Option<String>,
}

/// One page of the global listing.
#[derive(Debug, Serialize)]
pub struct LocationPage {
    pub items: Vec<LocationWithOwner>,
    pub page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: Uuid,
}
