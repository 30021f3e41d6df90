//! Input row and GeoJSON output document types
//!
//! The output matches the shape of the "Saved Places.json" files Google
//! Takeout produces, so converted exports line up with native ones.

use serde::{Deserialize, Serialize};

/// One saved place as read from the CSV export.
///
/// Extra columns (Note, etc.) are ignored; missing columns default to empty.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedPlace {
    #[serde(default, rename = "Title")]
    pub title: String,
    #[serde(default, rename = "URL")]
    pub url: String,
}

/// Top-level GeoJSON document.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

/// One output point, located or not.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Properties,
}

/// Coordinates are [longitude, latitude], per the GeoJSON spec.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
}

#[derive(Debug, Serialize)]
pub struct Properties {
    /// Run timestamp, UTC ISO 8601
    pub date: String,
    pub google_maps_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Only set on rows the lookup could not locate
    #[serde(rename = "Comment", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Location {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}
