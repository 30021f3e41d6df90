//! Thin client for the Google Places and Geocoding web services.
//!
//! Lookups that fail (non-OK status, no candidates, missing fields) return
//! `Ok(None)` so the caller can degrade the row; only transport and HTTP
//! errors propagate.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{GEOCODE_API_URL, PLACES_API_URL, REQUEST_DELAY};

/// Resolved location data for one saved place.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDetails {
    pub lat: f64,
    pub lng: f64,
    /// Formatted address; empty when the service omitted it
    pub address: String,
    /// Display name, when the details lookup provided one
    pub name: Option<String>,
    /// ISO country code from the address components
    pub country_code: Option<String>,
}

pub struct PlacesClient {
    client: reqwest::blocking::Client,
    api_key: String,
    last_request: RefCell<Option<Instant>>,
}

impl PlacesClient {
    pub fn new(api_key: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; SavedPlacesConverter/1.0)")
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            last_request: RefCell::new(None),
        })
    }

    /// Space consecutive API calls out by at least REQUEST_DELAY.
    fn pace(&self) {
        let mut last = self.last_request.borrow_mut();
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < REQUEST_DELAY {
                std::thread::sleep(REQUEST_DELAY - elapsed);
            }
        }
        *last = Some(Instant::now());
    }

    /// Find Place from Text: resolve a free-text query to a place_id.
    pub fn find_place_id(&self, query: &str) -> Result<Option<String>> {
        self.pace();
        let url = format!("{}/findplacefromtext/json", PLACES_API_URL);
        let response: FindPlaceResponse = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("input", query),
                ("inputtype", "textquery"),
                ("fields", "place_id"),
            ])
            .send()
            .context("Failed to call Find Place")?
            .error_for_status()
            .context("Find Place request rejected")?
            .json()
            .context("Failed to parse Find Place response")?;
        Ok(place_id_from(response))
    }

    /// Place Details: geometry, formatted address and name for a place_id.
    pub fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>> {
        self.pace();
        let url = format!("{}/details/json", PLACES_API_URL);
        let response: DetailsResponse = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("place_id", place_id),
                ("fields", "geometry,formatted_address,name,address_components"),
            ])
            .send()
            .context("Failed to call Place Details")?
            .error_for_status()
            .context("Place Details request rejected")?
            .json()
            .context("Failed to parse Place Details response")?;
        Ok(details_from(response))
    }

    /// Geocoding fallback for queries Find Place cannot match.
    pub fn geocode(&self, query: &str) -> Result<Option<PlaceDetails>> {
        self.pace();
        let response: GeocodeResponse = self
            .client
            .get(GEOCODE_API_URL)
            .query(&[("key", self.api_key.as_str()), ("address", query)])
            .send()
            .context("Failed to call Geocoding")?
            .error_for_status()
            .context("Geocoding request rejected")?
            .json()
            .context("Failed to parse Geocoding response")?;
        Ok(geocode_details_from(response))
    }
}

// Places API response types - only the fields we read, everything optional.

#[derive(Debug, Deserialize)]
struct FindPlaceResponse {
    status: String,
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    place_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<DetailsResult>,
}

#[derive(Debug, Deserialize)]
struct DetailsResult {
    geometry: Option<ResponseGeometry>,
    formatted_address: Option<String>,
    name: Option<String>,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct ResponseGeometry {
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: Option<f64>,
    lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    short_name: Option<String>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Option<ResponseGeometry>,
    formatted_address: Option<String>,
}

fn place_id_from(response: FindPlaceResponse) -> Option<String> {
    if response.status != "OK" {
        return None;
    }
    response.candidates.into_iter().next()?.place_id
}

fn details_from(response: DetailsResponse) -> Option<PlaceDetails> {
    if response.status != "OK" {
        return None;
    }
    let result = response.result?;
    let location = result.geometry?.location?;
    let country_code = result
        .address_components
        .iter()
        .find(|c| c.types.iter().any(|t| t == "country"))
        .and_then(|c| c.short_name.clone());
    Some(PlaceDetails {
        lat: location.lat?,
        lng: location.lng?,
        address: result.formatted_address.unwrap_or_default(),
        name: result.name.filter(|n| !n.is_empty()),
        country_code,
    })
}

fn geocode_details_from(response: GeocodeResponse) -> Option<PlaceDetails> {
    if response.status != "OK" {
        return None;
    }
    let result = response.results.into_iter().next()?;
    let location = result.geometry?.location?;
    Some(PlaceDetails {
        lat: location.lat?,
        lng: location.lng?,
        address: result.formatted_address.unwrap_or_default(),
        name: None,
        country_code: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_id_from_candidates() {
        let response: FindPlaceResponse = serde_json::from_str(
            r#"{"status": "OK", "candidates": [{"place_id": "ChIJabc123"}, {"place_id": "ChIJdef456"}]}"#,
        )
        .unwrap();
        assert_eq!(place_id_from(response), Some("ChIJabc123".to_string()));
    }

    #[test]
    fn test_place_id_zero_results() {
        let response: FindPlaceResponse =
            serde_json::from_str(r#"{"status": "ZERO_RESULTS", "candidates": []}"#).unwrap();
        assert_eq!(place_id_from(response), None);
    }

    #[test]
    fn test_place_id_ok_but_empty() {
        let response: FindPlaceResponse =
            serde_json::from_str(r#"{"status": "OK"}"#).unwrap();
        assert_eq!(place_id_from(response), None);
    }

    #[test]
    fn test_details_extraction() {
        let response: DetailsResponse = serde_json::from_str(
            r#"{
                "status": "OK",
                "result": {
                    "geometry": {"location": {"lat": 52.085, "lng": 4.883}},
                    "formatted_address": "Westdam 59, 3441 GA Woerden, Netherlands",
                    "name": "Westdam 59",
                    "address_components": [
                        {"short_name": "59", "types": ["street_number"]},
                        {"short_name": "NL", "types": ["country", "political"]}
                    ]
                }
            }"#,
        )
        .unwrap();
        let details = details_from(response).unwrap();
        assert_eq!(details.lat, 52.085);
        assert_eq!(details.lng, 4.883);
        assert_eq!(details.address, "Westdam 59, 3441 GA Woerden, Netherlands");
        assert_eq!(details.name.as_deref(), Some("Westdam 59"));
        assert_eq!(details.country_code.as_deref(), Some("NL"));
    }

    #[test]
    fn test_details_missing_geometry() {
        let response: DetailsResponse = serde_json::from_str(
            r#"{"status": "OK", "result": {"formatted_address": "Somewhere"}}"#,
        )
        .unwrap();
        assert_eq!(details_from(response), None);
    }

    #[test]
    fn test_details_denied_status() {
        let response: DetailsResponse = serde_json::from_str(
            r#"{"status": "REQUEST_DENIED", "result": {"geometry": {"location": {"lat": 1.0, "lng": 2.0}}}}"#,
        )
        .unwrap();
        assert_eq!(details_from(response), None);
    }

    #[test]
    fn test_details_without_country_component() {
        let response: DetailsResponse = serde_json::from_str(
            r#"{
                "status": "OK",
                "result": {
                    "geometry": {"location": {"lat": -33.86, "lng": 151.20}},
                    "name": "Somewhere",
                    "address_components": [{"short_name": "NSW", "types": ["administrative_area_level_1"]}]
                }
            }"#,
        )
        .unwrap();
        let details = details_from(response).unwrap();
        assert_eq!(details.country_code, None);
        assert_eq!(details.address, "");
    }

    #[test]
    fn test_geocode_extraction() {
        let response: GeocodeResponse = serde_json::from_str(
            r#"{
                "status": "OK",
                "results": [{
                    "geometry": {"location": {"lat": 48.8584, "lng": 2.2945}},
                    "formatted_address": "Champ de Mars, 75007 Paris, France"
                }]
            }"#,
        )
        .unwrap();
        let details = geocode_details_from(response).unwrap();
        assert_eq!(details.lat, 48.8584);
        assert_eq!(details.lng, 2.2945);
        assert_eq!(details.name, None);
        assert_eq!(details.country_code, None);
    }

    #[test]
    fn test_geocode_zero_results() {
        let response: GeocodeResponse =
            serde_json::from_str(r#"{"status": "ZERO_RESULTS", "results": []}"#).unwrap();
        assert_eq!(geocode_details_from(response), None);
    }
}
