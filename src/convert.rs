//! The conversion run: read rows, enrich each one, write the collection.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::maps_url::{place_name_from_url, place_ref_from_url};
use crate::places::{PlaceDetails, PlacesClient};
use crate::types::{Feature, FeatureCollection, Geometry, Location, Properties, SavedPlace};

const UNLOCATED_COMMENT: &str = "No location information is available for this saved place";

/// Caps total API calls for a run; every find/details/geocode call draws one.
pub struct RequestBudget {
    used: u32,
    limit: u32,
}

impl RequestBudget {
    pub fn new(limit: u32) -> Self {
        Self { used: 0, limit }
    }

    /// Claim one request if any remain.
    pub fn try_acquire(&mut self) -> bool {
        if self.used < self.limit {
            self.used += 1;
            true
        } else {
            false
        }
    }

    pub fn used(&self) -> u32 {
        self.used
    }
}

/// Read and filter the CSV rows.
///
/// Values are trimmed; rows with neither a title nor a URL are dropped.
pub fn read_rows<R: std::io::Read>(reader: R) -> Result<Vec<SavedPlace>> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize() {
        let raw: SavedPlace = record.context("Failed to parse CSV row")?;
        let row = SavedPlace {
            title: raw.title.trim().to_string(),
            url: raw.url.trim().to_string(),
        };
        if row.title.is_empty() && row.url.is_empty() {
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Two-step Places lookup with a Geocoding fallback, all drawing on the
/// budget. Returns None once the budget runs out or nothing matched.
fn lookup(
    client: &PlacesClient,
    budget: &mut RequestBudget,
    query: &str,
    limit_reached: &mut bool,
) -> Result<Option<PlaceDetails>> {
    if !budget.try_acquire() {
        *limit_reached = true;
        return Ok(None);
    }
    if let Some(place_id) = client.find_place_id(query)? {
        if !budget.try_acquire() {
            *limit_reached = true;
            return Ok(None);
        }
        if let Some(details) = client.place_details(&place_id)? {
            return Ok(Some(details));
        }
    }
    if !budget.try_acquire() {
        *limit_reached = true;
        return Ok(None);
    }
    client.geocode(query)
}

/// quote_plus-style encoding for the fallback maps search URL.
fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// One GeoJSON Feature per row.
///
/// Rows the lookup could not locate get placeholder [0, 0] coordinates and
/// an explanatory comment instead of an address.
fn build_feature(row: &SavedPlace, details: Option<PlaceDetails>, date: &str) -> Feature {
    match details {
        Some(details) => {
            let google_maps_url = if row.url.is_empty() {
                format!("http://maps.google.com/?q={}", urlencode(&row.title))
            } else {
                row.url.clone()
            };
            Feature {
                geometry: Geometry::Point {
                    coordinates: [details.lng, details.lat],
                },
                properties: Properties {
                    date: date.to_string(),
                    google_maps_url,
                    name: Some(details.name.unwrap_or_else(|| row.title.clone())),
                    location: Some(Location {
                        address: details.address,
                        country_code: details.country_code,
                    }),
                    comment: None,
                },
            }
        }
        None => Feature {
            geometry: Geometry::Point {
                coordinates: [0.0, 0.0],
            },
            properties: Properties {
                date: date.to_string(),
                google_maps_url: row.url.clone(),
                name: (!row.title.is_empty()).then(|| row.title.clone()),
                location: None,
                comment: Some(UNLOCATED_COMMENT.to_string()),
            },
        },
    }
}

/// Create an OSC8 terminal hyperlink to a local file.
fn file_link(path: &Path) -> String {
    let name = path.display().to_string();
    let abs = fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string();
    format!("\x1b]8;;file://{}\x1b\\{}\x1b]8;;\x1b\\", abs, name)
}

/// Run the whole conversion.
pub fn run_convert(
    input: &Path,
    output: &Path,
    api_key: &str,
    request_limit: u32,
    quiet: bool,
) -> Result<()> {
    let file = fs::File::open(input)
        .with_context(|| format!("Failed to open input CSV: {}", input.display()))?;
    let rows = read_rows(file)?;

    let client = PlacesClient::new(api_key)?;
    let mut budget = RequestBudget::new(request_limit);
    // One timestamp for the whole run
    let date = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    let total = rows.len();
    let mut features = Vec::with_capacity(total);
    let mut located = 0usize;
    let mut limit_reached = false;

    for (i, row) in rows.iter().enumerate() {
        let label = if row.title.is_empty() {
            &row.url
        } else {
            &row.title
        };
        if !quiet {
            println!("[{}/{}] {}", i + 1, total, label);
        }

        let query = place_name_from_url(&row.url).unwrap_or_else(|| row.title.clone());
        let details = if query.is_empty() {
            // Some share links carry only the feature token, no usable text.
            if !quiet {
                match place_ref_from_url(&row.url) {
                    Some(place_ref) => {
                        eprintln!("  No text query for {}, leaving unlocated", place_ref)
                    }
                    None => eprintln!("  No title or place name, leaving unlocated"),
                }
            }
            None
        } else {
            lookup(&client, &mut budget, &query, &mut limit_reached)?
        };

        if details.is_some() {
            located += 1;
        }
        features.push(build_feature(row, details, &date));
    }

    let collection = FeatureCollection { features };
    let mut json = serde_json::to_string_pretty(&collection)?;
    json.push('\n');
    fs::write(output, json).with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} features to {} ({} located, {} unlocated)",
        total,
        file_link(output),
        located,
        total - located
    );
    if limit_reached {
        println!(
            "API request limit reached ({} requests, max {}). Remaining rows have no location data.",
            budget.used(),
            request_limit
        );
    }
    Ok(())
}
