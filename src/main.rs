use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod convert;
mod maps_url;
mod places;
mod types;

pub use types::*;

pub const PLACES_API_URL: &str = "https://maps.googleapis.com/maps/api/place";
pub const GEOCODE_API_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Pause between consecutive API requests to stay under per-second quotas
pub const REQUEST_DELAY: Duration = Duration::from_millis(200);
/// Default cap on API requests per run (Find Place + Place Details + Geocoding)
pub const DEFAULT_REQUEST_LIMIT: u32 = 1000;

#[derive(Parser)]
#[command(name = "saved-places")]
#[command(about = "Convert a saved-places CSV export to GeoJSON via the Google Places API")]
struct Cli {
    /// Input CSV with Title and URL columns (e.g. a Takeout saved-places export)
    input: PathBuf,

    /// Output GeoJSON file (defaults to the input path with a .geojson extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum API requests for this run
    #[arg(long, default_value_t = DEFAULT_REQUEST_LIMIT)]
    request_limit: u32,

    /// Quiet mode - suppress per-row progress output
    #[arg(short, long)]
    quiet: bool,
}

/// Read the Places API key from the environment.
///
/// Either variable name works; the key needs the Places API and Geocoding
/// API enabled in the Google Cloud console.
fn get_api_key() -> Result<String> {
    std::env::var("GOOGLE_PLACES_API_KEY")
        .or_else(|_| std::env::var("GOOGLE_MAPS_API_KEY"))
        .context(
            "GOOGLE_PLACES_API_KEY or GOOGLE_MAPS_API_KEY environment variable must be set \
             (enable 'Places API' and 'Geocoding API' for the key)",
        )
}

/// Default output path: the input path with a .geojson extension.
fn default_output_path(input: &Path) -> PathBuf {
    let mut out = input.to_path_buf();
    out.set_extension("geojson");
    out
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let api_key = get_api_key()?;
    let output = cli
        .output
        .unwrap_or_else(|| default_output_path(&cli.input));

    convert::run_convert(&cli.input, &output, &api_key, cli.request_limit, cli.quiet)
}
