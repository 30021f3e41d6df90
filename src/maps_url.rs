//! Helpers for pulling usable bits out of Google Maps share URLs.

use once_cell::sync::Lazy;
use regex::Regex;

static PLACE_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!1s(0x[0-9a-fA-F]+:0x[0-9a-fA-F]+)").unwrap());

/// Decoded place name from the `/place/<name>` segment of a maps URL.
///
/// Share links carry the display name in the path (e.g. "Westdam+59"),
/// which is usually a more accurate text query than the row title.
pub fn place_name_from_url(url: &str) -> Option<String> {
    let path = url.split('?').next().unwrap_or(url);
    if !path.contains("/place/") {
        return None;
    }
    let part = path.rsplit("/place/").next()?;
    let part = part.split("/data=").next().unwrap_or(part);
    let name = part.replace('+', " ").trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// The `0x…:0x…` feature token from the `!1s` parameter of a maps URL,
/// if present. Some share links carry only this token and no usable text.
pub fn place_ref_from_url(url: &str) -> Option<&str> {
    if !url.contains("google.com/maps") {
        return None;
    }
    PLACE_REF_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
