use thiserror::Error;
use url::Url;

use crate::types::Coordinates;

const NAVIGATION_BASE: &str = "https://www.google.com/maps/dir/";
const COORDINATE_PARAMS: [&str; 5] = ["q", "query", "ll", "destination", "center"];

/// Reasons a pasted map link cannot yield coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapLinkError {
    #[error("map link is empty")]
    Empty,
    #[error("no coordinates found in map link")]
    Unrecognized,
    #[error("coordinates out of range (lat {lat}, lon {lon})")]
    OutOfRange { lat: f64, lon: f64 },
}

/// Extracts coordinates from a pasted map link.
///
/// Place-data segments (`!3d..!4d..`) are preferred because they point at the
/// pin itself, whereas the `@lat,lon` segment is only the viewport centre.
/// Query parameters and a bare `lat,lon` string are accepted as fallbacks.
pub fn parse_map_link(link: &str) -> Result<Coordinates, MapLinkError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(MapLinkError::Empty);
    }

    let coords = place_data(link)
        .or_else(|| viewport(link))
        .or_else(|| query_param(link))
        .or_else(|| parse_pair(link, false))
        .ok_or(MapLinkError::Unrecognized)?;

    validate(coords)
}

/// Builds a turn-by-turn navigation link to the given coordinates.
pub fn navigation_url(coords: Coordinates) -> String {
    format!(
        "{NAVIGATION_BASE}?api=1&destination={},{}",
        coords.lat, coords.lon
    )
}

fn validate(coords: Coordinates) -> Result<Coordinates, MapLinkError> {
    let Coordinates { lat, lon } = coords;
    if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
        return Err(MapLinkError::OutOfRange { lat, lon });
    }
    Ok(coords)
}

fn place_data(link: &str) -> Option<Coordinates> {
    let lat = number_after(link, "!3d")?;
    let lon = number_after(link, "!4d")?;
    Some(Coordinates { lat, lon })
}

fn viewport(link: &str) -> Option<Coordinates> {
    let (_, rest) = link.split_once('@')?;
    let segment = rest.split(['/', '?', '&']).next()?;
    parse_pair(segment, true)
}

fn query_param(link: &str) -> Option<Coordinates> {
    let url = Url::parse(link).ok()?;
    url.query_pairs()
        .filter(|(key, _)| {
            let key: &str = key;
            COORDINATE_PARAMS.contains(&key)
        })
        .find_map(|(_, value)| parse_pair(&value, false))
}

fn number_after(haystack: &str, marker: &str) -> Option<f64> {
    let start = haystack.find(marker)? + marker.len();
    let tail = &haystack[start..];
    let end = tail
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(tail.len());
    tail[..end].parse().ok()
}

/// Parses `lat,lon`. With `allow_trailing`, extra fields such as a zoom
/// level (`15z`) after the pair are ignored.
fn parse_pair(raw: &str, allow_trailing: bool) -> Option<Coordinates> {
    let mut parts = raw.split(',').map(str::trim);
    let lat = parts.next()?.parse().ok()?;
    let lon = parts.next()?.parse().ok()?;
    if !allow_trailing && parts.next().is_some() {
        return None;
    }
    Some(Coordinates { lat, lon })
}
