use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

/// Cities offered by the panel when no catalog file exists yet.
pub const DEFAULT_CITIES: [&str; 4] = ["Mumbai", "Pune", "Nagpur", "Nashik"];

/// One stored tour stop, persisted as an element of the venues JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueRecord {
    pub id: String,
    pub city: String,
    pub date: NaiveDate,
    pub venue: String,
    pub seats: u32,
    #[serde(rename = "type")]
    pub kind: VenueKind,
    #[serde(default)]
    pub note: String,
    pub lat: f64,
    pub lon: f64,
    pub nav_url: String,
}

impl VenueRecord {
    /// Returns `true` when the record is identified by `key`.
    pub fn matches(&self, key: &VenueKey) -> bool {
        self.date == key.date && self.city.trim() == key.city.trim()
    }

    pub fn key(&self) -> VenueKey {
        VenueKey {
            city: self.city.clone(),
            date: self.date,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

/// Whether a venue is under a roof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    #[default]
    Indoor,
    Outdoor,
}

impl FromStr for VenueKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "indoor" => Ok(Self::Indoor),
            "outdoor" => Ok(Self::Outdoor),
            other => Err(format!("unknown venue type '{other}'")),
        }
    }
}

/// Identity of a record. Lookups never use the generated id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueKey {
    pub city: String,
    pub date: NaiveDate,
}

impl VenueKey {
    pub fn new(city: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            city: city.into(),
            date,
        }
    }
}

/// Submitted register form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueForm {
    pub city: String,
    pub date: NaiveDate,
    pub venue: String,
    #[serde(default)]
    pub seats: u32,
    #[serde(rename = "type", default)]
    pub kind: VenueKind,
    #[serde(default)]
    pub note: String,
    pub map_link: String,
}

impl VenueForm {
    pub fn key(&self) -> VenueKey {
        VenueKey::new(self.city.trim(), self.date)
    }
}

/// Submitted update form. Absent fields keep their stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueUpdate {
    pub city: String,
    pub date: NaiveDate,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub venue: Option<String>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub seats: Option<u32>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<VenueKind>,
    /// Unlike the other fields, a blank note clears the stored one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub map_link: Option<String>,
}

/// Browser forms submit every input, so an empty or whitespace-only value
/// means "leave unchanged" rather than a new value.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(D::Error::custom),
    }
}

impl VenueUpdate {
    /// An update that touches nothing but re-derives the navigation link.
    pub fn for_key(key: VenueKey) -> Self {
        Self {
            city: key.city,
            date: key.date,
            venue: None,
            seats: None,
            kind: None,
            note: None,
            map_link: None,
        }
    }

    pub fn key(&self) -> VenueKey {
        VenueKey::new(self.city.trim(), self.date)
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Result of a successful list mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Registered,
    Updated,
    Deleted,
}
