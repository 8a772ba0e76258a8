use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::maplink::{navigation_url, parse_map_link, MapLinkError};
use crate::types::{Outcome, VenueForm, VenueKey, VenueRecord, VenueUpdate};

/// A form operation that was rejected. The list is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VenueError {
    #[error("invalid map link: {0}")]
    InvalidMapLink(#[from] MapLinkError),
    #[error("city must not be empty")]
    MissingCity,
    #[error("no venue registered for {city} on {date}")]
    NotFound { city: String, date: NaiveDate },
}

impl VenueError {
    fn not_found(key: &VenueKey) -> Self {
        Self::NotFound {
            city: key.city.trim().to_string(),
            date: key.date,
        }
    }
}

/// Returns the position of the record identified by `key`.
pub fn position(records: &[VenueRecord], key: &VenueKey) -> Option<usize> {
    records.iter().position(|record| record.matches(key))
}

/// Registers a venue from a submitted form.
///
/// A new record with a fresh id is appended unless `(city, date)` is already
/// taken, in which case that record is overwritten in place and keeps its id.
pub fn register(
    records: &mut Vec<VenueRecord>,
    form: VenueForm,
) -> Result<(Outcome, VenueRecord), VenueError> {
    let key = form.key();
    if key.city.is_empty() {
        return Err(VenueError::MissingCity);
    }
    let coords = parse_map_link(&form.map_link)?;

    let mut record = VenueRecord {
        id: String::new(),
        city: key.city,
        date: key.date,
        venue: form.venue.trim().to_string(),
        seats: form.seats,
        kind: form.kind,
        note: form.note,
        lat: coords.lat,
        lon: coords.lon,
        nav_url: navigation_url(coords),
    };

    match position(records, &record.key()) {
        Some(index) => {
            record.id = records[index].id.clone();
            records[index] = record.clone();
            Ok((Outcome::Updated, record))
        }
        None => {
            record.id = Uuid::new_v4().to_string();
            records.push(record.clone());
            Ok((Outcome::Registered, record))
        }
    }
}

/// Overwrites the supplied fields of an existing record.
pub fn update(records: &mut [VenueRecord], update: VenueUpdate) -> Result<VenueRecord, VenueError> {
    let key = update.key();
    let index = position(records, &key).ok_or_else(|| VenueError::not_found(&key))?;

    let coords = match update.map_link.as_deref() {
        Some(link) => Some(parse_map_link(link)?),
        None => None,
    };

    let record = &mut records[index];
    if let Some(venue) = update.venue {
        record.venue = venue.trim().to_string();
    }
    if let Some(seats) = update.seats {
        record.seats = seats;
    }
    if let Some(kind) = update.kind {
        record.kind = kind;
    }
    if let Some(note) = update.note {
        record.note = note;
    }
    if let Some(coords) = coords {
        record.lat = coords.lat;
        record.lon = coords.lon;
    }
    record.nav_url = navigation_url(record.coordinates());

    Ok(record.clone())
}

/// Removes the record identified by `key` and returns it.
pub fn delete(records: &mut Vec<VenueRecord>, key: &VenueKey) -> Result<VenueRecord, VenueError> {
    let index = position(records, key).ok_or_else(|| VenueError::not_found(key))?;
    Ok(records.remove(index))
}

/// Records in performance order. Same-day stops keep their stored order.
pub fn tour_route(records: &[VenueRecord]) -> Vec<VenueRecord> {
    let mut route = records.to_vec();
    route.sort_by_key(|record| record.date);
    route
}
