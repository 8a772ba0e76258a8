//! Domain layer for the tour admin service.
//!
//! Holds the venue record model and the pure list operations behind the
//! register/update/delete forms. Persistence and HTTP live in other crates.
pub mod i18n;
pub mod maplink;
pub mod types;
pub mod venues;

pub use maplink::{navigation_url, parse_map_link, MapLinkError};
pub use types::{
    Coordinates, Outcome, VenueForm, VenueKey, VenueKind, VenueRecord, VenueUpdate,
    DEFAULT_CITIES,
};
pub use venues::VenueError;
