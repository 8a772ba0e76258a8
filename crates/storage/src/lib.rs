use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;

use cantata_core::{
    venues, Outcome, VenueError, VenueForm, VenueKey, VenueRecord, VenueUpdate, DEFAULT_CITIES,
};

/// Top-level handle that owns the locations of the JSON data files.
#[derive(Clone)]
pub struct Storage {
    venues_path: Arc<PathBuf>,
    cities_path: Arc<PathBuf>,
}

impl Storage {
    /// Creates a handle for the provided files. Nothing is read until a
    /// repository is used; missing files read as their empty defaults.
    pub fn open(venues_path: impl Into<PathBuf>, cities_path: impl Into<PathBuf>) -> Self {
        Self {
            venues_path: Arc::new(venues_path.into()),
            cities_path: Arc::new(cities_path.into()),
        }
    }

    /// Returns a handle for reading and mutating venue records.
    pub fn venues(&self) -> VenueRepository {
        VenueRepository {
            path: self.venues_path.clone(),
        }
    }

    /// Returns a handle for the selectable city catalog.
    pub fn cities(&self) -> CityRepository {
        CityRepository {
            path: self.cities_path.clone(),
        }
    }

    pub fn venues_path(&self) -> &Path {
        &self.venues_path
    }

    pub fn cities_path(&self) -> &Path {
        &self.cities_path
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors returned by list mutations.
#[derive(Debug, Error)]
pub enum MutationError {
    /// The form was rejected; nothing was written.
    #[error(transparent)]
    Rejected(#[from] VenueError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Repository over the venues JSON array.
///
/// Every mutation reads the whole list, applies the change and rewrites the
/// whole file. A rejected change never touches the file.
#[derive(Clone)]
pub struct VenueRepository {
    path: Arc<PathBuf>,
}

impl VenueRepository {
    /// Loads all records in stored order.
    pub async fn list(&self) -> Result<Vec<VenueRecord>, StorageError> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }

    /// Loads all records ordered by performance date.
    pub async fn tour_route(&self) -> Result<Vec<VenueRecord>, StorageError> {
        Ok(venues::tour_route(&self.list().await?))
    }

    pub async fn register(
        &self,
        form: VenueForm,
    ) -> Result<(Outcome, VenueRecord), MutationError> {
        let mut records = self.list().await?;
        let (outcome, record) = venues::register(&mut records, form)?;
        self.persist(&records).await?;
        Ok((outcome, record))
    }

    pub async fn update(&self, update: VenueUpdate) -> Result<VenueRecord, MutationError> {
        let mut records = self.list().await?;
        let record = venues::update(&mut records, update)?;
        self.persist(&records).await?;
        Ok(record)
    }

    pub async fn delete(&self, key: &VenueKey) -> Result<VenueRecord, MutationError> {
        let mut records = self.list().await?;
        let record = venues::delete(&mut records, key)?;
        self.persist(&records).await?;
        Ok(record)
    }

    async fn persist(&self, records: &[VenueRecord]) -> Result<(), StorageError> {
        write_json(&self.path, records).await?;
        debug!(stage = "storage", path = %self.path.display(), count = records.len(), "venues persisted");
        Ok(())
    }
}

/// Reasons a city cannot be added to the catalog.
#[derive(Debug, Error)]
pub enum CityError {
    #[error("city name must not be empty")]
    Empty,
    #[error("city {0} is already listed")]
    Duplicate(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Repository over the selectable city names.
#[derive(Clone)]
pub struct CityRepository {
    path: Arc<PathBuf>,
}

impl CityRepository {
    /// Loads the catalog, falling back to the built-in cities when the file
    /// does not exist yet.
    pub async fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(read_json(&self.path)
            .await?
            .unwrap_or_else(|| DEFAULT_CITIES.iter().map(|city| city.to_string()).collect()))
    }

    /// Appends a city and persists the catalog. Returns the stored name.
    pub async fn add(&self, city: &str) -> Result<String, CityError> {
        let name = city.trim();
        if name.is_empty() {
            return Err(CityError::Empty);
        }

        let mut cities = self.list().await?;
        if cities.iter().any(|existing| existing == name) {
            return Err(CityError::Duplicate(name.to_string()));
        }
        cities.push(name.to_string());
        write_json(&self.path, &cities).await?;
        Ok(name.to_string())
    }
}

async fn read_json<T>(path: &Path) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
{
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    // An empty or whitespace-only file is treated like a missing one.
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes `value` to a sibling temp file and renames it over `path`.
async fn write_json<T>(path: &Path, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
{
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let body = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let written = match tokio::fs::write(&tmp_path, body).await {
        Ok(()) => tokio::fs::rename(&tmp_path, path).await,
        Err(err) => Err(err),
    };
    if let Err(source) = written {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(io_err(source));
    }
    Ok(())
}
