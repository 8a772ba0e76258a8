use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use cantata_core::VenueError;
use cantata_storage::{CityError, MutationError, StorageError};

#[derive(Debug, Serialize)]
struct ProblemDetails {
    #[serde(rename = "type")]
    problem_type: &'static str,
    title: &'static str,
    detail: String,
}

/// `application/problem+json` response. Rejected forms surface to the user
/// through this as warnings.
#[derive(Debug)]
pub struct ProblemResponse {
    status: StatusCode,
    body: ProblemDetails,
}

impl ProblemResponse {
    pub fn new<S: Into<String>>(status: StatusCode, problem_type: &'static str, detail: S) -> Self {
        Self {
            status,
            body: ProblemDetails {
                problem_type,
                title: status.canonical_reason().unwrap_or("error"),
                detail: detail.into(),
            },
        }
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn problem_type(&self) -> &'static str {
        self.body.problem_type
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let mut response = Json(self.body).into_response();
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

impl From<VenueError> for ProblemResponse {
    fn from(err: VenueError) -> Self {
        let detail = err.to_string();
        match err {
            VenueError::InvalidMapLink(_) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "invalid_map_link", detail)
            }
            VenueError::MissingCity => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "invalid_city", detail)
            }
            VenueError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "venue_not_found", detail)
            }
        }
    }
}

impl From<StorageError> for ProblemResponse {
    fn from(err: StorageError) -> Self {
        error!(stage = "storage", error = %err, "data file access failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "storage_error",
            "failed to access venue data",
        )
    }
}

impl From<MutationError> for ProblemResponse {
    fn from(err: MutationError) -> Self {
        match err {
            MutationError::Rejected(err) => err.into(),
            MutationError::Storage(err) => err.into(),
        }
    }
}

impl From<CityError> for ProblemResponse {
    fn from(err: CityError) -> Self {
        let detail = err.to_string();
        match err {
            CityError::Empty => Self::new(StatusCode::UNPROCESSABLE_ENTITY, "invalid_city", detail),
            CityError::Duplicate(_) => Self::new(StatusCode::CONFLICT, "duplicate_city", detail),
            CityError::Storage(err) => err.into(),
        }
    }
}
