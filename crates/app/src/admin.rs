use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::problem::ProblemResponse;

pub const ADMIN_HEADER: &str = "x-admin-password";

/// Guards the editing routes behind the configured admin password.
#[derive(Clone)]
pub struct AdminGate {
    password: Option<Arc<[u8]>>,
}

impl AdminGate {
    pub fn new(password: Option<String>) -> Self {
        Self {
            password: password.map(|value| Arc::from(value.into_bytes().into_boxed_slice())),
        }
    }

    /// Returns `true` when no password is configured.
    pub fn is_open(&self) -> bool {
        self.password.is_none()
    }

    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), ProblemResponse> {
        let Some(expected) = &self.password else {
            return Ok(());
        };

        let provided = headers
            .get(ADMIN_HEADER)
            .map(|value| value.as_bytes())
            .ok_or_else(|| {
                ProblemResponse::new(
                    StatusCode::UNAUTHORIZED,
                    "admin_required",
                    format!("missing header {ADMIN_HEADER}"),
                )
            })?;

        if expected.ct_eq(provided).into() {
            Ok(())
        } else {
            warn!(stage = "admin", "rejected admin password");
            Err(ProblemResponse::new(
                StatusCode::FORBIDDEN,
                "admin_denied",
                "admin password mismatch",
            ))
        }
    }
}
