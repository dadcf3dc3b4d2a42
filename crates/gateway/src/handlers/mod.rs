//! API handlers module

pub mod agent;
pub mod chat;
pub mod code;
pub mod documents;
pub mod health;
pub mod rag;
pub mod reasoning;

use axum::extract::OriginalUri;
use reasonforge_common::errors::{AppError, Result};
use validator::Validate;

/// Validate a request body, naming the first offending field
pub(crate) fn validate_request<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(|e| AppError::Validation {
        field: e.field_errors().keys().next().map(|k| k.to_string()),
        message: e.to_string(),
    })
}

/// Fallback for unmatched routes
pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound {
        resource_type: "route".to_string(),
        id: uri.path().to_string(),
    }
}
