//! Error Types
//!
//! Registry error taxonomy with HTTP status code mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Domain-level errors raised while building value objects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid network id '{0}'")]
    InvalidNetworkId(String),

    #[error("Invalid CIDR block: {0}")]
    InvalidCidr(String),

    #[error("Prefix length /{requested} is outside the pool bounds /{min} to /{max}")]
    PrefixOutOfBounds { requested: u8, min: u8, max: u8 },

    #[error("Invalid address pool: {0}")]
    InvalidPool(String),

    #[error("Invalid page cursor: {0}")]
    InvalidCursor(String),

    #[error("Invalid allocation state: {0}")]
    InvalidState(String),
}

/// Repository-level errors for data access failures
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Data mapping error: {0}")]
    Mapping(String),

    /// The conditional insert was rejected because the block overlaps an active one
    #[error("CIDR block {0} overlaps an active allocation")]
    Overlap(String),

    /// The conditional insert was rejected because the network already holds an active block
    #[error("Network '{0}' already holds an active allocation")]
    DuplicateNetwork(String),
}

/// Use case-level errors surfaced to callers
#[derive(Debug, Error)]
pub enum UseCaseError {
    #[error("Invalid request: {0:?}")]
    InvalidRequest(Vec<String>),

    #[error("{resource} with id '{id}' not found")]
    NotFound { resource: String, id: String },

    #[error("No free /{prefix_len} block left in the address pool")]
    PoolExhausted { prefix_len: u8 },

    #[error("Gave up after {attempts} conflicting commit attempts")]
    ConcurrencyConflict { attempts: u32 },

    #[error("CIDR block {cidr_block} overlaps {existing}")]
    Overlap { cidr_block: String, existing: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Registry store unavailable: {0}")]
    StoreUnavailable(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<RepositoryError> for UseCaseError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Overlap(_) | RepositoryError::DuplicateNetwork(_) => {
                Self::Conflict(err.to_string())
            }
            other => {
                tracing::error!(error = %other, "Registry store failure");
                Self::StoreUnavailable(other.to_string())
            }
        }
    }
}

impl UseCaseError {
    /// Get the HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Domain(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::PoolExhausted { .. } | Self::Overlap { .. } | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::ConcurrencyConflict { .. } | Self::StoreUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    /// Get the error code for this error
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) | Self::Domain(_) => "INVALID_REQUEST",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::PoolExhausted { .. } => "POOL_EXHAUSTED",
            Self::ConcurrencyConflict { .. } => "CONCURRENCY_CONFLICT",
            Self::Overlap { .. } => "CIDR_OVERLAP",
            Self::Conflict(_) => "CONFLICT",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }
}

/// API error response for HTTP responses
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    UseCase(#[from] UseCaseError),
}

/// Error response body structure
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

/// Error detail structure
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-level error for validation errors
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::UseCase(uc_error) = &self;
        let details = if let UseCaseError::InvalidRequest(errors) = uc_error {
            Some(
                errors
                    .iter()
                    .map(|e| {
                        let (field, message) = e.split_once(": ").unwrap_or(("", e));
                        FieldError {
                            field: field.to_string(),
                            message: message.to_string(),
                        }
                    })
                    .collect(),
            )
        } else {
            None
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: uc_error.error_code().to_string(),
                message: uc_error.to_string(),
                details,
            },
            request_id: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (uc_error.status_code(), Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::UseCase(UseCaseError::Domain(err))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    format!(
                        "{}: {}",
                        field,
                        e.message.as_ref().map_or("invalid", |m| m.as_ref())
                    )
                })
            })
            .collect();
        ApiError::UseCase(UseCaseError::InvalidRequest(messages))
    }
}
