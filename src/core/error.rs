//! Typed error handling for the ledger core
//!
//! Every core operation returns [`LedgerError`] so callers can branch on the
//! exact failure instead of inspecting strings. All variants are terminal to
//! the request: nothing inside the core retries.
//!
//! # Error Categories
//!
//! - `Forbidden`: role or ownership mismatch; the message never names an
//!   out-of-scope entity
//! - `NoAssociatedStore`: a store-scoped account with no linked store
//! - `NotFound`: a referenced id does not exist
//! - `InvalidAmount`: malformed or non-positive money
//! - `Conflict`: a one-to-one pairing or uniqueness violation
//! - `Validation`: field-level input errors on administrative writes
//! - `Unauthorized`: the identity context could not resolve a caller
//!
//! # Example
//!
//! ```rust,ignore
//! match ledger.list_visible_stores(&caller, mall_id).await {
//!     Ok(stores) => render(stores),
//!     Err(LedgerError::NoAssociatedStore { .. }) => ask_admin_to_link_store(),
//!     Err(e) => return Err(e),
//! }
//! ```

use crate::core::money::AmountFormatError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Convenience alias used throughout the core
pub type LedgerResult<T> = Result<T, LedgerError>;

/// The error type of every core operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Access denied: {message}")]
    Forbidden { message: String },

    #[error("User '{user_id}' has no associated store")]
    NoAssociatedStore { user_id: Uuid },

    #[error("{entity_type} with id '{id}' not found")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Invalid amount '{value}': {reason}")]
    InvalidAmount { value: String, reason: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Validation failed")]
    Validation { fields: BTreeMap<String, Vec<String>> },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LedgerError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        LedgerError::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(entity_type: &'static str, id: Uuid) -> Self {
        LedgerError::NotFound { entity_type, id }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        LedgerError::Conflict {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        LedgerError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        LedgerError::Storage {
            message: message.into(),
        }
    }

    pub fn invalid_amount(value: impl Into<String>, reason: impl Into<String>) -> Self {
        LedgerError::InvalidAmount {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// A single-field validation failure
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), vec![message.into()]);
        LedgerError::Validation { fields }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::Forbidden { .. } => StatusCode::FORBIDDEN,
            LedgerError::NoAssociatedStore { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
            LedgerError::InvalidAmount { .. } => StatusCode::BAD_REQUEST,
            LedgerError::Conflict { .. } => StatusCode::CONFLICT,
            LedgerError::Validation { .. } => StatusCode::BAD_REQUEST,
            LedgerError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            LedgerError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::Forbidden { .. } => "FORBIDDEN",
            LedgerError::NoAssociatedStore { .. } => "NO_ASSOCIATED_STORE",
            LedgerError::NotFound { .. } => "NOT_FOUND",
            LedgerError::InvalidAmount { .. } => "INVALID_AMOUNT",
            LedgerError::Conflict { .. } => "CONFLICT",
            LedgerError::Validation { .. } => "VALIDATION_ERROR",
            LedgerError::Unauthorized { .. } => "UNAUTHORIZED",
            LedgerError::Storage { .. } => "STORAGE_ERROR",
            LedgerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            LedgerError::NotFound { entity_type, id } => Some(serde_json::json!({
                "entity_type": entity_type,
                "id": id.to_string()
            })),
            LedgerError::Validation { fields } => Some(serde_json::json!({ "fields": fields })),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for LedgerError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        LedgerError::Validation { fields }
    }
}

impl From<AmountFormatError> for LedgerError {
    fn from(err: AmountFormatError) -> Self {
        LedgerError::InvalidAmount {
            value: String::new(),
            reason: err.to_string(),
        }
    }
}

impl From<JsonRejection> for LedgerError {
    fn from(rejection: JsonRejection) -> Self {
        LedgerError::invalid_field("body", rejection.body_text())
    }
}

impl From<QueryRejection> for LedgerError {
    fn from(rejection: QueryRejection) -> Self {
        LedgerError::invalid_field("query", rejection.body_text())
    }
}

impl From<PathRejection> for LedgerError {
    fn from(rejection: PathRejection) -> Self {
        LedgerError::invalid_field("path", rejection.body_text())
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}
