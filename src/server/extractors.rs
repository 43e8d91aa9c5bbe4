//! Request extractors that reject with the ledger's error envelope
//!
//! axum's own `Json`, `Query` and `Path` reject with plain-text bodies.
//! These wrappers run the same extraction and turn the rejection into a
//! [`LedgerError::Validation`] so every failure carries `{code, message}`.

use axum::extract::{FromRequest, FromRequestParts, Path, Query};

use crate::core::error::LedgerError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(LedgerError))]
pub struct ApiJson<T>(pub T);

/// Query string parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(LedgerError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(LedgerError))]
pub struct ApiPath<T>(pub T);
