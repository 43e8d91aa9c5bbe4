//! Server module for exposing the ledger over HTTP
//!
//! `ServerBuilder` wires a `LedgerStore` and a `CallerResolver` into an axum
//! router with health, ledger and administrative routes.

pub mod builder;
pub mod extractors;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use extractors::{ApiJson, ApiPath, ApiQuery};
pub use handlers::{AppState, CurrentCaller};
