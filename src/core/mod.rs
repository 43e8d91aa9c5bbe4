//! Core module containing fundamental traits and types for the ledger

pub mod caller;
pub mod entity;
pub mod error;
pub mod money;
pub mod service;

pub use caller::{Caller, CallerResolver, Capability, HeaderCallerResolver};
pub use entity::Entity;
pub use error::{ErrorResponse, LedgerError, LedgerResult};
pub use money::{Amount, AmountFormatError};
pub use service::LedgerStore;
