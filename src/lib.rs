//! # malltrack
//!
//! A role-scoped ledger for a three-level commercial hierarchy: malls
//! contain stores, stores receive rent payments.
//!
//! ## Features
//!
//! - **Access Scoping**: every read is narrowed to the caller's own mall or
//!   store by id selection, never by hiding rows after the fact
//! - **Payment Ownership**: store owners may only record their own payments
//!   against their own store
//! - **Monthly Revenue**: exact fixed-point rollups bucketed by UTC month
//! - **Consistent Pairings**: store owners and mall managers are 1:1 and
//!   maintained as one relation with a back-reference index
//! - **REST Exposure**: an axum router with health checks, scoped reads and
//!   administrative writes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use malltrack::prelude::*;
//!
//! let store = Arc::new(InMemoryLedgerStore::new());
//! let ledger = Ledger::new(store.clone());
//!
//! let caller = Caller::store_owner(alice_id, Some(boutique_id));
//! let payments = ledger.list_visible_payments(&caller, None).await?;
//! let revenue = ledger.monthly_revenue(&caller, 2024, None).await?;
//!
//! ServerBuilder::new()
//!     .with_shared_store(store)
//!     .serve("127.0.0.1:3000")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod ledger;
pub mod payments;
pub mod revenue;
pub mod scope;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        caller::{Caller, CallerResolver, Capability, HeaderCallerResolver, USER_ID_HEADER},
        entity::Entity,
        error::{ErrorResponse, LedgerError, LedgerResult},
        money::Amount,
        service::LedgerStore,
    };

    // === Entities ===
    pub use crate::entities::{Mall, OneToOne, Payment, Role, Store, User};
    pub use crate::impl_ledger_entity;

    // === Operations ===
    pub use crate::ledger::{Identity, Ledger, NewMall, NewStore, NewUser};
    pub use crate::payments::{PaymentRequest, PaymentValidator};
    pub use crate::revenue::{MonthlyRevenue, aggregate_monthly};
    pub use crate::scope::ScopeEngine;

    // === Storage ===
    pub use crate::storage::InMemoryLedgerStore;

    // === Config ===
    pub use crate::config::{LedgerConfig, LoggingConfig, SeedConfig, ServerConfig};

    // === Server ===
    pub use crate::server::{AppState, CurrentCaller, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
    pub use uuid::Uuid;
}
