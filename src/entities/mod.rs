//! Domain entities: users, malls, stores and payments
//!
//! The hierarchy is Mall → Store → Payment. Every relationship pointer
//! lives on exactly one side:
//!
//! - `Store::mall_id` (required) and `Payment::store_id` (required) point up
//!   the hierarchy; the reverse direction is a by-parent fetch.
//! - `Store::owner_id` and `Mall::manager_id` are the only record of the
//!   user pairings. The user side is a back-reference index kept by the
//!   storage layer (see [`OneToOne`]), so the two sides cannot drift.

pub mod macros;
pub mod relation;

pub use relation::{OneToOne, PairingConflict};

use crate::core::money::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    StoreOwner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::StoreOwner => "STORE_OWNER",
        };
        f.write_str(label)
    }
}

crate::impl_ledger_entity!(
    /// A user account
    User,
    "user",
    {
        name: String,
        /// Unique (case-insensitive) login email
        email: String,
        role: Role,
    }
);

crate::impl_ledger_entity!(
    /// A mall, optionally managed by one user
    Mall,
    "mall",
    {
        name: String,
        manager_id: Option<Uuid>,
    }
);

crate::impl_ledger_entity!(
    /// A store inside exactly one mall, optionally owned by one user
    Store,
    "store",
    {
        name: String,
        /// Monthly rent, never negative
        rent_amount: Amount,
        mall_id: Uuid,
        owner_id: Option<Uuid>,
    }
);

crate::impl_ledger_entity!(
    /// A rent payment made against a store by a user
    ///
    /// Immutable once recorded; `created_at` is authoritative for revenue
    /// bucketing.
    Payment,
    "payment",
    {
        /// Always strictly positive
        amount: Amount,
        store_id: Uuid,
        user_id: Uuid,
    }
);

impl User {
    /// Email normalised for uniqueness checks
    pub fn email_key(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

impl Payment {
    /// Build a payment with an explicit creation time
    ///
    /// Used when importing historical records; live payments go through
    /// [`Payment::new`].
    pub fn recorded_at(
        amount: Amount,
        store_id: Uuid,
        user_id: Uuid,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at,
            updated_at: created_at,
            amount,
            store_id,
            user_id,
        }
    }
}
