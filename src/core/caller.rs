//! Caller identity and capability
//!
//! A [`Caller`] is the resolved identity a core operation executes under.
//! It is built once per request by the identity context (see
//! [`CallerResolver`]) and passed explicitly into every call; the core never
//! reads ambient session state.
//!
//! The caller's role is carried as a closed [`Capability`] variant together
//! with the single entity reference that role is scoped to, so every scoping
//! decision is an exhaustive `match` rather than a role-string comparison.

use crate::core::error::LedgerError;
use crate::core::service::LedgerStore;
use crate::entities::{Role, User};
use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// What a caller is entitled to, by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    /// Unrestricted read/write
    Admin,

    /// Scoped to one managed mall, if any
    Manager { managed_mall_id: Option<Uuid> },

    /// Scoped to one owned store, if any
    StoreOwner { owned_store_id: Option<Uuid> },
}

impl Capability {
    pub fn role(&self) -> Role {
        match self {
            Capability::Admin => Role::Admin,
            Capability::Manager { .. } => Role::Manager,
            Capability::StoreOwner { .. } => Role::StoreOwner,
        }
    }
}

/// The authenticated caller of a core operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub capability: Capability,
}

impl Caller {
    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            capability: Capability::Admin,
        }
    }

    pub fn manager(user_id: Uuid, managed_mall_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            capability: Capability::Manager { managed_mall_id },
        }
    }

    pub fn store_owner(user_id: Uuid, owned_store_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            capability: Capability::StoreOwner { owned_store_id },
        }
    }

    /// Build a caller from a user and its pre-resolved pairings
    ///
    /// References that do not apply to the user's role are dropped: a
    /// manager's capability never carries a store and vice versa.
    pub fn from_user(
        user: &User,
        owned_store_id: Option<Uuid>,
        managed_mall_id: Option<Uuid>,
    ) -> Self {
        match user.role {
            Role::Admin => Self::admin(user.id),
            Role::Manager => Self::manager(user.id, managed_mall_id),
            Role::StoreOwner => Self::store_owner(user.id, owned_store_id),
        }
    }

    pub fn role(&self) -> Role {
        self.capability.role()
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.capability, Capability::Admin)
    }
}

/// Header carrying the authenticated user id, set by the upstream gateway
pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolves the caller of an HTTP request
///
/// Implementations sit at the identity-context boundary: they turn whatever
/// the transport carries into a [`Caller`], or reject the request with
/// [`LedgerError::Unauthorized`] before any core operation runs.
#[async_trait]
pub trait CallerResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Caller, LedgerError>;
}

/// Resolver trusting an `x-user-id` header set by an authenticating proxy
///
/// The user is looked up in the ledger store and its owned store / managed
/// mall are resolved through the pairing index.
pub struct HeaderCallerResolver {
    store: Arc<dyn LedgerStore>,
}

impl HeaderCallerResolver {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CallerResolver for HeaderCallerResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Caller, LedgerError> {
        let raw = headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| LedgerError::unauthorized("missing caller identity"))?;

        let user_id = raw
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| LedgerError::unauthorized("malformed caller identity"))?;

        let user = self
            .store
            .get_user(&user_id)
            .await?
            .ok_or_else(|| LedgerError::unauthorized("unknown caller"))?;

        let owned_store_id = self.store.owned_store_of(&user.id).await?;
        let managed_mall_id = self.store.managed_mall_of(&user.id).await?;

        Ok(Caller::from_user(&user, owned_store_id, managed_mall_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User::new("Alice".to_string(), "alice@example.com".to_string(), role)
    }

    #[test]
    fn test_from_user_keeps_only_role_relevant_reference() {
        let store_id = Uuid::new_v4();
        let mall_id = Uuid::new_v4();

        let owner = user(Role::StoreOwner);
        let caller = Caller::from_user(&owner, Some(store_id), Some(mall_id));
        assert_eq!(
            caller.capability,
            Capability::StoreOwner {
                owned_store_id: Some(store_id)
            }
        );

        let manager = user(Role::Manager);
        let caller = Caller::from_user(&manager, Some(store_id), Some(mall_id));
        assert_eq!(
            caller.capability,
            Capability::Manager {
                managed_mall_id: Some(mall_id)
            }
        );

        let admin = user(Role::Admin);
        let caller = Caller::from_user(&admin, Some(store_id), Some(mall_id));
        assert_eq!(caller.capability, Capability::Admin);
        assert!(caller.is_admin());
    }

    #[test]
    fn test_role_round_trips_through_capability() {
        let id = Uuid::new_v4();
        assert_eq!(Caller::admin(id).role(), Role::Admin);
        assert_eq!(Caller::manager(id, None).role(), Role::Manager);
        assert_eq!(Caller::store_owner(id, None).role(), Role::StoreOwner);
    }

    #[test]
    fn test_caller_serializes_flat() {
        let id = Uuid::new_v4();
        let store_id = Uuid::new_v4();
        let json = serde_json::to_value(Caller::store_owner(id, Some(store_id))).unwrap();

        assert_eq!(json["user_id"], id.to_string());
        assert_eq!(json["role"], "STORE_OWNER");
        assert_eq!(json["owned_store_id"], store_id.to_string());
    }
}
