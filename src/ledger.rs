//! The ledger facade
//!
//! [`Ledger`] is the single entry point transports call into. It wires the
//! scoping engine, the payment validator and the revenue aggregator over one
//! [`LedgerStore`], and adds the administrative write operations that
//! maintain the mall/store hierarchy and its user pairings.

use crate::core::caller::{Caller, Capability};
use crate::core::error::{LedgerError, LedgerResult};
use crate::core::money::Amount;
use crate::core::service::LedgerStore;
use crate::entities::{Mall, Payment, Role, Store, User};
use crate::payments::validator::amount_text;
use crate::payments::{PaymentRequest, PaymentValidator};
use crate::revenue::{MonthlyRevenue, aggregate_monthly};
use crate::scope::ScopeEngine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Input for [`Ledger::create_user`]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "email is not a valid address"))]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// Input for [`Ledger::create_mall`]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMall {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub manager_id: Option<Uuid>,
}

/// Input for [`Ledger::create_store`]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewStore {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    /// Decimal text; JSON and YAML numbers are accepted as written
    #[serde(deserialize_with = "amount_text")]
    #[validate(custom(function = "validate_rent"))]
    pub rent_amount: String,
    pub mall_id: Uuid,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
}

fn validate_rent(text: &str) -> Result<(), ValidationError> {
    match Amount::parse(text) {
        Ok(amount) if amount.is_negative() => Err(ValidationError::new("negative_rent")
            .with_message("rent must not be negative".into())),
        Ok(_) => Ok(()),
        Err(e) => Err(ValidationError::new("malformed_rent").with_message(e.to_string().into())),
    }
}

/// The caller as the ledger sees it, with its pairings resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub user: User,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_store: Option<Store>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_mall: Option<Mall>,
}

/// Role-scoped access to malls, stores, payments and revenue
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    scope: ScopeEngine,
    payments: PaymentValidator,
}

impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            scope: ScopeEngine::new(store.clone()),
            payments: PaymentValidator::new(store.clone()),
            store,
        }
    }

    /// The backing store
    pub fn store(&self) -> Arc<dyn LedgerStore> {
        self.store.clone()
    }

    // Reads

    pub async fn list_visible_malls(&self, caller: &Caller) -> LedgerResult<Vec<Mall>> {
        let malls = self.scope.visible_malls(caller).await?;
        tracing::debug!(user_id = %caller.user_id, count = malls.len(), "malls listed");
        Ok(malls)
    }

    pub async fn get_visible_mall(&self, caller: &Caller, mall_id: &Uuid) -> LedgerResult<Mall> {
        self.scope.visible_mall(caller, mall_id).await
    }

    pub async fn list_visible_stores(
        &self,
        caller: &Caller,
        mall_id: &Uuid,
    ) -> LedgerResult<Vec<Store>> {
        let stores = self.scope.visible_stores(caller, mall_id).await?;
        tracing::debug!(
            user_id = %caller.user_id,
            mall_id = %mall_id,
            count = stores.len(),
            "stores listed"
        );
        Ok(stores)
    }

    pub async fn get_visible_store(&self, caller: &Caller, store_id: &Uuid) -> LedgerResult<Store> {
        self.scope.visible_store(caller, store_id).await
    }

    /// Payments visible to the caller, newest first
    pub async fn list_visible_payments(
        &self,
        caller: &Caller,
        store_id: Option<&Uuid>,
    ) -> LedgerResult<Vec<Payment>> {
        self.scope.visible_payments(caller, store_id).await
    }

    pub async fn get_visible_payment(
        &self,
        caller: &Caller,
        payment_id: &Uuid,
    ) -> LedgerResult<Payment> {
        self.scope.visible_payment(caller, payment_id).await
    }

    /// Monthly revenue of `year` over the caller's scope
    ///
    /// The aggregator only ever sees the caller's scoped payments, so
    /// `available_years` cannot reveal activity outside that scope.
    pub async fn monthly_revenue(
        &self,
        caller: &Caller,
        year: i32,
        store_id: Option<&Uuid>,
    ) -> LedgerResult<MonthlyRevenue> {
        let payments = self.scope.visible_payments(caller, store_id).await?;
        let revenue = aggregate_monthly(&payments, year)?;

        tracing::debug!(
            user_id = %caller.user_id,
            year,
            payments = payments.len(),
            total = %revenue.total,
            "monthly revenue computed"
        );
        Ok(revenue)
    }

    /// The caller's own account with its owned store or managed mall
    pub async fn who_am_i(&self, caller: &Caller) -> LedgerResult<Identity> {
        let user = self
            .store
            .get_user(&caller.user_id)
            .await?
            .ok_or_else(|| LedgerError::unauthorized("unknown caller"))?;

        let (owned_store, managed_mall) = match caller.capability {
            Capability::Admin => (None, None),
            Capability::Manager { managed_mall_id } => {
                let mall = match managed_mall_id {
                    Some(id) => self.store.get_mall(&id).await?,
                    None => None,
                };
                (None, mall)
            }
            Capability::StoreOwner { owned_store_id } => {
                let store = match owned_store_id {
                    Some(id) => self.store.get_store(&id).await?,
                    None => None,
                };
                (store, None)
            }
        };

        Ok(Identity {
            role: caller.role(),
            user,
            owned_store,
            managed_mall,
        })
    }

    // Writes

    /// Record a payment; the only way a payment enters the ledger
    pub async fn create_payment(
        &self,
        caller: &Caller,
        request: &PaymentRequest,
    ) -> LedgerResult<Payment> {
        self.payments.create(caller, request).await
    }

    /// Record a historical payment with its original creation time
    pub async fn import_payment(
        &self,
        caller: &Caller,
        request: &PaymentRequest,
        created_at: DateTime<Utc>,
    ) -> LedgerResult<Payment> {
        self.scope.require_admin(caller, "import payment")?;
        self.payments.import(caller, request, created_at).await
    }

    pub async fn create_user(&self, caller: &Caller, input: NewUser) -> LedgerResult<User> {
        self.scope.require_admin(caller, "create user")?;
        input.validate()?;

        let user = self
            .store
            .create_user(User::new(input.name, input.email.trim().to_string(), input.role))
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    pub async fn create_mall(&self, caller: &Caller, input: NewMall) -> LedgerResult<Mall> {
        self.scope.require_admin(caller, "create mall")?;
        input.validate()?;
        if let Some(manager_id) = &input.manager_id {
            self.require_role(manager_id, Role::Manager, "manager_id").await?;
        }

        let mall = self
            .store
            .create_mall(Mall::new(input.name, input.manager_id))
            .await?;

        tracing::info!(mall_id = %mall.id, manager_id = ?mall.manager_id, "mall created");
        Ok(mall)
    }

    pub async fn create_store(&self, caller: &Caller, input: NewStore) -> LedgerResult<Store> {
        self.scope.require_admin(caller, "create store")?;
        input.validate()?;
        let rent = Amount::parse(&input.rent_amount)?;
        if let Some(owner_id) = &input.owner_id {
            self.require_role(owner_id, Role::StoreOwner, "owner_id").await?;
        }

        let store = self
            .store
            .create_store(Store::new(input.name, rent, input.mall_id, input.owner_id))
            .await?;

        tracing::info!(
            store_id = %store.id,
            mall_id = %store.mall_id,
            owner_id = ?store.owner_id,
            "store created"
        );
        Ok(store)
    }

    /// Pair a store with an owner, or release it with `None`
    pub async fn assign_store_owner(
        &self,
        caller: &Caller,
        store_id: &Uuid,
        owner_id: Option<Uuid>,
    ) -> LedgerResult<Store> {
        self.scope.require_admin(caller, "assign store owner")?;
        if let Some(owner_id) = &owner_id {
            self.require_role(owner_id, Role::StoreOwner, "owner_id").await?;
        }

        let store = self.store.assign_store_owner(store_id, owner_id).await?;
        tracing::info!(store_id = %store.id, owner_id = ?store.owner_id, "store owner assigned");
        Ok(store)
    }

    /// Pair a mall with a manager, or release it with `None`
    pub async fn assign_mall_manager(
        &self,
        caller: &Caller,
        mall_id: &Uuid,
        manager_id: Option<Uuid>,
    ) -> LedgerResult<Mall> {
        self.scope.require_admin(caller, "assign mall manager")?;
        if let Some(manager_id) = &manager_id {
            self.require_role(manager_id, Role::Manager, "manager_id").await?;
        }

        let mall = self.store.assign_mall_manager(mall_id, manager_id).await?;
        tracing::info!(mall_id = %mall.id, manager_id = ?mall.manager_id, "mall manager assigned");
        Ok(mall)
    }

    async fn require_role(&self, user_id: &Uuid, role: Role, field: &str) -> LedgerResult<()> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("user", *user_id))?;
        if user.role == role {
            return Ok(());
        }

        Err(LedgerError::invalid_field(
            field,
            format!("user '{}' must have role {}", user_id, role),
        ))
    }
}
