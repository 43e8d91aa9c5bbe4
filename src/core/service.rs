//! Persistence port consumed by the ledger core

use crate::core::error::LedgerResult;
use crate::entities::{Mall, Payment, Store, User};
use async_trait::async_trait;
use uuid::Uuid;

/// Storage backend for the ledger entities
///
/// The core only issues three shapes of request against it: fetch by id,
/// fetch by parent relationship, and create-and-return. Scoping never asks
/// for a wider set and filters it down; it names the exact ids it may see.
///
/// Implementations must apply every pairing write (`create_mall`,
/// `create_store`, `assign_*`) atomically: the entity's pointer and the
/// user back-reference change together or not at all.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // === Users ===

    async fn get_user(&self, id: &Uuid) -> LedgerResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> LedgerResult<Option<User>>;

    /// Fails with `Conflict` when the email is already taken
    async fn create_user(&self, user: User) -> LedgerResult<User>;

    /// Store owned by the user, via the back-reference index
    async fn owned_store_of(&self, user_id: &Uuid) -> LedgerResult<Option<Uuid>>;

    /// Mall managed by the user, via the back-reference index
    async fn managed_mall_of(&self, user_id: &Uuid) -> LedgerResult<Option<Uuid>>;

    // === Malls ===

    async fn get_mall(&self, id: &Uuid) -> LedgerResult<Option<Mall>>;

    async fn list_malls(&self) -> LedgerResult<Vec<Mall>>;

    /// Pairs `mall.manager_id` if set; `NotFound` / `Conflict` on bad manager
    async fn create_mall(&self, mall: Mall) -> LedgerResult<Mall>;

    /// Replace (or clear) the mall's manager
    async fn assign_mall_manager(
        &self,
        mall_id: &Uuid,
        manager_id: Option<Uuid>,
    ) -> LedgerResult<Mall>;

    // === Stores ===

    async fn get_store(&self, id: &Uuid) -> LedgerResult<Option<Store>>;

    async fn stores_of_mall(&self, mall_id: &Uuid) -> LedgerResult<Vec<Store>>;

    /// `NotFound` when the mall or owner is missing, `Conflict` on pairing
    async fn create_store(&self, store: Store) -> LedgerResult<Store>;

    /// Replace (or clear) the store's owner
    async fn assign_store_owner(
        &self,
        store_id: &Uuid,
        owner_id: Option<Uuid>,
    ) -> LedgerResult<Store>;

    // === Payments ===

    async fn get_payment(&self, id: &Uuid) -> LedgerResult<Option<Payment>>;

    async fn list_payments(&self) -> LedgerResult<Vec<Payment>>;

    async fn payments_of_store(&self, store_id: &Uuid) -> LedgerResult<Vec<Payment>>;

    /// `NotFound` when the store or user no longer exists
    async fn create_payment(&self, payment: Payment) -> LedgerResult<Payment>;
}
