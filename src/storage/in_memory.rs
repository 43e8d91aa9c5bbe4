//! In-memory implementation of LedgerStore for testing and development

use crate::core::error::{LedgerError, LedgerResult};
use crate::core::service::LedgerStore;
use crate::entities::{Mall, OneToOne, PairingConflict, Payment, Store, User};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    emails: HashMap<String, Uuid>,
    malls: HashMap<Uuid, Mall>,
    stores: HashMap<Uuid, Store>,
    payments: HashMap<Uuid, Payment>,
    store_owners: OneToOne,
    mall_managers: OneToOne,
}

impl Tables {
    fn require_user(&self, id: &Uuid) -> LedgerResult<()> {
        if self.users.contains_key(id) {
            Ok(())
        } else {
            Err(LedgerError::not_found("user", *id))
        }
    }
}

/// In-memory ledger store
///
/// Useful for testing and development. All tables sit behind one `RwLock`,
/// so a pairing write updates the entity row and the back-reference index
/// in a single critical section.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryLedgerStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| LedgerError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| LedgerError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

fn sorted_by_creation<T, F>(mut rows: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (chrono::DateTime<chrono::Utc>, Uuid),
{
    rows.sort_by_key(|row| key(row));
    rows
}

fn pairing_conflict(kind: &str, conflict: PairingConflict) -> LedgerError {
    LedgerError::conflict(format!(
        "user '{}' already {} '{}'",
        conflict.user_id, kind, conflict.paired_with
    ))
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn get_user(&self, id: &Uuid) -> LedgerResult<Option<User>> {
        Ok(self.read()?.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> LedgerResult<Option<User>> {
        let tables = self.read()?;
        let key = email.trim().to_lowercase();
        Ok(tables
            .emails
            .get(&key)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn create_user(&self, user: User) -> LedgerResult<User> {
        let mut tables = self.write()?;

        let key = user.email_key();
        if tables.emails.contains_key(&key) {
            return Err(LedgerError::conflict(format!(
                "email '{}' is already registered",
                key
            )));
        }

        tables.emails.insert(key, user.id);
        tables.users.insert(user.id, user.clone());

        tracing::debug!(user_id = %user.id, role = %user.role, "user stored");
        Ok(user)
    }

    async fn owned_store_of(&self, user_id: &Uuid) -> LedgerResult<Option<Uuid>> {
        Ok(self.read()?.store_owners.entity_of(user_id))
    }

    async fn managed_mall_of(&self, user_id: &Uuid) -> LedgerResult<Option<Uuid>> {
        Ok(self.read()?.mall_managers.entity_of(user_id))
    }

    async fn get_mall(&self, id: &Uuid) -> LedgerResult<Option<Mall>> {
        Ok(self.read()?.malls.get(id).cloned())
    }

    async fn list_malls(&self) -> LedgerResult<Vec<Mall>> {
        let malls: Vec<Mall> = self.read()?.malls.values().cloned().collect();
        Ok(sorted_by_creation(malls, |m: &Mall| (m.created_at, m.id)))
    }

    async fn create_mall(&self, mall: Mall) -> LedgerResult<Mall> {
        let mut tables = self.write()?;

        if let Some(manager_id) = &mall.manager_id {
            tables.require_user(manager_id)?;
        }
        tables
            .mall_managers
            .pair(mall.id, mall.manager_id)
            .map_err(|c| pairing_conflict("manages mall", c))?;
        tables.malls.insert(mall.id, mall.clone());

        tracing::debug!(mall_id = %mall.id, "mall stored");
        Ok(mall)
    }

    async fn assign_mall_manager(
        &self,
        mall_id: &Uuid,
        manager_id: Option<Uuid>,
    ) -> LedgerResult<Mall> {
        let mut tables = self.write()?;
        let tables = &mut *tables;

        let mall = tables
            .malls
            .get_mut(mall_id)
            .ok_or_else(|| LedgerError::not_found("mall", *mall_id))?;
        if let Some(manager_id) = &manager_id {
            if !tables.users.contains_key(manager_id) {
                return Err(LedgerError::not_found("user", *manager_id));
            }
        }

        let released = tables
            .mall_managers
            .pair(*mall_id, manager_id)
            .map_err(|c| pairing_conflict("manages mall", c))?;
        mall.manager_id = manager_id;
        mall.touch();

        if let Some(released) = released {
            tracing::debug!(mall_id = %mall_id, user_id = %released, "previous manager released");
        }
        Ok(mall.clone())
    }

    async fn get_store(&self, id: &Uuid) -> LedgerResult<Option<Store>> {
        Ok(self.read()?.stores.get(id).cloned())
    }

    async fn stores_of_mall(&self, mall_id: &Uuid) -> LedgerResult<Vec<Store>> {
        let stores: Vec<Store> = self
            .read()?
            .stores
            .values()
            .filter(|store| &store.mall_id == mall_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(stores, |s: &Store| (s.created_at, s.id)))
    }

    async fn create_store(&self, store: Store) -> LedgerResult<Store> {
        let mut tables = self.write()?;

        if !tables.malls.contains_key(&store.mall_id) {
            return Err(LedgerError::not_found("mall", store.mall_id));
        }
        if let Some(owner_id) = &store.owner_id {
            tables.require_user(owner_id)?;
        }
        tables
            .store_owners
            .pair(store.id, store.owner_id)
            .map_err(|c| pairing_conflict("owns store", c))?;
        tables.stores.insert(store.id, store.clone());

        tracing::debug!(store_id = %store.id, mall_id = %store.mall_id, "store stored");
        Ok(store)
    }

    async fn assign_store_owner(
        &self,
        store_id: &Uuid,
        owner_id: Option<Uuid>,
    ) -> LedgerResult<Store> {
        let mut tables = self.write()?;
        let tables = &mut *tables;

        let store = tables
            .stores
            .get_mut(store_id)
            .ok_or_else(|| LedgerError::not_found("store", *store_id))?;
        if let Some(owner_id) = &owner_id {
            if !tables.users.contains_key(owner_id) {
                return Err(LedgerError::not_found("user", *owner_id));
            }
        }

        let released = tables
            .store_owners
            .pair(*store_id, owner_id)
            .map_err(|c| pairing_conflict("owns store", c))?;
        store.owner_id = owner_id;
        store.touch();

        if let Some(released) = released {
            tracing::debug!(store_id = %store_id, user_id = %released, "previous owner released");
        }
        Ok(store.clone())
    }

    async fn get_payment(&self, id: &Uuid) -> LedgerResult<Option<Payment>> {
        Ok(self.read()?.payments.get(id).cloned())
    }

    async fn list_payments(&self) -> LedgerResult<Vec<Payment>> {
        let payments: Vec<Payment> = self.read()?.payments.values().cloned().collect();
        Ok(sorted_by_creation(payments, |p: &Payment| (p.created_at, p.id)))
    }

    async fn payments_of_store(&self, store_id: &Uuid) -> LedgerResult<Vec<Payment>> {
        let payments: Vec<Payment> = self
            .read()?
            .payments
            .values()
            .filter(|payment| &payment.store_id == store_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(payments, |p: &Payment| (p.created_at, p.id)))
    }

    async fn create_payment(&self, payment: Payment) -> LedgerResult<Payment> {
        let mut tables = self.write()?;

        if !tables.stores.contains_key(&payment.store_id) {
            return Err(LedgerError::not_found("store", payment.store_id));
        }
        tables.require_user(&payment.user_id)?;
        if tables.payments.contains_key(&payment.id) {
            return Err(LedgerError::conflict(format!(
                "payment '{}' already exists",
                payment.id
            )));
        }

        tables.payments.insert(payment.id, payment.clone());

        tracing::debug!(payment_id = %payment.id, store_id = %payment.store_id, "payment stored");
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::money::Amount;
    use crate::entities::Role;

    fn user(name: &str, role: Role) -> User {
        User::new(
            name.to_string(),
            format!("{}@example.com", name.to_lowercase()),
            role,
        )
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let store = InMemoryLedgerStore::new();
        let alice = store.create_user(user("Alice", Role::StoreOwner)).await.unwrap();

        let fetched = store.get_user(&alice.id).await.unwrap();
        assert_eq!(fetched, Some(alice.clone()));

        let by_email = store.find_user_by_email("ALICE@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(alice.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = InMemoryLedgerStore::new();
        store.create_user(user("Alice", Role::StoreOwner)).await.unwrap();

        let mut twin = user("Alice", Role::Manager);
        twin.email = "Alice@Example.com".to_string();
        let err = store.create_user(twin).await.unwrap_err();
        assert!(matches!(err, LedgerError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_create_store_requires_existing_mall() {
        let store = InMemoryLedgerStore::new();
        let orphan = Store::new("Orphan".to_string(), Amount::zero(), Uuid::new_v4(), None);

        let err = store.create_store(orphan).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { entity_type: "mall", .. }));
    }

    #[tokio::test]
    async fn test_store_owner_pairing_is_bidirectional() {
        let store = InMemoryLedgerStore::new();
        let alice = store.create_user(user("Alice", Role::StoreOwner)).await.unwrap();
        let mall = store.create_mall(Mall::new("City".to_string(), None)).await.unwrap();
        let boutique = store
            .create_store(Store::new(
                "Boutique".to_string(),
                Amount::from_units(2500),
                mall.id,
                Some(alice.id),
            ))
            .await
            .unwrap();

        assert_eq!(store.owned_store_of(&alice.id).await.unwrap(), Some(boutique.id));

        // Alice cannot take a second store
        let second = store
            .create_store(Store::new(
                "Second".to_string(),
                Amount::zero(),
                mall.id,
                Some(alice.id),
            ))
            .await
            .unwrap_err();
        assert!(matches!(second, LedgerError::Conflict { .. }));
        assert_eq!(store.stores_of_mall(&mall.id).await.unwrap().len(), 1);

        // Releasing the store clears Alice's back-reference as well
        let released = store.assign_store_owner(&boutique.id, None).await.unwrap();
        assert_eq!(released.owner_id, None);
        assert_eq!(store.owned_store_of(&alice.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reassigning_owner_releases_previous_owner() {
        let store = InMemoryLedgerStore::new();
        let alice = store.create_user(user("Alice", Role::StoreOwner)).await.unwrap();
        let bob = store.create_user(user("Bob", Role::StoreOwner)).await.unwrap();
        let mall = store.create_mall(Mall::new("City".to_string(), None)).await.unwrap();
        let shop = store
            .create_store(Store::new("Shop".to_string(), Amount::zero(), mall.id, Some(alice.id)))
            .await
            .unwrap();

        let shop = store.assign_store_owner(&shop.id, Some(bob.id)).await.unwrap();

        assert_eq!(shop.owner_id, Some(bob.id));
        assert_eq!(store.owned_store_of(&bob.id).await.unwrap(), Some(shop.id));
        assert_eq!(store.owned_store_of(&alice.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_assignment_changes_nothing() {
        let store = InMemoryLedgerStore::new();
        let alice = store.create_user(user("Alice", Role::StoreOwner)).await.unwrap();
        let mall = store.create_mall(Mall::new("City".to_string(), None)).await.unwrap();
        let first = store
            .create_store(Store::new("First".to_string(), Amount::zero(), mall.id, Some(alice.id)))
            .await
            .unwrap();
        let second = store
            .create_store(Store::new("Second".to_string(), Amount::zero(), mall.id, None))
            .await
            .unwrap();

        let err = store
            .assign_store_owner(&second.id, Some(alice.id))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict { .. }));

        let second = store.get_store(&second.id).await.unwrap().unwrap();
        assert_eq!(second.owner_id, None);
        assert_eq!(store.owned_store_of(&alice.id).await.unwrap(), Some(first.id));
    }

    #[tokio::test]
    async fn test_mall_manager_pairing() {
        let store = InMemoryLedgerStore::new();
        let john = store.create_user(user("John", Role::Manager)).await.unwrap();
        let city = store
            .create_mall(Mall::new("City".to_string(), Some(john.id)))
            .await
            .unwrap();

        assert_eq!(store.managed_mall_of(&john.id).await.unwrap(), Some(city.id));

        // One mall per manager
        let err = store
            .create_mall(Mall::new("Harbor".to_string(), Some(john.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict { .. }));
        assert_eq!(store.list_malls().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_assign_unknown_user_is_not_found() {
        let store = InMemoryLedgerStore::new();
        let mall = store.create_mall(Mall::new("City".to_string(), None)).await.unwrap();

        let err = store
            .assign_mall_manager(&mall.id, Some(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { entity_type: "user", .. }));
    }

    #[tokio::test]
    async fn test_payments_of_store_only_returns_that_store() {
        let store = InMemoryLedgerStore::new();
        let alice = store.create_user(user("Alice", Role::StoreOwner)).await.unwrap();
        let mall = store.create_mall(Mall::new("City".to_string(), None)).await.unwrap();
        let a = store
            .create_store(Store::new("A".to_string(), Amount::zero(), mall.id, Some(alice.id)))
            .await
            .unwrap();
        let b = store
            .create_store(Store::new("B".to_string(), Amount::zero(), mall.id, None))
            .await
            .unwrap();

        store
            .create_payment(Payment::new(Amount::from_units(10), a.id, alice.id))
            .await
            .unwrap();
        store
            .create_payment(Payment::new(Amount::from_units(20), b.id, alice.id))
            .await
            .unwrap();

        let of_a = store.payments_of_store(&a.id).await.unwrap();
        assert_eq!(of_a.len(), 1);
        assert_eq!(of_a[0].store_id, a.id);
        assert_eq!(store.list_payments().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_payment_requires_store_and_user() {
        let store = InMemoryLedgerStore::new();
        let err = store
            .create_payment(Payment::new(Amount::from_units(1), Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { entity_type: "store", .. }));
    }
}
