//! Access scoping engine
//!
//! Decides which malls, stores and payments a [`Caller`] may observe.
//! Scoping is an id-equality selection, never a post-hoc hide: for a scoped
//! caller the engine only ever asks the store for the caller's own mall or
//! store (and their children), so rows outside the scope are not fetched in
//! the first place.
//!
//! | capability           | malls            | stores              | payments              |
//! |----------------------|------------------|---------------------|-----------------------|
//! | Admin                | all              | all                 | all                   |
//! | Manager(Some(m))     | `m`              | stores of `m`       | payments of those     |
//! | Manager(None)        | empty            | empty               | empty                 |
//! | StoreOwner(Some(s))  | forbidden        | `s`                 | payments of `s`       |
//! | StoreOwner(None)     | forbidden        | no associated store | no associated store   |

use crate::core::caller::{Caller, Capability};
use crate::core::error::{LedgerError, LedgerResult};
use crate::core::service::LedgerStore;
use crate::entities::{Mall, Payment, Store};
use futures::future::try_join_all;
use std::sync::Arc;
use uuid::Uuid;

const OUT_OF_SCOPE: &str = "requested resource is outside the caller's scope";

/// Role-scoped read access over the ledger
#[derive(Clone)]
pub struct ScopeEngine {
    store: Arc<dyn LedgerStore>,
}

impl ScopeEngine {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Malls the caller may list
    pub async fn visible_malls(&self, caller: &Caller) -> LedgerResult<Vec<Mall>> {
        match caller.capability {
            Capability::Admin => self.store.list_malls().await,
            Capability::Manager {
                managed_mall_id: Some(mall_id),
            } => Ok(self.store.get_mall(&mall_id).await?.into_iter().collect()),
            Capability::Manager {
                managed_mall_id: None,
            } => Ok(Vec::new()),
            Capability::StoreOwner { .. } => Err(deny(caller, "mall listing")),
        }
    }

    /// A single mall, if the caller may see it
    pub async fn visible_mall(&self, caller: &Caller, mall_id: &Uuid) -> LedgerResult<Mall> {
        match caller.capability {
            Capability::Admin => self
                .store
                .get_mall(mall_id)
                .await?
                .ok_or_else(|| LedgerError::not_found("mall", *mall_id)),
            Capability::Manager {
                managed_mall_id: Some(managed),
            } if managed == *mall_id => self
                .store
                .get_mall(&managed)
                .await?
                .ok_or_else(|| deny(caller, "mall")),
            Capability::Manager { .. } | Capability::StoreOwner { .. } => {
                Err(deny(caller, "mall"))
            }
        }
    }

    /// Stores of `mall_id` the caller may list
    ///
    /// A manager without a mall gets an empty list; a store owner without a
    /// store gets [`LedgerError::NoAssociatedStore`].
    pub async fn visible_stores(&self, caller: &Caller, mall_id: &Uuid) -> LedgerResult<Vec<Store>> {
        match caller.capability {
            Capability::Admin => {
                if self.store.get_mall(mall_id).await?.is_none() {
                    return Err(LedgerError::not_found("mall", *mall_id));
                }
                self.store.stores_of_mall(mall_id).await
            }
            Capability::Manager {
                managed_mall_id: None,
            } => Ok(Vec::new()),
            Capability::Manager {
                managed_mall_id: Some(managed),
            } => {
                if managed != *mall_id {
                    return Err(deny(caller, "mall"));
                }
                self.store.stores_of_mall(&managed).await
            }
            Capability::StoreOwner { owned_store_id } => {
                let store = self.owned_store(caller, owned_store_id).await?;
                if store.mall_id != *mall_id {
                    return Err(deny(caller, "mall"));
                }
                Ok(vec![store])
            }
        }
    }

    /// A single store, if the caller may see it
    pub async fn visible_store(&self, caller: &Caller, store_id: &Uuid) -> LedgerResult<Store> {
        match caller.capability {
            Capability::Admin => self
                .store
                .get_store(store_id)
                .await?
                .ok_or_else(|| LedgerError::not_found("store", *store_id)),
            Capability::Manager {
                managed_mall_id: None,
            } => Err(deny(caller, "store")),
            Capability::Manager {
                managed_mall_id: Some(managed),
            } => self
                .store
                .stores_of_mall(&managed)
                .await?
                .into_iter()
                .find(|store| store.id == *store_id)
                .ok_or_else(|| deny(caller, "store")),
            Capability::StoreOwner { owned_store_id } => {
                if owned_store_id.is_some_and(|owned| owned != *store_id) {
                    return Err(deny(caller, "store"));
                }
                self.owned_store(caller, owned_store_id).await
            }
        }
    }

    /// Payments the caller may see, newest first
    ///
    /// With `store_id` the result is narrowed to that store, which must
    /// itself be visible to the caller. Without it, the caller's whole scope
    /// is returned.
    pub async fn visible_payments(
        &self,
        caller: &Caller,
        store_id: Option<&Uuid>,
    ) -> LedgerResult<Vec<Payment>> {
        let mut payments = match (caller.capability, store_id) {
            (Capability::Admin, None) => self.store.list_payments().await?,
            (Capability::Admin, Some(store_id)) => {
                if self.store.get_store(store_id).await?.is_none() {
                    return Err(LedgerError::not_found("store", *store_id));
                }
                self.store.payments_of_store(store_id).await?
            }
            (
                Capability::Manager {
                    managed_mall_id: None,
                },
                _,
            ) => Vec::new(),
            (
                Capability::Manager {
                    managed_mall_id: Some(managed),
                },
                requested,
            ) => {
                let stores = self.store.stores_of_mall(&managed).await?;
                let selected: Vec<Uuid> = match requested {
                    Some(store_id) => {
                        if !stores.iter().any(|store| store.id == *store_id) {
                            return Err(deny(caller, "store"));
                        }
                        vec![*store_id]
                    }
                    None => stores.iter().map(|store| store.id).collect(),
                };
                self.payments_of_stores(&selected).await?
            }
            (Capability::StoreOwner { owned_store_id }, requested) => {
                let Some(owned) = owned_store_id else {
                    return Err(LedgerError::NoAssociatedStore {
                        user_id: caller.user_id,
                    });
                };
                if requested.is_some_and(|store_id| *store_id != owned) {
                    return Err(deny(caller, "store"));
                }
                self.store.payments_of_store(&owned).await?
            }
        };

        newest_first(&mut payments);
        tracing::debug!(
            user_id = %caller.user_id,
            role = %caller.role(),
            count = payments.len(),
            "payments scoped"
        );
        Ok(payments)
    }

    /// A single payment, if it lies inside the caller's scope
    pub async fn visible_payment(&self, caller: &Caller, payment_id: &Uuid) -> LedgerResult<Payment> {
        if caller.is_admin() {
            return self
                .store
                .get_payment(payment_id)
                .await?
                .ok_or_else(|| LedgerError::not_found("payment", *payment_id));
        }

        self.visible_payments(caller, None)
            .await?
            .into_iter()
            .find(|payment| payment.id == *payment_id)
            .ok_or_else(|| deny(caller, "payment"))
    }

    /// Reject any administrative mutation from a non-admin caller
    pub fn require_admin(&self, caller: &Caller, action: &str) -> LedgerResult<()> {
        match caller.capability {
            Capability::Admin => Ok(()),
            Capability::Manager { .. } | Capability::StoreOwner { .. } => Err(deny(caller, action)),
        }
    }

    async fn owned_store(&self, caller: &Caller, owned_store_id: Option<Uuid>) -> LedgerResult<Store> {
        let owned = owned_store_id.ok_or(LedgerError::NoAssociatedStore {
            user_id: caller.user_id,
        })?;
        // A dangling reference means the identity context is stale; deny.
        self.store
            .get_store(&owned)
            .await?
            .ok_or_else(|| deny(caller, "store"))
    }

    async fn payments_of_stores(&self, store_ids: &[Uuid]) -> LedgerResult<Vec<Payment>> {
        let batches = try_join_all(
            store_ids
                .iter()
                .map(|store_id| self.store.payments_of_store(store_id)),
        )
        .await?;
        Ok(batches.into_iter().flatten().collect())
    }
}

fn newest_first(payments: &mut [Payment]) {
    payments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

fn deny(caller: &Caller, resource: &str) -> LedgerError {
    tracing::warn!(
        user_id = %caller.user_id,
        role = %caller.role(),
        resource,
        "access denied"
    );
    LedgerError::forbidden(OUT_OF_SCOPE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::money::Amount;
    use crate::entities::{Role, User};
    use crate::storage::InMemoryLedgerStore;
    use chrono::{Duration, Utc};

    struct Fixture {
        engine: ScopeEngine,
        store: Arc<InMemoryLedgerStore>,
        mall: Mall,
        shop: Store,
        owner: User,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryLedgerStore::new());
        let owner = store
            .create_user(User::new(
                "Alice".to_string(),
                "alice@example.com".to_string(),
                Role::StoreOwner,
            ))
            .await
            .unwrap();
        let mall = store.create_mall(Mall::new("City".to_string(), None)).await.unwrap();
        let shop = store
            .create_store(Store::new(
                "Boutique".to_string(),
                Amount::from_units(2500),
                mall.id,
                Some(owner.id),
            ))
            .await
            .unwrap();

        Fixture {
            engine: ScopeEngine::new(store.clone()),
            store,
            mall,
            shop,
            owner,
        }
    }

    #[tokio::test]
    async fn test_store_owner_cannot_list_malls() {
        let f = fixture().await;
        let caller = Caller::store_owner(f.owner.id, Some(f.shop.id));

        let err = f.engine.visible_malls(&caller).await.unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_manager_without_mall_sees_empty_lists() {
        let f = fixture().await;
        let caller = Caller::manager(Uuid::new_v4(), None);

        assert!(f.engine.visible_malls(&caller).await.unwrap().is_empty());
        assert!(f.engine.visible_stores(&caller, &f.mall.id).await.unwrap().is_empty());
        assert!(f.engine.visible_payments(&caller, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_owner_without_store_gets_no_associated_store() {
        let f = fixture().await;
        let caller = Caller::store_owner(Uuid::new_v4(), None);

        let err = f.engine.visible_stores(&caller, &f.mall.id).await.unwrap_err();
        assert!(matches!(err, LedgerError::NoAssociatedStore { .. }));

        let err = f.engine.visible_payments(&caller, None).await.unwrap_err();
        assert!(matches!(err, LedgerError::NoAssociatedStore { .. }));
    }

    #[tokio::test]
    async fn test_store_owner_sees_only_own_store_in_mall() {
        let f = fixture().await;
        f.store
            .create_store(Store::new("Other".to_string(), Amount::zero(), f.mall.id, None))
            .await
            .unwrap();
        let caller = Caller::store_owner(f.owner.id, Some(f.shop.id));

        let stores = f.engine.visible_stores(&caller, &f.mall.id).await.unwrap();
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].id, f.shop.id);

        let err = f
            .engine
            .visible_stores(&caller, &Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_admin_missing_mall_is_not_found() {
        let f = fixture().await;
        let caller = Caller::admin(Uuid::new_v4());

        let err = f
            .engine
            .visible_stores(&caller, &Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { entity_type: "mall", .. }));
    }

    #[tokio::test]
    async fn test_scoped_missing_store_is_forbidden_not_not_found() {
        let f = fixture().await;
        let manager = Caller::manager(Uuid::new_v4(), Some(f.mall.id));

        let err = f
            .engine
            .visible_store(&manager, &Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_payments_are_newest_first() {
        let f = fixture().await;
        let now = Utc::now();
        for days in [30, 1, 10] {
            f.store
                .create_payment(Payment::recorded_at(
                    Amount::from_units(100),
                    f.shop.id,
                    f.owner.id,
                    now - Duration::days(days),
                ))
                .await
                .unwrap();
        }
        let caller = Caller::store_owner(f.owner.id, Some(f.shop.id));

        let payments = f.engine.visible_payments(&caller, None).await.unwrap();
        assert_eq!(payments.len(), 3);
        assert!(payments.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_require_admin() {
        let f = fixture().await;
        assert!(f.engine.require_admin(&Caller::admin(Uuid::new_v4()), "create mall").is_ok());

        let err = f
            .engine
            .require_admin(&Caller::manager(Uuid::new_v4(), Some(f.mall.id)), "create mall")
            .unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden { .. }));
    }
}
