//! Seed data declared in the configuration file
//!
//! Entities reference each other by user email and mall/store name, so a
//! seed file never has to spell out ids. Everything is applied through the
//! [`Ledger`] as a system administrator, so pairing and validation rules are
//! the same as for live administrative writes.

use crate::core::caller::Caller;
use crate::entities::Role;
use crate::ledger::{Ledger, NewMall, NewStore, NewUser};
use crate::payments::PaymentRequest;
use crate::payments::validator::amount_text;
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedMall {
    pub name: String,
    /// Email of the managing user
    #[serde(default)]
    pub manager: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedStore {
    pub name: String,
    /// Name of the containing mall
    pub mall: String,
    #[serde(deserialize_with = "amount_text")]
    pub rent_amount: String,
    /// Email of the owning user
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPayment {
    /// Name of the store paid for
    pub store: String,
    /// Email of the paying user
    pub payer: String,
    #[serde(deserialize_with = "amount_text")]
    pub amount: String,
    /// Historical creation time; defaults to the time of seeding
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Users, malls, stores and payments to load at startup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub malls: Vec<SeedMall>,
    #[serde(default)]
    pub stores: Vec<SeedStore>,
    #[serde(default)]
    pub payments: Vec<SeedPayment>,
}

/// Number of entities created by [`SeedConfig::apply`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub malls: usize,
    pub stores: usize,
    pub payments: usize,
}

impl SeedConfig {
    /// Create every declared entity, in dependency order
    pub async fn apply(&self, ledger: &Ledger) -> Result<SeedReport> {
        let system = Caller::admin(Uuid::nil());
        let mut users = HashMap::new();
        let mut malls = HashMap::new();
        let mut stores = HashMap::new();

        for seed in &self.users {
            let user = ledger
                .create_user(
                    &system,
                    NewUser {
                        name: seed.name.clone(),
                        email: seed.email.clone(),
                        role: seed.role,
                    },
                )
                .await
                .with_context(|| format!("seeding user {}", seed.email))?;
            users.insert(user.email_key(), user.id);
        }

        for seed in &self.malls {
            if malls.contains_key(&seed.name) {
                bail!("mall name '{}' is declared twice", seed.name);
            }
            let manager_id = seed
                .manager
                .as_deref()
                .map(|email| lookup(&users, &email.trim().to_lowercase(), "user"))
                .transpose()?;
            let mall = ledger
                .create_mall(
                    &system,
                    NewMall {
                        name: seed.name.clone(),
                        manager_id,
                    },
                )
                .await
                .with_context(|| format!("seeding mall {}", seed.name))?;
            malls.insert(seed.name.clone(), mall.id);
        }

        for seed in &self.stores {
            if stores.contains_key(&seed.name) {
                bail!("store name '{}' is declared twice", seed.name);
            }
            let mall_id = lookup(&malls, &seed.mall, "mall")?;
            let owner_id = seed
                .owner
                .as_deref()
                .map(|email| lookup(&users, &email.trim().to_lowercase(), "user"))
                .transpose()?;
            let store = ledger
                .create_store(
                    &system,
                    NewStore {
                        name: seed.name.clone(),
                        rent_amount: seed.rent_amount.clone(),
                        mall_id,
                        owner_id,
                    },
                )
                .await
                .with_context(|| format!("seeding store {}", seed.name))?;
            stores.insert(seed.name.clone(), store.id);
        }

        for seed in &self.payments {
            let request = PaymentRequest::new(
                seed.amount.clone(),
                lookup(&stores, &seed.store, "store")?,
                lookup(&users, &seed.payer.trim().to_lowercase(), "user")?,
            );
            let created_at = seed.created_at.unwrap_or_else(Utc::now);
            ledger
                .import_payment(&system, &request, created_at)
                .await
                .with_context(|| format!("seeding payment for store {}", seed.store))?;
        }

        let report = SeedReport {
            users: self.users.len(),
            malls: self.malls.len(),
            stores: self.stores.len(),
            payments: self.payments.len(),
        };
        tracing::info!(
            users = report.users,
            malls = report.malls,
            stores = report.stores,
            payments = report.payments,
            "seed data applied"
        );
        Ok(report)
    }
}

fn lookup(index: &HashMap<String, Uuid>, key: &str, kind: &str) -> Result<Uuid> {
    index
        .get(key)
        .copied()
        .ok_or_else(|| anyhow!("seed references unknown {} '{}'", kind, key))
}
