//! Shared fixture for integration tests
//!
//! Mall M1 has store S1 (owner U1) and S2 (owner U2) and is managed by
//! Maria. Mall M2 has store S3 (owner U3). Payments:
//!
//! | store | amount | created (UTC) |
//! |-------|--------|---------------|
//! | S1    | 2500   | 2024-01-15    |
//! | S2    | 3500   | 2024-02-10    |
//! | S1    | 2500   | 2024-03-01    |
//! | S3    | 900    | 2023-11-20    |

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use malltrack::prelude::*;

pub struct Scenario {
    pub ledger: Ledger,
    pub store: Arc<InMemoryLedgerStore>,
    pub admin_user: User,
    pub maria: User,
    pub u1: User,
    pub u2: User,
    pub u3: User,
    pub m1: Mall,
    pub m2: Mall,
    pub s1: Store,
    pub s2: Store,
    pub s3: Store,
    pub s1_january: Payment,
    pub s2_february: Payment,
    pub s1_march: Payment,
    pub s3_november: Payment,
}

impl Scenario {
    pub fn admin(&self) -> Caller {
        Caller::admin(self.admin_user.id)
    }

    pub fn manager(&self) -> Caller {
        Caller::manager(self.maria.id, Some(self.m1.id))
    }

    pub fn owner_u1(&self) -> Caller {
        Caller::store_owner(self.u1.id, Some(self.s1.id))
    }

    pub fn owner_u2(&self) -> Caller {
        Caller::store_owner(self.u2.id, Some(self.s2.id))
    }
}

pub fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn new_user(name: &str, role: Role) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        role,
    }
}

pub async fn scenario() -> Scenario {
    let store = Arc::new(InMemoryLedgerStore::new());
    let ledger = Ledger::new(store.clone());
    let bootstrap = Caller::admin(Uuid::nil());

    let admin_user = ledger
        .create_user(&bootstrap, new_user("Root", Role::Admin))
        .await
        .unwrap();
    let admin = Caller::admin(admin_user.id);

    let maria = ledger
        .create_user(&admin, new_user("Maria", Role::Manager))
        .await
        .unwrap();
    let u1 = ledger
        .create_user(&admin, new_user("U1", Role::StoreOwner))
        .await
        .unwrap();
    let u2 = ledger
        .create_user(&admin, new_user("U2", Role::StoreOwner))
        .await
        .unwrap();
    let u3 = ledger
        .create_user(&admin, new_user("U3", Role::StoreOwner))
        .await
        .unwrap();

    let m1 = ledger
        .create_mall(
            &admin,
            NewMall {
                name: "M1".to_string(),
                manager_id: Some(maria.id),
            },
        )
        .await
        .unwrap();
    let m2 = ledger
        .create_mall(
            &admin,
            NewMall {
                name: "M2".to_string(),
                manager_id: None,
            },
        )
        .await
        .unwrap();

    let s1 = create_store(&ledger, &admin, "S1", &m1, &u1).await;
    let s2 = create_store(&ledger, &admin, "S2", &m1, &u2).await;
    let s3 = create_store(&ledger, &admin, "S3", &m2, &u3).await;

    let s1_january = import(&ledger, &admin, "2500", &s1, &u1, utc(2024, 1, 15)).await;
    let s2_february = import(&ledger, &admin, "3500", &s2, &u2, utc(2024, 2, 10)).await;
    let s1_march = import(&ledger, &admin, "2500", &s1, &u1, utc(2024, 3, 1)).await;
    let s3_november = import(&ledger, &admin, "900", &s3, &u3, utc(2023, 11, 20)).await;

    Scenario {
        ledger,
        store,
        admin_user,
        maria,
        u1,
        u2,
        u3,
        m1,
        m2,
        s1,
        s2,
        s3,
        s1_january,
        s2_february,
        s1_march,
        s3_november,
    }
}

async fn create_store(ledger: &Ledger, admin: &Caller, name: &str, mall: &Mall, owner: &User) -> Store {
    ledger
        .create_store(
            admin,
            NewStore {
                name: name.to_string(),
                rent_amount: "2500".to_string(),
                mall_id: mall.id,
                owner_id: Some(owner.id),
            },
        )
        .await
        .unwrap()
}

async fn import(
    ledger: &Ledger,
    admin: &Caller,
    amount: &str,
    store: &Store,
    payer: &User,
    at: DateTime<Utc>,
) -> Payment {
    ledger
        .import_payment(admin, &PaymentRequest::new(amount, store.id, payer.id), at)
        .await
        .unwrap()
}
