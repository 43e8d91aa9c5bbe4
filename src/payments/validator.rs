//! Payment ownership validator
//!
//! Every payment enters the ledger through [`PaymentValidator::create`].
//! Checks run in a fixed order so that a rejected caller learns nothing
//! about entities outside its scope:
//!
//! 1. the amount is well-formed and strictly positive
//! 2. the caller may record a payment for this store / payer pair
//! 3. the referenced store and user exist

use crate::core::caller::{Caller, Capability};
use crate::core::error::{LedgerError, LedgerResult};
use crate::core::money::Amount;
use crate::core::service::LedgerStore;
use crate::entities::Payment;
use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use uuid::Uuid;

/// A request to record a payment
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentRequest {
    /// Decimal text; whole JSON numbers are also accepted
    #[serde(deserialize_with = "amount_text")]
    pub amount: String,
    pub store_id: Uuid,
    pub user_id: Uuid,
}

impl PaymentRequest {
    pub fn new(amount: impl Into<String>, store_id: Uuid, user_id: Uuid) -> Self {
        Self {
            amount: amount.into(),
            store_id,
            user_id,
        }
    }
}

/// Read an amount as decimal text
///
/// Whole numbers may also be written as plain JSON or YAML numbers. A
/// fractional or exponent number has already been rounded through `f64`
/// by the time it reaches us, so it is refused and must be sent as text.
pub(crate) fn amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(text) => Ok(text),
        Raw::Number(number) => {
            if let Some(units) = number.as_i64() {
                Ok(units.to_string())
            } else if let Some(units) = number.as_u64() {
                Ok(units.to_string())
            } else {
                Err(D::Error::custom(
                    "only whole amounts may be written as numbers; use decimal text such as \"12.50\"",
                ))
            }
        }
    }
}

/// Parse a payment amount and require it to be strictly positive
pub fn validate_payment_amount(text: &str) -> LedgerResult<Amount> {
    let amount =
        Amount::parse(text).map_err(|e| LedgerError::invalid_amount(text, e.to_string()))?;
    if !amount.is_positive() {
        return Err(LedgerError::invalid_amount(text, "amount must be greater than zero"));
    }
    Ok(amount)
}

/// Validates and records payments
#[derive(Clone)]
pub struct PaymentValidator {
    store: Arc<dyn LedgerStore>,
}

impl PaymentValidator {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Validate `request` on behalf of `caller` and record the payment
    ///
    /// Identity and creation timestamp are assigned here; nothing is written
    /// unless every check passes.
    pub async fn create(&self, caller: &Caller, request: &PaymentRequest) -> LedgerResult<Payment> {
        self.record(caller, request, None).await
    }

    /// Like [`create`](Self::create), keeping a historical creation time
    ///
    /// Callers must restrict this to administrative imports.
    pub async fn import(
        &self,
        caller: &Caller,
        request: &PaymentRequest,
        created_at: DateTime<Utc>,
    ) -> LedgerResult<Payment> {
        self.record(caller, request, Some(created_at)).await
    }

    async fn record(
        &self,
        caller: &Caller,
        request: &PaymentRequest,
        created_at: Option<DateTime<Utc>>,
    ) -> LedgerResult<Payment> {
        let amount = validate_payment_amount(&request.amount)?;
        self.authorize(caller, request).await?;

        let store = self
            .store
            .get_store(&request.store_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("store", request.store_id))?;
        if self.store.get_user(&request.user_id).await?.is_none() {
            return Err(LedgerError::not_found("user", request.user_id));
        }

        if store.owner_id != Some(request.user_id) {
            tracing::warn!(
                caller_id = %caller.user_id,
                store_id = %store.id,
                payer_id = %request.user_id,
                "payment recorded for a payer who does not own the store"
            );
        }

        let payment = self
            .store
            .create_payment(match created_at {
                Some(at) => Payment::recorded_at(amount, request.store_id, request.user_id, at),
                None => Payment::new(amount, request.store_id, request.user_id),
            })
            .await?;

        tracing::info!(
            payment_id = %payment.id,
            store_id = %payment.store_id,
            caller_id = %caller.user_id,
            amount = %payment.amount,
            "payment recorded"
        );
        Ok(payment)
    }

    async fn authorize(&self, caller: &Caller, request: &PaymentRequest) -> LedgerResult<()> {
        let allowed = match caller.capability {
            Capability::Admin => true,
            Capability::Manager {
                managed_mall_id: None,
            } => false,
            Capability::Manager {
                managed_mall_id: Some(managed),
            } => self
                .store
                .stores_of_mall(&managed)
                .await?
                .iter()
                .any(|store| store.id == request.store_id),
            Capability::StoreOwner { owned_store_id } => {
                owned_store_id == Some(request.store_id) && request.user_id == caller.user_id
            }
        };

        if allowed {
            Ok(())
        } else {
            tracing::warn!(
                caller_id = %caller.user_id,
                role = %caller.role(),
                "payment creation denied"
            );
            Err(LedgerError::forbidden(
                "payments may only be recorded within the caller's own scope",
            ))
        }
    }
}
