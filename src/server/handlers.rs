//! HTTP handlers for the ledger operations
//!
//! Handlers are thin: resolve the caller, call the [`Ledger`], wrap the
//! result. Every scoping and validation decision happens in the ledger.

use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::caller::{Caller, CallerResolver};
use crate::core::error::LedgerError;
use crate::entities::{Mall, Payment, Store, User};
use crate::ledger::{Identity, Ledger, NewMall, NewStore, NewUser};
use crate::payments::PaymentRequest;
use crate::revenue::MonthlyRevenue;

use super::extractors::{ApiJson, ApiPath, ApiQuery};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ledger: Ledger,
    pub resolver: Arc<dyn CallerResolver>,
}

/// The resolved caller of the current request
///
/// Rejects with `401` before the handler runs when the identity context
/// cannot resolve a caller.
#[derive(Debug, Clone, Copy)]
pub struct CurrentCaller(pub Caller);

impl FromRequestParts<AppState> for CurrentCaller {
    type Rejection = LedgerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match state.resolver.resolve(&parts.headers).await {
            Ok(caller) => Ok(CurrentCaller(caller)),
            Err(err) => {
                tracing::warn!(path = %parts.uri.path(), error = %err, "caller rejected");
                Err(err)
            }
        }
    }
}

/// Response for the mall listing endpoint
#[derive(Debug, Serialize)]
pub struct ListMallsResponse {
    pub malls: Vec<Mall>,
    pub count: usize,
}

/// Response for the store listing endpoint
#[derive(Debug, Serialize)]
pub struct ListStoresResponse {
    pub stores: Vec<Store>,
    pub count: usize,
}

/// Response for the payment listing endpoints
#[derive(Debug, Serialize)]
pub struct ListPaymentsResponse {
    pub payments: Vec<Payment>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct PaymentQuery {
    pub store_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    /// Defaults to the current UTC year
    pub year: Option<i32>,
    pub store_id: Option<Uuid>,
}

/// Request body for `PUT /stores/{id}/owner`; `null` releases the store
#[derive(Debug, Deserialize)]
pub struct AssignOwnerRequest {
    pub owner_id: Option<Uuid>,
}

/// Request body for `PUT /malls/{id}/manager`; `null` releases the mall
#[derive(Debug, Deserialize)]
pub struct AssignManagerRequest {
    pub manager_id: Option<Uuid>,
}

type ApiResult<T> = Result<Json<T>, LedgerError>;
type Created<T> = Result<(StatusCode, Json<T>), LedgerError>;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "malltrack"
    }))
}

pub async fn who_am_i(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
) -> ApiResult<Identity> {
    Ok(Json(state.ledger.who_am_i(&caller).await?))
}

pub async fn list_malls(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
) -> ApiResult<ListMallsResponse> {
    let malls = state.ledger.list_visible_malls(&caller).await?;
    Ok(Json(ListMallsResponse {
        count: malls.len(),
        malls,
    }))
}

pub async fn get_mall(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiPath(mall_id): ApiPath<Uuid>,
) -> ApiResult<Mall> {
    Ok(Json(state.ledger.get_visible_mall(&caller, &mall_id).await?))
}

pub async fn list_mall_stores(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiPath(mall_id): ApiPath<Uuid>,
) -> ApiResult<ListStoresResponse> {
    let stores = state.ledger.list_visible_stores(&caller, &mall_id).await?;
    Ok(Json(ListStoresResponse {
        count: stores.len(),
        stores,
    }))
}

pub async fn get_store(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiPath(store_id): ApiPath<Uuid>,
) -> ApiResult<Store> {
    Ok(Json(state.ledger.get_visible_store(&caller, &store_id).await?))
}

pub async fn list_store_payments(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiPath(store_id): ApiPath<Uuid>,
) -> ApiResult<ListPaymentsResponse> {
    payments_response(&state, &caller, Some(&store_id)).await
}

pub async fn list_payments(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiQuery(query): ApiQuery<PaymentQuery>,
) -> ApiResult<ListPaymentsResponse> {
    payments_response(&state, &caller, query.store_id.as_ref()).await
}

async fn payments_response(
    state: &AppState,
    caller: &Caller,
    store_id: Option<&Uuid>,
) -> ApiResult<ListPaymentsResponse> {
    let payments = state.ledger.list_visible_payments(caller, store_id).await?;
    Ok(Json(ListPaymentsResponse {
        count: payments.len(),
        payments,
    }))
}

pub async fn get_payment(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiPath(payment_id): ApiPath<Uuid>,
) -> ApiResult<Payment> {
    Ok(Json(
        state.ledger.get_visible_payment(&caller, &payment_id).await?,
    ))
}

pub async fn create_payment(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiJson(request): ApiJson<PaymentRequest>,
) -> Created<Payment> {
    let payment = state.ledger.create_payment(&caller, &request).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn monthly_revenue(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiQuery(query): ApiQuery<RevenueQuery>,
) -> ApiResult<MonthlyRevenue> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    Ok(Json(
        state
            .ledger
            .monthly_revenue(&caller, year, query.store_id.as_ref())
            .await?,
    ))
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiJson(input): ApiJson<NewUser>,
) -> Created<User> {
    let user = state.ledger.create_user(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn create_mall(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiJson(input): ApiJson<NewMall>,
) -> Created<Mall> {
    let mall = state.ledger.create_mall(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(mall)))
}

pub async fn create_store(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiJson(input): ApiJson<NewStore>,
) -> Created<Store> {
    let store = state.ledger.create_store(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(store)))
}

pub async fn assign_store_owner(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiPath(store_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<AssignOwnerRequest>,
) -> ApiResult<Store> {
    Ok(Json(
        state
            .ledger
            .assign_store_owner(&caller, &store_id, request.owner_id)
            .await?,
    ))
}

pub async fn assign_mall_manager(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiPath(mall_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<AssignManagerRequest>,
) -> ApiResult<Mall> {
    Ok(Json(
        state
            .ledger
            .assign_mall_manager(&caller, &mall_id, request.manager_id)
            .await?,
    ))
}
