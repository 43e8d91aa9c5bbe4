//! Route table of the REST exposure

use super::handlers::{
    AppState, assign_mall_manager, assign_store_owner, create_mall, create_payment, create_store,
    create_user, get_mall, get_payment, get_store, health_check, list_mall_stores, list_malls,
    list_payments, list_store_payments, monthly_revenue, who_am_i,
};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Build health check routes; these never resolve a caller
pub fn build_health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

/// Build the ledger routes
///
/// - GET /me
/// - GET /malls, POST /malls
/// - GET /malls/{mall_id}, GET /malls/{mall_id}/stores, PUT /malls/{mall_id}/manager
/// - POST /stores, GET /stores/{store_id}, GET /stores/{store_id}/payments,
///   PUT /stores/{store_id}/owner
/// - GET /payments?store_id=, POST /payments, GET /payments/{payment_id}
/// - GET /revenue/monthly?year=&store_id=
/// - POST /users
pub fn build_ledger_routes(state: AppState) -> Router {
    Router::new()
        .route("/me", get(who_am_i))
        .route("/malls", get(list_malls).post(create_mall))
        .route("/malls/{mall_id}", get(get_mall))
        .route("/malls/{mall_id}/stores", get(list_mall_stores))
        .route("/malls/{mall_id}/manager", put(assign_mall_manager))
        .route("/stores", post(create_store))
        .route("/stores/{store_id}", get(get_store))
        .route("/stores/{store_id}/payments", get(list_store_payments))
        .route("/stores/{store_id}/owner", put(assign_store_owner))
        .route("/payments", get(list_payments).post(create_payment))
        .route("/payments/{payment_id}", get(get_payment))
        .route("/revenue/monthly", get(monthly_revenue))
        .route("/users", post(create_user))
        .with_state(state)
}
