//! Route definitions for the KopaCash API

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

/// Auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register_user))
}

/// Customer routes
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/api/customers", post(create_customer))
        .route("/api/customers", get(list_customers))
        .route("/api/customers/:id", get(get_customer))
}

/// Loan product routes
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", post(create_product))
        .route("/api/products", get(list_products))
        .route("/api/products/:id", get(get_product))
}

/// Loan lifecycle routes
pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", post(create_loan_application))
        .route("/api/loans", get(list_loans))
        .route("/api/loans/check-defaults", post(check_defaults))
        .route("/api/loans/check-missed-payments", post(check_missed_payments))
        .route("/api/loans/:id", get(get_loan))
        .route("/api/loans/:id/approve", post(approve_loan))
        .route("/api/loans/:id/reject", post(reject_loan))
        .route("/api/loans/:id/disburse", post(disburse_loan))
        .route("/api/loans/:id/rollover", post(rollover_loan))
        .route("/api/loans/:id/repayments", get(list_loan_repayments))
        .route("/api/loans/:id/rollovers", get(list_loan_rollovers))
}

/// Repayment routes
pub fn repayment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/repayments", post(post_repayment))
        .route("/api/repayments/:id", delete(void_repayment))
}

/// M-Pesa webhook routes (unauthenticated; the rail cannot hold a token)
pub fn mpesa_routes() -> Router<AppState> {
    Router::new().route("/api/mpesa/webhook", post(mpesa_webhook))
}
