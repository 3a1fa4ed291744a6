//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthService;
use crate::customers::CustomerService;
use crate::loans::LoanService;
use crate::mpesa::MpesaService;
use crate::products::ProductService;
use crate::repayments::RepaymentService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub loan_service: Arc<LoanService>,
    pub repayment_service: Arc<RepaymentService>,
    pub customer_service: Arc<CustomerService>,
    pub product_service: Arc<ProductService>,
    pub auth_service: Arc<AuthService>,
    pub mpesa_service: Arc<MpesaService>,
}

impl AppState {
    pub fn new(
        loan_service: Arc<LoanService>,
        repayment_service: Arc<RepaymentService>,
        customer_service: Arc<CustomerService>,
        product_service: Arc<ProductService>,
        auth_service: Arc<AuthService>,
        mpesa_service: Arc<MpesaService>,
    ) -> Self {
        Self {
            loan_service,
            repayment_service,
            customer_service,
            product_service,
            auth_service,
            mpesa_service,
        }
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<RepaymentService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.repayment_service.clone()
    }
}

impl FromRef<AppState> for Arc<CustomerService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.customer_service.clone()
    }
}

impl FromRef<AppState> for Arc<ProductService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.product_service.clone()
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<MpesaService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.mpesa_service.clone()
    }
}
