//! Loan lifecycle API handlers
//!
//! The approval, rejection, and disbursement transitions are admin-only
//! and guarded by the `AdminUser` extractor; everything else needs an
//! authenticated officer.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::loans::{
    ApproveLoanRequest, CreateLoanApplicationRequest, DisburseLoanRequest, ListLoansQuery, Loan,
    LoanService, RejectLoanRequest, RolledOverLoan, ScanOutcome,
};
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::{ApiResponse, PaginatedResponse};
use crate::repayments::{Repayment, RepaymentService};

/// Create a new loan application
pub async fn create_loan_application(
    State(service): State<Arc<LoanService>>,
    user: AuthenticatedUser,
    Json(request): Json<CreateLoanApplicationRequest>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    request.validate()?;

    let loan = service.create_application(request, user.user_id).await?;

    Ok(Json(ApiResponse::ok(loan)))
}

/// Get a single loan by ID
pub async fn get_loan(
    State(service): State<Arc<LoanService>>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = service.get_loan(id).await?;

    Ok(Json(ApiResponse::ok(loan)))
}

/// List loans with filtering and pagination
pub async fn list_loans(
    State(service): State<Arc<LoanService>>,
    _user: AuthenticatedUser,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<Loan>>>, ApiError> {
    let result = service.list_loans(query).await?;

    Ok(Json(ApiResponse::ok(result)))
}

/// Approve a pending application. Admin only.
pub async fn approve_loan(
    State(service): State<Arc<LoanService>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ApproveLoanRequest>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = service.approve_loan(id, request).await?;

    Ok(Json(ApiResponse::ok(loan)))
}

/// Reject a pending application. Admin only.
pub async fn reject_loan(
    State(service): State<Arc<LoanService>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectLoanRequest>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    request.validate()?;

    let loan = service.reject_loan(id, request).await?;

    Ok(Json(ApiResponse::ok(loan)))
}

/// Disburse an approved loan. Admin only.
pub async fn disburse_loan(
    State(service): State<Arc<LoanService>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<DisburseLoanRequest>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = service.disburse_loan(id, request, admin.user_id).await?;

    Ok(Json(ApiResponse::ok(loan)))
}

/// Roll an eligible loan over to a fresh schedule
pub async fn rollover_loan(
    State(service): State<Arc<LoanService>>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = service.roll_over_loan(id).await?;

    Ok(Json(ApiResponse::ok(loan)))
}

/// List the roll-over archive for a loan
pub async fn list_loan_rollovers(
    State(service): State<Arc<LoanService>>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<RolledOverLoan>>>, ApiError> {
    let archives = service.list_rollovers(id).await?;

    Ok(Json(ApiResponse::ok(archives)))
}

/// List the repayment ledger for a loan
pub async fn list_loan_repayments(
    State(service): State<Arc<RepaymentService>>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Repayment>>>, ApiError> {
    let repayments = service.list_for_loan(id).await?;

    Ok(Json(ApiResponse::ok(repayments)))
}

/// Run the default scan on demand. Admin only.
pub async fn check_defaults(
    State(service): State<Arc<LoanService>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<ApiResponse<ScanOutcome>>, ApiError> {
    let outcome = service.detect_defaults().await?;

    Ok(Json(ApiResponse::ok(outcome)))
}

/// Run the missed-payment scan on demand. Admin only.
pub async fn check_missed_payments(
    State(service): State<Arc<LoanService>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<ApiResponse<ScanOutcome>>, ApiError> {
    let outcome = service.detect_missed_payments().await?;

    Ok(Json(ApiResponse::ok(outcome)))
}
