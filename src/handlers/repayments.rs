//! Repayment API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::ApiResponse;
use crate::repayments::{PostRepaymentRequest, Repayment, RepaymentService};

/// Post a repayment against a loan
pub async fn post_repayment(
    State(service): State<Arc<RepaymentService>>,
    user: AuthenticatedUser,
    Json(request): Json<PostRepaymentRequest>,
) -> Result<Json<ApiResponse<Repayment>>, ApiError> {
    let repayment = service.post_repayment(request, Some(user.user_id)).await?;

    Ok(Json(ApiResponse::ok(repayment)))
}

/// Void a repayment (ledger correction). Admin only.
pub async fn void_repayment(
    State(service): State<Arc<RepaymentService>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    service.void_repayment(id).await?;

    Ok(Json(ApiResponse::ok(())))
}
