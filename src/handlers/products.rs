//! Loan product API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::{ApiResponse, CreateLoanProductRequest, LoanProduct};
use crate::products::ProductService;

/// Create a loan product. Admin only.
pub async fn create_product(
    State(service): State<Arc<ProductService>>,
    AdminUser(_admin): AdminUser,
    Json(request): Json<CreateLoanProductRequest>,
) -> Result<Json<ApiResponse<LoanProduct>>, ApiError> {
    request.validate()?;

    let product = service.create_product(request).await?;

    Ok(Json(ApiResponse::ok(product)))
}

/// Get a single product by ID
pub async fn get_product(
    State(service): State<Arc<ProductService>>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LoanProduct>>, ApiError> {
    let product = service.get_product(id).await?;

    Ok(Json(ApiResponse::ok(product)))
}

/// List all products
pub async fn list_products(
    State(service): State<Arc<ProductService>>,
    _user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<LoanProduct>>>, ApiError> {
    let products = service.list_products().await?;

    Ok(Json(ApiResponse::ok(products)))
}
