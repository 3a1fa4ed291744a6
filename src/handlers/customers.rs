//! Customer API handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::customers::CustomerService;
use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{
    ApiResponse, CreateCustomerRequest, Customer, PaginatedResponse, PaginationParams,
};

/// Register a customer
pub async fn create_customer(
    State(service): State<Arc<CustomerService>>,
    _user: AuthenticatedUser,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<Json<ApiResponse<Customer>>, ApiError> {
    request.validate()?;

    let customer = service.create_customer(request).await?;

    Ok(Json(ApiResponse::ok(customer)))
}

/// Get a single customer by ID
pub async fn get_customer(
    State(service): State<Arc<CustomerService>>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Customer>>, ApiError> {
    let customer = service.get_customer(id).await?;

    Ok(Json(ApiResponse::ok(customer)))
}

/// List customers with pagination
pub async fn list_customers(
    State(service): State<Arc<CustomerService>>,
    _user: AuthenticatedUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<Customer>>>, ApiError> {
    let result = service.list_customers(pagination).await?;

    Ok(Json(ApiResponse::ok(result)))
}
