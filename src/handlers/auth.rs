//! Authentication API handlers

use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

use crate::auth::AuthService;
use crate::error::ApiError;
use crate::middleware::AdminUser;
use crate::models::{ApiResponse, LoginRequest, LoginResponse, RegisterUserRequest, UserResponse};

/// Log in with username and password, receiving an access token
pub async fn login(
    State(service): State<Arc<AuthService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    request.validate()?;

    let response = service.login(request).await?;

    Ok(Json(ApiResponse::ok(response)))
}

/// Register a new user. Admin only.
pub async fn register_user(
    State(service): State<Arc<AuthService>>,
    AdminUser(admin): AdminUser,
    Json(request): Json<RegisterUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    request.validate()?;

    tracing::debug!(admin = %admin.username, new_user = %request.username, "User registration requested");

    let user = service.register_user(request).await?;

    Ok(Json(ApiResponse::ok(user.into())))
}
