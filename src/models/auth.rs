//! Authentication request/response models

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{UserResponse, UserRole};

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 3, message = "Username is too short"))]
    pub username: String,
    #[validate(length(min = 8, message = "Password is too short"))]
    pub password: String,
}

/// Login response carrying the access token
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

/// User registration request (admin only)
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 3, message = "Username is too short"))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 2, message = "Full name is too short"))]
    pub full_name: String,
    pub role: UserRole,
}
