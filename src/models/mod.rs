//! Shared data models for the KopaCash backend

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

pub mod auth;
pub use auth::*;

/// User (loan officer / administrator) model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User roles
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Officer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Officer => "officer",
        }
    }
}

/// Public user representation (no password hash)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Customer model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Customer {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub national_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for registering a customer
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 2, message = "Name is too short"))]
    pub full_name: String,
    #[validate(length(min = 9, message = "Phone number is too short"))]
    pub phone: String,
    #[validate(length(min = 6, message = "National ID is too short"))]
    pub national_id: String,
}

/// Loan product model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct LoanProduct {
    pub id: Uuid,
    pub name: String,
    /// Flat interest rate in percent, applied once on the disbursed amount
    pub interest_rate: Decimal,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for creating a loan product
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLoanProductRequest {
    #[validate(length(min = 2, message = "Product name is too short"))]
    pub name: String,
    pub interest_rate: Decimal,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
}

/// M-Pesa transaction audit log entry (append-only)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct MpesaTransaction {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub customer_id: Uuid,
    pub transaction_type: MpesaTransactionType,
    pub amount: Decimal,
    pub mpesa_code: String,
    pub status: MpesaTransactionStatus,
    pub initiated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// M-Pesa transaction types
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "mpesa_transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MpesaTransactionType {
    Disbursement,
    Repayment,
}

/// M-Pesa transaction settlement status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "mpesa_transaction_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MpesaTransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Pagination parameters
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PaginationParams {
    /// Resolve page/limit with defaults and a hard cap
    pub fn resolve(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        (page, limit)
    }

    pub fn offset(&self) -> i64 {
        let (page, limit) = self.resolve();
        (page - 1) * limit
    }
}

/// Paginated response
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let params = PaginationParams {
            page: None,
            limit: None,
        };
        assert_eq!(params.resolve(), (1, 20));
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_pagination_clamps_limit() {
        let params = PaginationParams {
            page: Some(3),
            limit: Some(500),
        };
        assert_eq!(params.resolve(), (3, 100));
        assert_eq!(params.offset(), 200);
    }

    #[test]
    fn test_user_role_as_str() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::Officer.as_str(), "officer");
    }
}
