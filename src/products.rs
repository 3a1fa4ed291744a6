//! Loan product service layer - product definitions that supply the
//! interest rate and amount bounds used at origination.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{CreateLoanProductRequest, LoanProduct};

/// Loan product service
#[derive(Clone)]
pub struct ProductService {
    db_pool: PgPool,
}

impl ProductService {
    /// Create a new product service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Create a loan product
    pub async fn create_product(&self, request: CreateLoanProductRequest) -> ApiResult<LoanProduct> {
        if request.interest_rate < Decimal::ZERO {
            return Err(ApiError::ValidationError(
                "Interest rate cannot be negative".to_string(),
            ));
        }
        if request.min_amount <= Decimal::ZERO || request.max_amount < request.min_amount {
            return Err(ApiError::ValidationError(
                "Product amount bounds must be positive with max >= min".to_string(),
            ));
        }

        let product = sqlx::query_as::<_, LoanProduct>(
            r#"
            INSERT INTO loan_products (name, interest_rate, min_amount, max_amount)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.name.trim())
        .bind(request.interest_rate)
        .bind(request.min_amount)
        .bind(request.max_amount)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Conflict("A product with this name already exists".to_string())
            }
            _ => ApiError::from(e),
        })?;

        tracing::info!(product_id = %product.id, name = %product.name, "Loan product created");

        Ok(product)
    }

    /// Get product by ID
    pub async fn get_product(&self, id: Uuid) -> ApiResult<LoanProduct> {
        let product = sqlx::query_as::<_, LoanProduct>("SELECT * FROM loan_products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan product not found".to_string()))?;

        Ok(product)
    }

    /// List all products
    pub async fn list_products(&self) -> ApiResult<Vec<LoanProduct>> {
        let products =
            sqlx::query_as::<_, LoanProduct>("SELECT * FROM loan_products ORDER BY name")
                .fetch_all(&self.db_pool)
                .await?;

        Ok(products)
    }
}
