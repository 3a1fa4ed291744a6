//! Customer service layer - the customer store the lifecycle engine
//! resolves applications and webhook payments against.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{CreateCustomerRequest, Customer, PaginatedResponse, PaginationParams};

/// Customer service
#[derive(Clone)]
pub struct CustomerService {
    db_pool: PgPool,
}

impl CustomerService {
    /// Create a new customer service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Register a customer
    pub async fn create_customer(&self, request: CreateCustomerRequest) -> ApiResult<Customer> {
        let now = Utc::now();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (full_name, phone, national_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(request.full_name.trim())
        .bind(request.phone.trim())
        .bind(request.national_id.trim())
        .bind(now)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::Conflict(
                "A customer with this phone or national ID already exists".to_string(),
            ),
            _ => ApiError::from(e),
        })?;

        tracing::info!(customer_id = %customer.id, "Customer registered");

        Ok(customer)
    }

    /// Get customer by ID
    pub async fn get_customer(&self, id: Uuid) -> ApiResult<Customer> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))?;

        Ok(customer)
    }

    /// List customers with pagination
    pub async fn list_customers(
        &self,
        pagination: PaginationParams,
    ) -> ApiResult<PaginatedResponse<Customer>> {
        let (page, limit) = pagination.resolve();

        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(pagination.offset())
        .fetch_all(&self.db_pool)
        .await?;

        let (total,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.db_pool)
            .await?;

        Ok(PaginatedResponse {
            data: customers,
            total,
            page,
            limit,
        })
    }
}
