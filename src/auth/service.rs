//! Auth service layer - user registration and credential verification

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::jwt::generate_access_token;
use crate::error::{ApiError, ApiResult};
use crate::models::{LoginRequest, LoginResponse, RegisterUserRequest, User};

/// Auth service for user management and login
#[derive(Clone)]
pub struct AuthService {
    db_pool: PgPool,
    jwt_secret: String,
    access_ttl_seconds: i64,
}

impl AuthService {
    /// Create a new auth service instance
    pub fn new(db_pool: PgPool, jwt_secret: String, access_ttl_seconds: i64) -> Self {
        Self {
            db_pool,
            jwt_secret,
            access_ttl_seconds,
        }
    }

    /// Signing secret, for token verification in the extractor
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Register a new user. Reached only through the admin-guarded route.
    pub async fn register_user(&self, request: RegisterUserRequest) -> ApiResult<User> {
        let password_hash = hash(&request.password, DEFAULT_COST)?;
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, full_name, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(request.username.trim())
        .bind(&password_hash)
        .bind(request.full_name.trim())
        .bind(request.role)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Conflict("Username is already taken".to_string())
            }
            _ => ApiError::from(e),
        })?;

        tracing::info!(user_id = %user.id, username = %user.username, role = %user.role.as_str(), "User registered");

        Ok(user)
    }

    /// Verify credentials and issue an access token
    pub async fn login(&self, request: LoginRequest) -> ApiResult<LoginResponse> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(request.username.trim())
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(invalid_credentials)?;

        let password_ok = verify(&request.password, &user.password_hash)?;
        if !password_ok {
            return Err(invalid_credentials());
        }

        let token = generate_access_token(&user, &self.jwt_secret, self.access_ttl_seconds)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        tracing::info!(user_id = %user.id, username = %user.username, "User logged in");

        Ok(LoginResponse {
            token,
            expires_in: self.access_ttl_seconds,
            user: user.into(),
        })
    }

    /// Get user by ID
    pub async fn get_user(&self, id: Uuid) -> ApiResult<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        Ok(user)
    }
}

fn invalid_credentials() -> ApiError {
    // Same message whether the username or the password was wrong
    ApiError::Unauthorized("Invalid username or password".to_string())
}
