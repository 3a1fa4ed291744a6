//! Repayment ledger models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// Repayment ledger status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "repayment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RepaymentStatus {
    Pending,
    Paid,
    Late,
    Missed,
}

/// Repayment model. Immutable once created; the only permitted mutation is
/// deletion through the void (correction) operation.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Repayment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub amount: Decimal,
    /// Snapshot of the loan's due date at the time of posting
    pub due_date: Option<DateTime<Utc>>,
    pub paid_date: Option<DateTime<Utc>>,
    pub mpesa_code: String,
    pub status: RepaymentStatus,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for posting a repayment
#[derive(Debug, Deserialize)]
pub struct PostRepaymentRequest {
    pub loan_id: Uuid,
    pub amount: Decimal,
    pub mpesa_code: String,
}
