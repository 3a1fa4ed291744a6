//! Loan models and data structures for the KopaCash backend

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// Funded-loan status. Unset until the origination decision approves the
/// application.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "loan_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    PendingDisbursement, // Approved, awaiting funds-out
    Active,              // Disbursed and on schedule
    PartiallyPaid,       // Some repayments received, balance outstanding
    Paid,                // Fully repaid (terminal)
    Defaulted,           // Past expected completion, may roll over
}

/// Origination decision status, tracked independently of the funded-loan
/// status.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// Repayment cadence. Governs both the due-date increment and the
/// installment divisor.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "installment_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InstallmentType {
    Daily,
    Weekly,
}

impl InstallmentType {
    /// Days between consecutive due dates
    pub fn interval_days(&self) -> i64 {
        match self {
            InstallmentType::Daily => 1,
            InstallmentType::Weekly => 7,
        }
    }
}

/// Loan model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Loan {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub officer_id: Uuid,
    pub requested_amount: Decimal,
    pub purpose: String,
    pub installment_type: InstallmentType,
    /// Approved disbursed amount. Zero until approval.
    pub principal: Decimal,
    pub processing_fee: Decimal,
    pub total_interest: Decimal,
    /// Principal plus interest. Zero until approval.
    pub total_amount: Decimal,
    pub installment_amount: Decimal,
    /// Accumulated shortfall. Negative values are an overpayment credit.
    pub arrears: Decimal,
    /// Cache of the paid-repayment sum, maintained by reconciliation.
    pub installments_sum: Decimal,
    pub remaining_balance: Decimal,
    pub status: Option<LoanStatus>,
    pub approval_status: ApprovalStatus,
    pub rejection_reason: Option<String>,
    pub rolled_over: bool,
    pub disbursement_mpesa_code: Option<String>,
    pub application_date: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub rejection_date: Option<DateTime<Utc>>,
    pub disbursement_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub expected_completion_date: DateTime<Utc>,
    pub default_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Archived snapshot of a loan's state at the moment of roll-over.
/// Write-once, append-only.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct RolledOverLoan {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub principal: Decimal,
    pub balance_at_rollover: Decimal,
    pub total_amount: Decimal,
    pub previous_application_date: DateTime<Utc>,
    pub previous_expected_completion_date: DateTime<Utc>,
    pub rolled_over_at: DateTime<Utc>,
}

/// Request DTO for a new loan application
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLoanApplicationRequest {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub amount: Decimal,
    #[validate(length(min = 5, message = "Purpose is too short"))]
    pub purpose: String,
    pub installment_type: InstallmentType,
}

/// Request DTO for the approval decision
#[derive(Debug, Deserialize)]
pub struct ApproveLoanRequest {
    pub disbursed_amount: Decimal,
}

/// Request DTO for the rejection decision
#[derive(Debug, Deserialize, Validate)]
pub struct RejectLoanRequest {
    #[validate(length(min = 3, message = "Rejection reason is too short"))]
    pub reason: String,
}

/// Request DTO for disbursement
#[derive(Debug, Deserialize)]
pub struct DisburseLoanRequest {
    pub mpesa_code: String,
}

/// Query parameters for listing loans
#[derive(Debug, Deserialize)]
pub struct ListLoansQuery {
    pub customer_id: Option<Uuid>,
    pub status: Option<LoanStatus>,
    pub approval_status: Option<ApprovalStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Result of a scheduled scan run, returned for logging/reporting
#[derive(Debug, Serialize)]
pub struct ScanOutcome {
    pub affected_loan_ids: Vec<Uuid>,
}

impl ScanOutcome {
    pub fn count(&self) -> usize {
        self.affected_loan_ids.len()
    }
}
