//! Repayment service layer - posting payments against active loans
//!
//! Posting runs in one transaction holding the loan's row lock: the
//! arrears delta, due-date advance, ledger insert, audit-log insert, and
//! the authoritative reconciliation all commit or roll back together. A
//! concurrent missed-payment scan on the same loan waits on the lock.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::loans::model::{Loan, LoanStatus};
use crate::loans::reconcile;
use crate::models::{MpesaTransactionStatus, MpesaTransactionType};
use crate::repayments::model::{PostRepaymentRequest, Repayment, RepaymentStatus};

/// Arrears after applying a payment against the scheduled installment.
///
/// Shortfall grows arrears, surplus shrinks them. A negative result is an
/// overpayment credit carried to the next installment and is intentionally
/// not clamped at zero.
pub fn arrears_after_payment(
    arrears: Decimal,
    installment_amount: Decimal,
    amount: Decimal,
) -> Decimal {
    arrears + (installment_amount - amount)
}

/// Repayment service for the payment ledger
#[derive(Clone)]
pub struct RepaymentService {
    db_pool: PgPool,
}

impl RepaymentService {
    /// Create a new repayment service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Post a repayment against a loan.
    ///
    /// `recorded_by` is the officer posting manually, or `None` when the
    /// payment arrives through the M-Pesa webhook. Duplicate M-Pesa codes
    /// for the same loan are rejected with a conflict so webhook retries
    /// cannot double-count.
    pub async fn post_repayment(
        &self,
        request: PostRepaymentRequest,
        recorded_by: Option<Uuid>,
    ) -> ApiResult<Repayment> {
        if request.amount <= Decimal::ZERO {
            return Err(ApiError::ValidationError(
                "Repayment amount must be greater than 0".to_string(),
            ));
        }
        let mpesa_code = request.mpesa_code.trim();
        if mpesa_code.is_empty() {
            return Err(ApiError::ValidationError(
                "M-Pesa code is required".to_string(),
            ));
        }

        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(request.loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;

        match loan.status {
            None | Some(LoanStatus::PendingDisbursement) => {
                return Err(ApiError::BadRequest(
                    "Loan has not been disbursed".to_string(),
                ));
            }
            Some(LoanStatus::Paid) => {
                return Err(ApiError::BadRequest(
                    "Loan is already fully repaid".to_string(),
                ));
            }
            _ => {}
        }

        let current_due = loan
            .due_date
            .ok_or_else(|| ApiError::InternalError("Disbursed loan has no due date".to_string()))?;

        let now = Utc::now();

        let new_arrears =
            arrears_after_payment(loan.arrears, loan.installment_amount, request.amount);

        // The due date walks forward from where it was, not from today.
        let new_due = current_due + Duration::days(loan.installment_type.interval_days());

        sqlx::query("UPDATE loans SET arrears = $1, due_date = $2, updated_at = $3 WHERE id = $4")
            .bind(new_arrears)
            .bind(new_due)
            .bind(now)
            .bind(loan.id)
            .execute(&mut *tx)
            .await?;

        let repayment = sqlx::query_as::<_, Repayment>(
            r#"
            INSERT INTO repayments (
                loan_id, amount, due_date, paid_date, mpesa_code, status,
                recorded_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $4)
            RETURNING *
            "#,
        )
        .bind(loan.id)
        .bind(request.amount)
        .bind(current_due)
        .bind(now)
        .bind(mpesa_code)
        .bind(RepaymentStatus::Paid)
        .bind(recorded_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::Conflict(
                "A repayment with this M-Pesa code has already been recorded for this loan"
                    .to_string(),
            ),
            _ => ApiError::from(e),
        })?;

        sqlx::query(
            r#"
            INSERT INTO mpesa_transactions (
                loan_id, customer_id, transaction_type, amount, mpesa_code,
                status, initiated_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(loan.id)
        .bind(loan.customer_id)
        .bind(MpesaTransactionType::Repayment)
        .bind(request.amount)
        .bind(mpesa_code)
        .bind(MpesaTransactionStatus::Completed)
        .bind(recorded_by)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Authoritative recompute from the full ledger, inside the same
        // transaction as the posting itself.
        let outcome = reconcile::reconcile_loan(&mut *tx, loan.id, now).await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = %loan.id,
            repayment_id = %repayment.id,
            amount = %request.amount,
            remaining_balance = %outcome.remaining_balance,
            status = ?outcome.status,
            "Repayment posted"
        );

        Ok(repayment)
    }

    /// Void a repayment, removing it from the ledger and recomputing the
    /// loan. A correction mechanism, not a state transition.
    pub async fn void_repayment(&self, repayment_id: Uuid) -> ApiResult<()> {
        let mut tx = self.db_pool.begin().await?;

        let repayment = sqlx::query_as::<_, Repayment>("SELECT * FROM repayments WHERE id = $1")
            .bind(repayment_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("Repayment not found".to_string()))?;

        // Lock the owning loan before touching its ledger
        sqlx::query("SELECT id FROM loans WHERE id = $1 FOR UPDATE")
            .bind(repayment.loan_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM repayments WHERE id = $1")
            .bind(repayment_id)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        let outcome = reconcile::reconcile_loan(&mut *tx, repayment.loan_id, now).await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = %repayment.loan_id,
            repayment_id = %repayment_id,
            amount = %repayment.amount,
            status = ?outcome.status,
            "Repayment voided"
        );

        Ok(())
    }

    /// List the repayment ledger for a loan, newest first
    pub async fn list_for_loan(&self, loan_id: Uuid) -> ApiResult<Vec<Repayment>> {
        let repayments = sqlx::query_as::<_, Repayment>(
            "SELECT * FROM repayments WHERE loan_id = $1 ORDER BY created_at DESC",
        )
        .bind(loan_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(repayments)
    }
}
