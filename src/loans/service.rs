//! Loan service layer - Business logic for the loan lifecycle
//!
//! Every multi-step mutation (approval, disbursement, roll-over) runs in a
//! single transaction with a `SELECT ... FOR UPDATE` row lock so concurrent
//! operations on the same loan serialize. The scheduled scans use single
//! atomic UPDATE statements and are safe to re-run.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::LendingPolicy;
use crate::error::{ApiError, ApiResult};
use crate::loans::model::{
    ApprovalStatus, ApproveLoanRequest, CreateLoanApplicationRequest, DisburseLoanRequest,
    ListLoansQuery, Loan, LoanStatus, RejectLoanRequest, RolledOverLoan, ScanOutcome,
};
use crate::loans::terms::{compute_terms, first_due_date};
use crate::models::{
    Customer, LoanProduct, MpesaTransactionStatus, MpesaTransactionType, PaginatedResponse,
};

/// Check whether a loan qualifies for roll-over.
///
/// All conditions must hold: the loan is in a post-disbursement state that
/// still owes money, enough has been recovered to cover more than the
/// interest, the single-use roll-over flag is unset, and the expected
/// completion date is today or already past.
pub fn rollover_eligible(
    status: Option<LoanStatus>,
    rolled_over: bool,
    total_amount: Decimal,
    remaining_balance: Decimal,
    total_interest: Decimal,
    expected_completion_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    let status_ok = matches!(
        status,
        Some(LoanStatus::Active) | Some(LoanStatus::PartiallyPaid) | Some(LoanStatus::Defaulted)
    );

    status_ok
        && !rolled_over
        && (total_amount - remaining_balance) > total_interest
        && expected_completion_date.date_naive() <= now.date_naive()
}

/// Loan service for managing the loan lifecycle
#[derive(Clone)]
pub struct LoanService {
    db_pool: PgPool,
    policy: LendingPolicy,
}

impl LoanService {
    /// Create a new loan service instance
    pub fn new(db_pool: PgPool, policy: LendingPolicy) -> Self {
        Self { db_pool, policy }
    }

    /// Intake a new loan application as a pre-approval shell.
    ///
    /// No financial fields are set here; they are fixed by the approval
    /// decision.
    pub async fn create_application(
        &self,
        request: CreateLoanApplicationRequest,
        officer_id: Uuid,
    ) -> ApiResult<Loan> {
        if request.amount < self.policy.min_loan_amount {
            return Err(ApiError::ValidationError(format!(
                "Requested amount must be at least {}",
                self.policy.min_loan_amount
            )));
        }

        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(request.customer_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))?;

        let product = sqlx::query_as::<_, LoanProduct>("SELECT * FROM loan_products WHERE id = $1")
            .bind(request.product_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan product not found".to_string()))?;

        if request.amount < product.min_amount || request.amount > product.max_amount {
            return Err(ApiError::ValidationError(format!(
                "Requested amount must be between {} and {} for product '{}'",
                product.min_amount, product.max_amount, product.name
            )));
        }

        let now = Utc::now();
        let expected_completion = now + Duration::days(self.policy.loan_term_days);

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                customer_id, product_id, officer_id, requested_amount, purpose,
                installment_type, application_date, expected_completion_date,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $7, $7)
            RETURNING *
            "#,
        )
        .bind(customer.id)
        .bind(product.id)
        .bind(officer_id)
        .bind(request.amount)
        .bind(&request.purpose)
        .bind(request.installment_type)
        .bind(now)
        .bind(expected_completion)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(
            loan_id = %loan.id,
            customer_id = %customer.id,
            amount = %request.amount,
            "Loan application created"
        );

        Ok(loan)
    }

    /// Approve a pending application, fixing its financial terms.
    ///
    /// One-way transition: a loan whose decision has already been made is
    /// reported as not found.
    pub async fn approve_loan(
        &self,
        loan_id: Uuid,
        request: ApproveLoanRequest,
    ) -> ApiResult<Loan> {
        if request.disbursed_amount <= Decimal::ZERO {
            return Err(ApiError::ValidationError(
                "Disbursed amount must be greater than 0".to_string(),
            ));
        }

        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(not_found_or_processed)?;

        if loan.approval_status != ApprovalStatus::Pending {
            return Err(not_found_or_processed());
        }

        let product = sqlx::query_as::<_, LoanProduct>("SELECT * FROM loan_products WHERE id = $1")
            .bind(loan.product_id)
            .fetch_one(&mut *tx)
            .await?;

        let now = Utc::now();
        let terms = compute_terms(
            request.disbursed_amount,
            product.interest_rate,
            loan.installment_type,
            &self.policy,
        );
        let due_date = first_due_date(now, loan.installment_type);

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET principal = $1, processing_fee = $2, total_interest = $3,
                total_amount = $4, installment_amount = $5,
                status = 'pending_disbursement', approval_status = 'approved',
                approval_date = $6, due_date = $7, updated_at = $6
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(terms.principal)
        .bind(terms.processing_fee)
        .bind(terms.total_interest)
        .bind(terms.total_amount)
        .bind(terms.installment_amount)
        .bind(now)
        .bind(due_date)
        .bind(loan_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = %loan.id,
            principal = %terms.principal,
            total_amount = %terms.total_amount,
            installment = %terms.installment_amount,
            "Loan approved"
        );

        Ok(loan)
    }

    /// Reject a pending application. Terminal.
    pub async fn reject_loan(&self, loan_id: Uuid, request: RejectLoanRequest) -> ApiResult<Loan> {
        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(not_found_or_processed)?;

        if loan.approval_status != ApprovalStatus::Pending {
            return Err(not_found_or_processed());
        }

        let now = Utc::now();
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET approval_status = 'rejected', rejection_reason = $1,
                rejection_date = $2, updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(&request.reason)
        .bind(now)
        .bind(loan_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(loan_id = %loan.id, reason = %request.reason, "Loan rejected");

        Ok(loan)
    }

    /// Disburse an approved loan, recording the funds-out event.
    pub async fn disburse_loan(
        &self,
        loan_id: Uuid,
        request: DisburseLoanRequest,
        initiated_by: Uuid,
    ) -> ApiResult<Loan> {
        if request.mpesa_code.trim().is_empty() {
            return Err(ApiError::ValidationError(
                "M-Pesa code is required for disbursement".to_string(),
            ));
        }

        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;

        if loan.status != Some(LoanStatus::PendingDisbursement) {
            return Err(ApiError::BadRequest(
                "Loan is not in pending disbursement status".to_string(),
            ));
        }

        let now = Utc::now();
        let expected_completion = now + Duration::days(self.policy.loan_term_days);

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'active', disbursement_date = $1,
                expected_completion_date = $2, remaining_balance = total_amount,
                disbursement_mpesa_code = $3, updated_at = $1
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(expected_completion)
        .bind(request.mpesa_code.trim())
        .bind(loan_id)
        .fetch_one(&mut *tx)
        .await?;

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
        .bind(MpesaTransactionType::Disbursement)
        .bind(loan.total_amount)
        .bind(request.mpesa_code.trim())
        .bind(MpesaTransactionStatus::Completed)
        .bind(initiated_by)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = %loan.id,
            amount = %loan.total_amount,
            "Loan disbursed"
        );

        Ok(loan)
    }

    /// Roll an eligible loan over to a fresh schedule, archiving its prior
    /// state. Single use per loan lifetime.
    pub async fn roll_over_loan(&self, loan_id: Uuid) -> ApiResult<Loan> {
        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(not_eligible)?;

        let now = Utc::now();
        if !rollover_eligible(
            loan.status,
            loan.rolled_over,
            loan.total_amount,
            loan.remaining_balance,
            loan.total_interest,
            loan.expected_completion_date,
            now,
        ) {
            return Err(not_eligible());
        }

        let archive = sqlx::query_as::<_, RolledOverLoan>(
            r#"
            INSERT INTO rolled_over_loans (
                loan_id, principal, balance_at_rollover, total_amount,
                previous_application_date, previous_expected_completion_date,
                rolled_over_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(loan.id)
        .bind(loan.principal)
        .bind(loan.remaining_balance)
        .bind(loan.total_amount)
        .bind(loan.application_date)
        .bind(loan.expected_completion_date)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let expected_completion = now + Duration::days(self.policy.loan_term_days);
        let due_date = now + Duration::days(1);

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'active', arrears = 0, rolled_over = TRUE,
                expected_completion_date = $1, due_date = $2, updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(expected_completion)
        .bind(due_date)
        .bind(now)
        .bind(loan_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = %loan.id,
            archive_id = %archive.id,
            balance_at_rollover = %archive.balance_at_rollover,
            "Loan rolled over"
        );

        Ok(loan)
    }

    /// Mark loans past their expected completion date as defaulted.
    ///
    /// Idempotent per run: already-defaulted loans are excluded by the
    /// status filter.
    pub async fn detect_defaults(&self) -> ApiResult<ScanOutcome> {
        let now = Utc::now();

        let defaulted = sqlx::query_as::<_, (Uuid,)>(
            r#"
            UPDATE loans
            SET status = 'defaulted', default_date = $1, updated_at = $1
            WHERE status IN ('active', 'partially_paid')
              AND expected_completion_date < $1
            RETURNING id
            "#,
        )
        .bind(now)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(ScanOutcome {
            affected_loan_ids: defaulted.into_iter().map(|(id,)| id).collect(),
        })
    }

    /// Accrue a full installment of arrears on loans whose due date has
    /// passed, advancing the due date by one installment interval.
    ///
    /// The scan must run at least daily so no accrual cycle is skipped for
    /// daily loans.
    pub async fn detect_missed_payments(&self) -> ApiResult<ScanOutcome> {
        let now = Utc::now();

        let missed = sqlx::query_as::<_, (Uuid,)>(
            r#"
            UPDATE loans
            SET arrears = arrears + installment_amount,
                due_date = due_date + make_interval(
                    days => CASE WHEN installment_type = 'daily' THEN 1 ELSE 7 END
                ),
                updated_at = $1
            WHERE status IN ('active', 'partially_paid')
              AND due_date < $1
            RETURNING id
            "#,
        )
        .bind(now)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(ScanOutcome {
            affected_loan_ids: missed.into_iter().map(|(id,)| id).collect(),
        })
    }

    /// Get loan by ID
    pub async fn get_loan(&self, id: Uuid) -> ApiResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;

        Ok(loan)
    }

    /// List loans with optional filters and pagination
    pub async fn list_loans(&self, query: ListLoansQuery) -> ApiResult<PaginatedResponse<Loan>> {
        let pagination = crate::models::PaginationParams {
            page: query.page,
            limit: query.limit,
        };
        let (page, limit) = pagination.resolve();

        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE ($1::uuid IS NULL OR customer_id = $1)
              AND ($2::loan_status IS NULL OR status = $2)
              AND ($3::approval_status IS NULL OR approval_status = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(query.customer_id)
        .bind(query.status)
        .bind(query.approval_status)
        .bind(limit)
        .bind(pagination.offset())
        .fetch_all(&self.db_pool)
        .await?;

        let (total,) = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT COUNT(*) FROM loans
            WHERE ($1::uuid IS NULL OR customer_id = $1)
              AND ($2::loan_status IS NULL OR status = $2)
              AND ($3::approval_status IS NULL OR approval_status = $3)
            "#,
        )
        .bind(query.customer_id)
        .bind(query.status)
        .bind(query.approval_status)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(PaginatedResponse {
            data: loans,
            total,
            page,
            limit,
        })
    }

    /// List roll-over archive records for a loan
    pub async fn list_rollovers(&self, loan_id: Uuid) -> ApiResult<Vec<RolledOverLoan>> {
        let archives = sqlx::query_as::<_, RolledOverLoan>(
            "SELECT * FROM rolled_over_loans WHERE loan_id = $1 ORDER BY rolled_over_at DESC",
        )
        .bind(loan_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(archives)
    }
}

fn not_found_or_processed() -> ApiError {
    ApiError::NotFound("Loan not found or already processed".to_string())
}

fn not_eligible() -> ApiError {
    ApiError::NotFound("Loan not found or not eligible for roll-over".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn eligible_inputs() -> (
        Option<LoanStatus>,
        bool,
        Decimal,
        Decimal,
        Decimal,
        DateTime<Utc>,
        DateTime<Utc>,
    ) {
        let now = Utc::now();
        (
            Some(LoanStatus::Defaulted),
            false,
            dec!(11000),
            dec!(2000),
            dec!(1000),
            now - Duration::days(5),
            now,
        )
    }

    #[test]
    fn test_rollover_eligible_baseline() {
        let (status, flag, total, balance, interest, completion, now) = eligible_inputs();
        assert!(rollover_eligible(
            status, flag, total, balance, interest, completion, now
        ));
    }

    #[test]
    fn test_rollover_is_single_use() {
        let (status, _, total, balance, interest, completion, now) = eligible_inputs();
        assert!(!rollover_eligible(
            status, true, total, balance, interest, completion, now
        ));
    }

    #[test]
    fn test_rollover_requires_recovered_principal() {
        let (status, flag, total, _, interest, completion, now) = eligible_inputs();
        // Only 500 recovered of 11000; does not exceed interest of 1000
        assert!(!rollover_eligible(
            status,
            flag,
            total,
            dec!(10500),
            interest,
            completion,
            now
        ));
    }

    #[test]
    fn test_rollover_requires_completion_date_reached() {
        let (status, flag, total, balance, interest, _, now) = eligible_inputs();
        assert!(!rollover_eligible(
            status,
            flag,
            total,
            balance,
            interest,
            now + Duration::days(2),
            now
        ));
        // Today counts as reached
        assert!(rollover_eligible(
            status, flag, total, balance, interest, now, now
        ));
    }

    #[test]
    fn test_rollover_rejects_terminal_and_unfunded_states() {
        let (_, flag, total, balance, interest, completion, now) = eligible_inputs();
        assert!(!rollover_eligible(
            Some(LoanStatus::Paid),
            flag,
            total,
            balance,
            interest,
            completion,
            now
        ));
        assert!(!rollover_eligible(
            Some(LoanStatus::PendingDisbursement),
            flag,
            total,
            balance,
            interest,
            completion,
            now
        ));
        assert!(!rollover_eligible(
            None, flag, total, balance, interest, completion, now
        ));
    }
}
