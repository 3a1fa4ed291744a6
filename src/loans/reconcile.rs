//! Status and balance reconciliation
//!
//! The authoritative recompute of a loan's `installments_sum`,
//! `remaining_balance`, `arrears`, and `status` from its full repayment
//! history. Runs inside the same transaction as any repayment mutation so
//! concurrent operations on a loan serialize on the row lock.
//!
//! The status decision keeps the established priority order: a loan that
//! is both partially paid and overdue reports `partially_paid`, not
//! `defaulted`. Changing that order changes financial-reporting semantics,
//! so it is pinned by tests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::loans::model::LoanStatus;

/// Reconciled view of a loan's financial state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub installments_sum: Decimal,
    pub remaining_balance: Decimal,
    pub arrears: Decimal,
    pub status: LoanStatus,
}

/// Derive the loan's status from its accumulated payments.
///
/// Priority order:
/// 1. balance cleared        -> `paid` (arrears reset to zero)
/// 2. some but not all paid  -> `partially_paid`
/// 3. overdue with arrears   -> `defaulted`
/// 4. otherwise              -> `active`
pub fn derive(
    total_amount: Decimal,
    installments_sum: Decimal,
    arrears: Decimal,
    due_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ReconcileOutcome {
    let remaining_balance = total_amount - installments_sum;

    let (status, arrears) = if remaining_balance <= Decimal::ZERO {
        (LoanStatus::Paid, Decimal::ZERO)
    } else if installments_sum > Decimal::ZERO && installments_sum < total_amount {
        (LoanStatus::PartiallyPaid, arrears)
    } else if due_date.is_some_and(|due| due < now) && arrears > Decimal::ZERO {
        (LoanStatus::Defaulted, arrears)
    } else {
        (LoanStatus::Active, arrears)
    };

    ReconcileOutcome {
        installments_sum,
        remaining_balance,
        arrears,
        status,
    }
}

/// Recompute and persist a loan's financial state from its repayment
/// ledger. The caller must already hold the loan's row lock.
pub async fn reconcile_loan(
    conn: &mut PgConnection,
    loan_id: Uuid,
    now: DateTime<Utc>,
) -> Result<ReconcileOutcome, sqlx::Error> {
    let (total_amount, arrears, due_date) =
        sqlx::query_as::<_, (Decimal, Decimal, Option<DateTime<Utc>>)>(
            "SELECT total_amount, arrears, due_date FROM loans WHERE id = $1",
        )
        .bind(loan_id)
        .fetch_one(&mut *conn)
        .await?;

    let (installments_sum,) = sqlx::query_as::<_, (Decimal,)>(
        "SELECT COALESCE(SUM(amount), 0) FROM repayments WHERE loan_id = $1 AND status = 'paid'",
    )
    .bind(loan_id)
    .fetch_one(&mut *conn)
    .await?;

    let outcome = derive(total_amount, installments_sum, arrears, due_date, now);

    sqlx::query(
        r#"
        UPDATE loans
        SET installments_sum = $1, remaining_balance = $2, arrears = $3,
            status = $4, updated_at = $5
        WHERE id = $6
        "#,
    )
    .bind(outcome.installments_sum)
    .bind(outcome.remaining_balance)
    .bind(outcome.arrears)
    .bind(outcome.status)
    .bind(now)
    .bind(loan_id)
    .execute(&mut *conn)
    .await?;

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_untouched_loan_stays_active() {
        let now = Utc::now();
        let outcome = derive(
            dec!(11000),
            dec!(0),
            dec!(0),
            Some(now + Duration::days(1)),
            now,
        );
        assert_eq!(outcome.status, LoanStatus::Active);
        assert_eq!(outcome.remaining_balance, dec!(11000));
    }

    #[test]
    fn test_partial_payment_classification() {
        let now = Utc::now();
        let outcome = derive(
            dec!(11000),
            dec!(5000),
            dec!(0),
            Some(now + Duration::days(1)),
            now,
        );
        assert_eq!(outcome.status, LoanStatus::PartiallyPaid);
        assert_eq!(outcome.remaining_balance, dec!(6000));
    }

    #[test]
    fn test_cleared_balance_is_paid_and_resets_arrears() {
        let now = Utc::now();
        let outcome = derive(
            dec!(11000),
            dec!(11000),
            dec!(733.34),
            Some(now - Duration::days(3)),
            now,
        );
        assert_eq!(outcome.status, LoanStatus::Paid);
        assert_eq!(outcome.remaining_balance, dec!(0));
        assert_eq!(outcome.arrears, dec!(0));
    }

    #[test]
    fn test_overpayment_is_paid() {
        let now = Utc::now();
        let outcome = derive(dec!(11000), dec!(11500), dec!(0), None, now);
        assert_eq!(outcome.status, LoanStatus::Paid);
        assert_eq!(outcome.remaining_balance, dec!(-500));
    }

    #[test]
    fn test_overdue_with_arrears_defaults_only_when_nothing_paid() {
        let now = Utc::now();

        // Nothing paid yet, overdue with arrears: defaulted
        let outcome = derive(
            dec!(11000),
            dec!(0),
            dec!(366.67),
            Some(now - Duration::days(2)),
            now,
        );
        assert_eq!(outcome.status, LoanStatus::Defaulted);

        // Same overdue arrears, but partially paid: partial payment wins
        let outcome = derive(
            dec!(11000),
            dec!(5000),
            dec!(366.67),
            Some(now - Duration::days(2)),
            now,
        );
        assert_eq!(outcome.status, LoanStatus::PartiallyPaid);
    }

    #[test]
    fn test_overdue_without_arrears_stays_active() {
        let now = Utc::now();
        let outcome = derive(
            dec!(11000),
            dec!(0),
            dec!(0),
            Some(now - Duration::days(1)),
            now,
        );
        assert_eq!(outcome.status, LoanStatus::Active);
    }

    #[test]
    fn test_negative_arrears_credit_is_preserved() {
        let now = Utc::now();
        let outcome = derive(
            dec!(11000),
            dec!(400),
            dec!(-33.33),
            Some(now + Duration::days(1)),
            now,
        );
        assert_eq!(outcome.status, LoanStatus::PartiallyPaid);
        assert_eq!(outcome.arrears, dec!(-33.33));
    }
}
