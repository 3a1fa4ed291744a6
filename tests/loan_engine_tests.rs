//! Loan Lifecycle Engine Tests
//!
//! These tests pin the financial semantics of the lifecycle engine: term
//! computation at approval, the status/balance reconciliation priority
//! order, the arrears policy, and roll-over eligibility.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use kopacash_server::config::LendingPolicy;
use kopacash_server::loans::model::{InstallmentType, LoanStatus};
use kopacash_server::loans::reconcile::derive;
use kopacash_server::loans::rollover_eligible;
use kopacash_server::loans::terms::{compute_terms, first_due_date};
use kopacash_server::repayments::arrears_after_payment;

fn policy() -> LendingPolicy {
    LendingPolicy::default()
}

fn future(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Some(now + Duration::days(1))
}

fn past(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Some(now - Duration::days(1))
}

// ============================================================================
// Term Computation Tests
// ============================================================================

#[test]
fn test_approval_terms_10000_at_ten_percent_daily() {
    let terms = compute_terms(dec!(10000), dec!(10), InstallmentType::Daily, &policy());

    assert_eq!(terms.principal, dec!(10000));
    assert_eq!(terms.processing_fee, dec!(300));
    assert_eq!(terms.total_interest, dec!(1000));
    assert_eq!(terms.total_amount, dec!(11000));
    assert_eq!(terms.installment_amount, dec!(366.67));
}

#[test]
fn test_approval_terms_weekly_uses_four_installments() {
    let terms = compute_terms(dec!(20000), dec!(15), InstallmentType::Weekly, &policy());

    assert_eq!(terms.total_interest, dec!(3000));
    assert_eq!(terms.total_amount, dec!(23000));
    assert_eq!(terms.installment_amount, dec!(5750));
}

#[test]
fn test_first_due_date_matches_installment_cadence() {
    let approved_at = Utc::now();

    assert_eq!(
        first_due_date(approved_at, InstallmentType::Daily),
        approved_at + Duration::days(1)
    );
    assert_eq!(
        first_due_date(approved_at, InstallmentType::Weekly),
        approved_at + Duration::days(7)
    );
}

#[test]
fn test_terms_respect_configured_policy() {
    let custom = LendingPolicy {
        min_loan_amount: dec!(500),
        processing_fee_rate: dec!(0.05),
        loan_term_days: 60,
        daily_installments: dec!(60),
        weekly_installments: dec!(8),
    };

    let terms = compute_terms(dec!(12000), dec!(10), InstallmentType::Daily, &custom);
    assert_eq!(terms.processing_fee, dec!(600));
    assert_eq!(terms.installment_amount, dec!(220)); // 13200 / 60

    let terms = compute_terms(dec!(12000), dec!(10), InstallmentType::Weekly, &custom);
    assert_eq!(terms.installment_amount, dec!(1650)); // 13200 / 8
}

// ============================================================================
// Reconciliation Tests
// ============================================================================

#[test]
fn test_balance_invariant_holds() {
    let now = Utc::now();
    let total = dec!(11000);

    for paid in [dec!(0), dec!(366.67), dec!(5000), dec!(10999.99), dec!(11000)] {
        let outcome = derive(total, paid, dec!(0), future(now), now);
        assert_eq!(outcome.remaining_balance, total - paid);
        assert_eq!(outcome.installments_sum, paid);
    }
}

#[test]
fn test_partial_payment_scenario() {
    let now = Utc::now();
    let outcome = derive(dec!(11000), dec!(5000), dec!(0), future(now), now);

    assert_eq!(outcome.installments_sum, dec!(5000));
    assert_eq!(outcome.remaining_balance, dec!(6000));
    assert_eq!(outcome.status, LoanStatus::PartiallyPaid);
}

#[test]
fn test_exact_final_repayment_clears_loan_and_arrears() {
    let now = Utc::now();

    // Arrears were positive going in; clearing the balance zeroes them
    let outcome = derive(dec!(11000), dec!(11000), dec!(733.34), past(now), now);

    assert_eq!(outcome.status, LoanStatus::Paid);
    assert_eq!(outcome.remaining_balance, dec!(0));
    assert_eq!(outcome.arrears, dec!(0));
}

#[test]
fn test_status_priority_order() {
    let now = Utc::now();
    let total = dec!(11000);

    // Paid beats everything
    let outcome = derive(total, dec!(11500), dec!(999), past(now), now);
    assert_eq!(outcome.status, LoanStatus::Paid);

    // Partial payment masks an overdue default: documented policy
    let outcome = derive(total, dec!(100), dec!(366.67), past(now), now);
    assert_eq!(outcome.status, LoanStatus::PartiallyPaid);

    // Default is only reachable with nothing paid
    let outcome = derive(total, dec!(0), dec!(366.67), past(now), now);
    assert_eq!(outcome.status, LoanStatus::Defaulted);

    // Overdue but no arrears: still active
    let outcome = derive(total, dec!(0), dec!(0), past(now), now);
    assert_eq!(outcome.status, LoanStatus::Active);
}

#[test]
fn test_repayment_additivity() {
    let now = Utc::now();
    let total = dec!(11000);

    // Two postings of A and B land the loan exactly where one posting of
    // A+B would
    let split_a = dec!(3000);
    let split_b = dec!(2000);

    let stepwise = derive(total, split_a + split_b, dec!(0), future(now), now);
    let single = derive(total, dec!(5000), dec!(0), future(now), now);

    assert_eq!(stepwise, single);
}

#[test]
fn test_reconcile_without_due_date_never_defaults() {
    let now = Utc::now();
    let outcome = derive(dec!(11000), dec!(0), dec!(500), None, now);
    assert_eq!(outcome.status, LoanStatus::Active);
}

// ============================================================================
// Arrears Policy Tests
// ============================================================================

#[test]
fn test_underpayment_accrues_shortfall() {
    let arrears = arrears_after_payment(dec!(0), dec!(366.67), dec!(200));
    assert_eq!(arrears, dec!(166.67));
}

#[test]
fn test_exact_payment_leaves_arrears_unchanged() {
    let arrears = arrears_after_payment(dec!(150), dec!(366.67), dec!(366.67));
    assert_eq!(arrears, dec!(150));
}

#[test]
fn test_overpayment_reduces_arrears_below_zero() {
    // Overpayment credit is carried, not clamped
    let arrears = arrears_after_payment(dec!(100), dec!(366.67), dec!(1000));
    assert_eq!(arrears, dec!(-533.33));
}

#[test]
fn test_missed_cycle_accrues_full_installment() {
    // The missed-payment scan adds one full installment per scan
    let arrears = arrears_after_payment(dec!(0), dec!(366.67), dec!(0));
    assert_eq!(arrears, dec!(366.67));
}

#[test]
fn test_arrears_sequence_matches_running_total() {
    let installment = dec!(366.67);
    let payments = [dec!(300), dec!(366.67), dec!(500), dec!(0)];

    let mut arrears = Decimal::ZERO;
    for payment in payments {
        arrears = arrears_after_payment(arrears, installment, payment);
    }

    // 66.67 + 0 - 133.33 + 366.67
    assert_eq!(arrears, dec!(300.01));
}

// ============================================================================
// Roll-Over Eligibility Tests
// ============================================================================

#[test]
fn test_rollover_scenario_from_defaulted_loan() {
    let now = Utc::now();

    // principal 10000, remaining 2000, interest 1000:
    // recovered 9000 > 1000, completion date passed, never rolled over
    assert!(rollover_eligible(
        Some(LoanStatus::Defaulted),
        false,
        dec!(11000),
        dec!(2000),
        dec!(1000),
        now - Duration::days(10),
        now,
    ));
}

#[test]
fn test_rollover_single_use() {
    let now = Utc::now();

    assert!(!rollover_eligible(
        Some(LoanStatus::Defaulted),
        true, // already rolled over once
        dec!(11000),
        dec!(2000),
        dec!(1000),
        now - Duration::days(10),
        now,
    ));
}

#[test]
fn test_rollover_requires_recovery_beyond_interest() {
    let now = Utc::now();

    // Exactly the interest recovered is not enough; the gate is strict
    assert!(!rollover_eligible(
        Some(LoanStatus::Defaulted),
        false,
        dec!(11000),
        dec!(10000),
        dec!(1000),
        now - Duration::days(10),
        now,
    ));

    // One cent beyond clears it
    assert!(rollover_eligible(
        Some(LoanStatus::Defaulted),
        false,
        dec!(11000),
        dec!(9999.99),
        dec!(1000),
        now - Duration::days(10),
        now,
    ));
}

#[test]
fn test_rollover_completion_date_boundary() {
    let now = Utc::now();

    // Today qualifies, tomorrow does not
    assert!(rollover_eligible(
        Some(LoanStatus::Active),
        false,
        dec!(11000),
        dec!(2000),
        dec!(1000),
        now,
        now,
    ));
    assert!(!rollover_eligible(
        Some(LoanStatus::Active),
        false,
        dec!(11000),
        dec!(2000),
        dec!(1000),
        now + Duration::days(1),
        now,
    ));
}

#[test]
fn test_rollover_status_gate() {
    let now = Utc::now();
    let completion = now - Duration::days(10);

    for status in [
        Some(LoanStatus::Active),
        Some(LoanStatus::PartiallyPaid),
        Some(LoanStatus::Defaulted),
    ] {
        assert!(rollover_eligible(
            status,
            false,
            dec!(11000),
            dec!(2000),
            dec!(1000),
            completion,
            now,
        ));
    }

    for status in [Some(LoanStatus::Paid), Some(LoanStatus::PendingDisbursement), None] {
        assert!(!rollover_eligible(
            status,
            false,
            dec!(11000),
            dec!(2000),
            dec!(1000),
            completion,
            now,
        ));
    }
}

// ============================================================================
// End-to-End Arithmetic Walkthrough
// ============================================================================

#[test]
fn test_full_lifecycle_arithmetic() {
    let now = Utc::now();
    let policy = policy();

    // Approval: 10000 disbursed at 10% daily
    let terms = compute_terms(dec!(10000), dec!(10), InstallmentType::Daily, &policy);
    assert_eq!(terms.total_amount, dec!(11000));

    // First repayment under-pays the installment
    let mut arrears = Decimal::ZERO;
    arrears = arrears_after_payment(arrears, terms.installment_amount, dec!(300));
    assert_eq!(arrears, dec!(66.67));

    let outcome = derive(terms.total_amount, dec!(300), arrears, future(now), now);
    assert_eq!(outcome.status, LoanStatus::PartiallyPaid);
    assert_eq!(outcome.remaining_balance, dec!(10700));

    // A missed cycle accrues a full installment
    arrears = arrears_after_payment(arrears, terms.installment_amount, Decimal::ZERO);
    assert_eq!(arrears, dec!(433.34));

    // A large final payment clears the balance and the arrears with it
    let outcome = derive(
        terms.total_amount,
        terms.total_amount,
        arrears,
        past(now),
        now,
    );
    assert_eq!(outcome.status, LoanStatus::Paid);
    assert_eq!(outcome.arrears, Decimal::ZERO);
}
