//! Loan term computation
//!
//! Pure arithmetic over the approval decision: processing fee, flat
//! interest, total payable, and the installment amount. Kept free of any
//! persistence so the figures can be tested directly.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::config::LendingPolicy;
use crate::loans::model::InstallmentType;

/// Financial terms fixed at approval time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanTerms {
    pub principal: Decimal,
    pub processing_fee: Decimal,
    pub total_interest: Decimal,
    pub total_amount: Decimal,
    pub installment_amount: Decimal,
}

/// Compute the terms for an approved loan.
///
/// `interest_rate` is the product's flat rate in percent, applied once on
/// the disbursed amount. The installment divisor comes from policy, not
/// from the product duration.
pub fn compute_terms(
    disbursed_amount: Decimal,
    interest_rate: Decimal,
    installment_type: InstallmentType,
    policy: &LendingPolicy,
) -> LoanTerms {
    let processing_fee = (disbursed_amount * policy.processing_fee_rate).round_dp(2);
    let total_interest = (disbursed_amount * interest_rate / Decimal::from(100)).round_dp(2);
    let total_amount = disbursed_amount + total_interest;

    let divisor = match installment_type {
        InstallmentType::Daily => policy.daily_installments,
        InstallmentType::Weekly => policy.weekly_installments,
    };
    let installment_amount = (total_amount / divisor).round_dp(2);

    LoanTerms {
        principal: disbursed_amount,
        processing_fee,
        total_interest,
        total_amount,
        installment_amount,
    }
}

/// The first due date after approval: one installment interval from now
pub fn first_due_date(approved_at: DateTime<Utc>, installment_type: InstallmentType) -> DateTime<Utc> {
    approved_at + Duration::days(installment_type.interval_days())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn policy() -> LendingPolicy {
        LendingPolicy::default()
    }

    #[test]
    fn test_daily_terms_at_ten_percent() {
        let terms = compute_terms(dec!(10000), dec!(10), InstallmentType::Daily, &policy());

        assert_eq!(terms.principal, dec!(10000));
        assert_eq!(terms.processing_fee, dec!(300));
        assert_eq!(terms.total_interest, dec!(1000));
        assert_eq!(terms.total_amount, dec!(11000));
        assert_eq!(terms.installment_amount, dec!(366.67));
    }

    #[test]
    fn test_weekly_terms_divide_by_four() {
        let terms = compute_terms(dec!(10000), dec!(10), InstallmentType::Weekly, &policy());

        assert_eq!(terms.total_amount, dec!(11000));
        assert_eq!(terms.installment_amount, dec!(2750));
    }

    #[test]
    fn test_fee_rounds_to_cents() {
        let terms = compute_terms(dec!(1234.55), dec!(12.5), InstallmentType::Daily, &policy());

        assert_eq!(terms.processing_fee, dec!(37.04));
        assert_eq!(terms.total_interest, dec!(154.32));
        assert_eq!(terms.total_amount, dec!(1388.87));
    }

    #[test]
    fn test_first_due_date_daily_and_weekly() {
        let now = Utc::now();
        assert_eq!(
            first_due_date(now, InstallmentType::Daily),
            now + Duration::days(1)
        );
        assert_eq!(
            first_due_date(now, InstallmentType::Weekly),
            now + Duration::days(7)
        );
    }
}
