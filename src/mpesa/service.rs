//! M-Pesa webhook service - resolving credit notifications to repayments
//!
//! The rail must always be acknowledged, so resolution failures are
//! reported as outcomes rather than errors; only infrastructure failures
//! propagate.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::mpesa::model::{MpesaWebhookPayload, WebhookOutcome};
use crate::repayments::{PostRepaymentRequest, RepaymentService};

/// Extract a Kenyan phone number embedded in a narration string.
///
/// Accepts `2547XXXXXXXX` / `+2547XXXXXXXX` international forms and
/// `07XXXXXXXX` / `01XXXXXXXX` local forms, returning the local form.
pub fn extract_phone(narration: &str) -> Option<String> {
    narration
        .split(|c: char| !c.is_ascii_digit() && c != '+')
        .map(|token| token.trim_start_matches('+'))
        .find_map(normalize_phone)
}

/// Normalize a digit token to the local `0XXXXXXXXX` form, if it looks
/// like a phone number at all.
fn normalize_phone(token: &str) -> Option<String> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    if token.len() == 12 && token.starts_with("254") {
        Some(format!("0{}", &token[3..]))
    } else if token.len() == 10 && (token.starts_with("07") || token.starts_with("01")) {
        Some(token.to_string())
    } else {
        None
    }
}

/// Both storage forms of a local phone number, for lookup
fn phone_variants(local: &str) -> (String, String) {
    (local.to_string(), format!("254{}", &local[1..]))
}

/// M-Pesa webhook service
#[derive(Clone)]
pub struct MpesaService {
    db_pool: PgPool,
    repayments: RepaymentService,
}

impl MpesaService {
    /// Create a new M-Pesa webhook service instance
    pub fn new(db_pool: PgPool, repayments: RepaymentService) -> Self {
        Self { db_pool, repayments }
    }

    /// Resolve a credit notification to a loan and post the repayment.
    pub async fn handle_credit_notification(
        &self,
        payload: MpesaWebhookPayload,
    ) -> ApiResult<WebhookOutcome> {
        let Some(phone) = extract_phone(&payload.narration) else {
            tracing::warn!(
                transaction_id = %payload.transaction_id,
                account = %payload.account_number,
                "Webhook narration carries no recognizable phone number"
            );
            return Ok(WebhookOutcome::Unmatched {
                reason: "no phone number in narration".to_string(),
            });
        };

        let (local, international) = phone_variants(&phone);
        let customer_id = sqlx::query_as::<_, (Uuid,)>(
            "SELECT id FROM customers WHERE phone = $1 OR phone = $2",
        )
        .bind(&local)
        .bind(&international)
        .fetch_optional(&self.db_pool)
        .await?;

        let Some((customer_id,)) = customer_id else {
            tracing::warn!(
                transaction_id = %payload.transaction_id,
                phone = %phone,
                "Webhook phone number matches no customer"
            );
            return Ok(WebhookOutcome::Unmatched {
                reason: "no customer for phone number".to_string(),
            });
        };

        // Most recently disbursed open loan takes the payment
        let loan_id = sqlx::query_as::<_, (Uuid,)>(
            r#"
            SELECT id FROM loans
            WHERE customer_id = $1 AND status IN ('active', 'partially_paid')
            ORDER BY disbursement_date DESC NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.db_pool)
        .await?;

        let Some((loan_id,)) = loan_id else {
            tracing::warn!(
                transaction_id = %payload.transaction_id,
                customer_id = %customer_id,
                "Customer has no open loan for webhook payment"
            );
            return Ok(WebhookOutcome::Unmatched {
                reason: "no open loan for customer".to_string(),
            });
        };

        let request = PostRepaymentRequest {
            loan_id,
            amount: payload.amount,
            mpesa_code: payload.transaction_id.clone(),
        };

        match self.repayments.post_repayment(request, None).await {
            Ok(repayment) => Ok(WebhookOutcome::Posted {
                loan_id,
                repayment_id: repayment.id,
            }),
            Err(ApiError::Conflict(_)) => {
                tracing::info!(
                    transaction_id = %payload.transaction_id,
                    loan_id = %loan_id,
                    "Webhook retry for already-recorded transaction"
                );
                Ok(WebhookOutcome::AlreadyProcessed)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_international_form() {
        assert_eq!(
            extract_phone("Loan payment from 254712345678 ref QWE123"),
            Some("0712345678".to_string())
        );
        assert_eq!(
            extract_phone("payment +254712345678"),
            Some("0712345678".to_string())
        );
    }

    #[test]
    fn test_extracts_local_form() {
        assert_eq!(
            extract_phone("repayment 0712345678 OK"),
            Some("0712345678".to_string())
        );
        assert_eq!(
            extract_phone("repayment 0112345678"),
            Some("0112345678".to_string())
        );
    }

    #[test]
    fn test_ignores_non_phone_digits() {
        assert_eq!(extract_phone("invoice 12345 amount 99.50"), None);
        assert_eq!(extract_phone("no digits here"), None);
        // Account-looking numbers of the wrong length or prefix
        assert_eq!(extract_phone("ref 9912345678"), None);
    }

    #[test]
    fn test_first_phone_wins() {
        assert_eq!(
            extract_phone("from 0712345678 to 0787654321"),
            Some("0712345678".to_string())
        );
    }

    #[test]
    fn test_phone_variants() {
        let (local, international) = phone_variants("0712345678");
        assert_eq!(local, "0712345678");
        assert_eq!(international, "254712345678");
    }
}
