//! M-Pesa payment-rail webhook models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inbound credit notification from the payment rail.
///
/// The narration is free text from the rail and embeds the payer's phone
/// number; the transaction id doubles as the repayment's M-Pesa code.
#[derive(Debug, Deserialize)]
pub struct MpesaWebhookPayload {
    pub transaction_id: String,
    pub account_number: String,
    pub amount: Decimal,
    pub narration: String,
}

/// Outcome of processing a credit notification. The webhook is always
/// acknowledged; this records what happened for logging and the response
/// body.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// A repayment was posted against the resolved loan
    Posted {
        loan_id: Uuid,
        repayment_id: Uuid,
    },
    /// The transaction id was already recorded; retry acknowledged
    AlreadyProcessed,
    /// No phone, customer, or open loan matched; logged and ignored
    Unmatched {
        reason: String,
    },
}
