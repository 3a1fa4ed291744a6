//! M-Pesa webhook handler
//!
//! The payment rail retries unacknowledged notifications, so this endpoint
//! returns 200 for every resolvable situation including duplicates and
//! unmatched payments; only infrastructure failures surface as errors.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::mpesa::{MpesaService, MpesaWebhookPayload, WebhookOutcome};

/// Receive a credit notification from the payment rail
pub async fn mpesa_webhook(
    State(service): State<Arc<MpesaService>>,
    Json(payload): Json<MpesaWebhookPayload>,
) -> Result<Json<ApiResponse<WebhookOutcome>>, ApiError> {
    let outcome = service.handle_credit_notification(payload).await?;

    Ok(Json(ApiResponse::ok(outcome)))
}
