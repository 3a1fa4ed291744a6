//! M-Pesa payment-rail integration: inbound webhook resolution.

pub mod model;
pub mod service;

pub use model::{MpesaWebhookPayload, WebhookOutcome};
pub use service::{extract_phone, MpesaService};
