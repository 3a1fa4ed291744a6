//! Repayment ledger domain: posting, void corrections, and listing.

pub mod model;
pub mod service;

pub use model::{PostRepaymentRequest, Repayment, RepaymentStatus};
pub use service::{arrears_after_payment, RepaymentService};
