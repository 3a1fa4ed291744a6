//! API handlers for the KopaCash backend

mod auth;
mod customers;
mod loans;
mod mpesa;
mod products;
mod repayments;

pub use auth::*;
pub use customers::*;
pub use loans::*;
pub use mpesa::*;
pub use products::*;
pub use repayments::*;
