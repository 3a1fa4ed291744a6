//! Loan lifecycle domain: models, term computation, reconciliation, and
//! the loan service.

pub mod model;
pub mod reconcile;
pub mod service;
pub mod terms;

pub use model::{
    ApprovalStatus, ApproveLoanRequest, CreateLoanApplicationRequest, DisburseLoanRequest,
    InstallmentType, ListLoansQuery, Loan, LoanStatus, RejectLoanRequest, RolledOverLoan,
    ScanOutcome,
};
pub use service::{rollover_eligible, LoanService};
