//! Scheduled reconciliation jobs
//!
//! Runs the missed-payment and default scans on a cron cadence. Both scans
//! are idempotent single-statement updates, so a missed tick only delays
//! detection until the next one. The cadence must be at least daily or
//! daily loans would silently skip accrual cycles.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::loans::LoanService;

/// Start the scan scheduler. The returned handle must be kept alive for
/// the lifetime of the server.
pub async fn start(schedule: &str, loan_service: Arc<LoanService>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| anyhow!("Failed to create job scheduler: {}", e))?;

    let job = Job::new_async(schedule, move |_job_id, _scheduler| {
        let svc = loan_service.clone();
        Box::pin(async move {
            run_scans(&svc).await;
        })
    })
    .map_err(|e| anyhow!("Invalid scan schedule '{}': {}", schedule, e))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| anyhow!("Failed to register scan job: {}", e))?;
    scheduler
        .start()
        .await
        .map_err(|e| anyhow!("Failed to start job scheduler: {}", e))?;

    tracing::info!(schedule = %schedule, "Loan scan scheduler started");

    Ok(scheduler)
}

/// Run the missed-payment and default scans once.
///
/// Scan errors are logged and swallowed so a failed run never takes the
/// scheduler down; the next tick re-evaluates full state.
pub async fn run_scans(loan_service: &LoanService) {
    match loan_service.detect_missed_payments().await {
        Ok(outcome) => {
            if outcome.count() > 0 {
                tracing::info!(
                    count = outcome.count(),
                    loan_ids = ?outcome.affected_loan_ids,
                    "Missed-payment scan accrued arrears"
                );
            } else {
                tracing::debug!("Missed-payment scan found no overdue loans");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Missed-payment scan failed");
        }
    }

    match loan_service.detect_defaults().await {
        Ok(outcome) => {
            if outcome.count() > 0 {
                tracing::info!(
                    count = outcome.count(),
                    loan_ids = ?outcome.affected_loan_ids,
                    "Default scan marked loans defaulted"
                );
            } else {
                tracing::debug!("Default scan found no loans past completion");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Default scan failed");
        }
    }
}
