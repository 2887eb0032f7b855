//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! - Escalation sweep over overdue review sessions (hourly by default)
//! - Digest of correction requests past their SLA (daily)
//! - Previous month's transparency report (1st of the month)
//!
//! Each job logs its own failure and waits for the next tick.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::common::ReportingPeriod;
use crate::config::Config;
use crate::domains::corrections::actions::notify_overdue_corrections;
use crate::domains::peer_review::actions::sweep_escalations;
use crate::domains::transparency::actions::generate_monthly_report;
use crate::kernel::ServerDeps;

/// Start all scheduled tasks
pub async fn start_scheduler(deps: Arc<ServerDeps>, config: &Config) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let sweep_deps = deps.clone();
    let sweep_job = Job::new_async(config.escalation_sweep_cron.as_str(), move |_uuid, _lock| {
        let deps = sweep_deps.clone();
        Box::pin(async move {
            if let Err(e) = sweep_escalations(&deps, Utc::now()).await {
                tracing::error!("Escalation sweep failed: {}", e);
            }
        })
    })?;
    scheduler.add(sweep_job).await?;

    let sla_deps = deps.clone();
    let sla_job = Job::new_async(config.correction_sla_cron.as_str(), move |_uuid, _lock| {
        let deps = sla_deps.clone();
        Box::pin(async move {
            if let Err(e) = notify_overdue_corrections(&deps, Utc::now()).await {
                tracing::error!("Correction SLA check failed: {}", e);
            }
        })
    })?;
    scheduler.add(sla_job).await?;

    let report_deps = deps.clone();
    let report_job = Job::new_async(config.transparency_report_cron.as_str(), move |_uuid, _lock| {
        let deps = report_deps.clone();
        Box::pin(async move {
            if let Err(e) = run_monthly_report(&deps).await {
                tracing::error!("Transparency report task failed: {}", e);
            }
        })
    })?;
    scheduler.add(report_job).await?;

    scheduler.start().await?;

    tracing::info!(
        escalation = %config.escalation_sweep_cron,
        correction_sla = %config.correction_sla_cron,
        transparency_report = %config.transparency_report_cron,
        "Scheduled tasks started"
    );
    Ok(scheduler)
}

async fn run_monthly_report(deps: &ServerDeps) -> Result<()> {
    let now = Utc::now();
    let period = ReportingPeriod::previous(now)?;
    tracing::info!(period = %period.label(), "Running monthly transparency report task");
    generate_monthly_report(period, now, deps).await?;
    Ok(())
}
