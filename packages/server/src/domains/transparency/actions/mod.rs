//! Monthly transparency report generation.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use crate::common::ReportingPeriod;
use crate::domains::transparency::models::TransparencyReport;
use crate::kernel::notifier::{dispatch_best_effort, Notification, NotificationKind};
use crate::kernel::ServerDeps;

/// Build and store the report for `period`, replacing an earlier version.
pub async fn generate_monthly_report(
    period: ReportingPeriod,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<TransparencyReport> {
    let sessions = deps
        .reviews
        .sessions_opened_between(period.start, period.end)
        .await?;
    let corrections = deps
        .corrections
        .corrections_received_between(period.start, period.end)
        .await?;
    let published = deps
        .fact_checks
        .count_published_between(period.start, period.end)
        .await?;

    let report = TransparencyReport::build(period, &sessions, &corrections, published, now);
    let report = deps.reports.save_report(&report).await?;

    info!(
        period = %period.label(),
        reviews_opened = report.reviews_opened,
        corrections_received = report.corrections_received,
        "Transparency report generated"
    );

    let notification = Notification::new(
        NotificationKind::TransparencyReportReady,
        format!("Transparency report {}", period.label()),
        format!(
            "{} fact-checks published, {} peer reviews opened, {} correction requests received.",
            report.fact_checks_published, report.reviews_opened, report.corrections_received
        ),
        json!({ "report_id": report.id, "period": period.label() }),
    );
    dispatch_best_effort(deps.notifier.as_ref(), notification).await;

    Ok(report)
}

pub async fn find_report(
    period: ReportingPeriod,
    deps: &ServerDeps,
) -> Result<Option<TransparencyReport>> {
    deps.reports.find_report(period.start).await
}
