//! Correction request actions
//!
//! Requests arrive from the public form, are answered by a reviewer within the
//! SLA window, and are kept forever as an audit trail.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::common::{CorrectionRequestId, MemberId};
use crate::domains::corrections::errors::CorrectionError;
use crate::domains::corrections::models::{
    CorrectionRequest, CorrectionResolution, CorrectionType, NewCorrectionRequest,
};
use crate::domains::fact_checks::models::FactCheck;
use crate::kernel::notifier::{dispatch_best_effort, Notification, NotificationKind};
use crate::kernel::ServerDeps;

pub async fn submit_correction(
    input: NewCorrectionRequest,
    deps: &ServerDeps,
) -> Result<CorrectionRequest, CorrectionError> {
    if input.description.trim().is_empty() {
        return Err(CorrectionError::EmptyDescription);
    }
    if deps
        .fact_checks
        .find_fact_check(input.fact_check_id)
        .await?
        .is_none()
    {
        return Err(CorrectionError::FactCheckNotFound(input.fact_check_id));
    }

    let correction = CorrectionRequest::receive(input, Utc::now(), deps.policy.correction_sla);
    let correction = deps.corrections.insert_correction(&correction).await?;

    info!(
        correction_id = %correction.id,
        fact_check_id = %correction.fact_check_id,
        correction_type = %correction.correction_type,
        sla_deadline = %correction.sla_deadline,
        "Correction request received"
    );
    Ok(correction)
}

/// Resolve an open request and apply it to the fact-check by type.
pub async fn resolve_correction(
    correction_id: CorrectionRequestId,
    resolved_by: MemberId,
    resolution_note: String,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<(CorrectionRequest, FactCheck), CorrectionError> {
    let note = resolution_note.trim().to_string();
    if note.is_empty() {
        return Err(CorrectionError::EmptyResolutionNote);
    }

    let correction = deps
        .corrections
        .find_correction(correction_id)
        .await?
        .ok_or(CorrectionError::NotFound(correction_id))?;
    if !correction.is_open() {
        return Err(CorrectionError::AlreadyResolved(correction_id));
    }

    let fact_check = deps
        .fact_checks
        .find_fact_check(correction.fact_check_id)
        .await?
        .ok_or(CorrectionError::FactCheckNotFound(correction.fact_check_id))?;

    let amendment = correction.correction_type.amendment_for(&note, now);
    let resolution = CorrectionResolution {
        correction_id,
        resolved_by,
        note,
        resolved_at: now,
    };

    let (correction, fact_check) = deps
        .corrections
        .resolve_correction(&resolution, fact_check.id, &amendment)
        .await?
        // Resolved concurrently by someone else
        .ok_or(CorrectionError::AlreadyResolved(correction_id))?;

    info!(
        correction_id = %correction.id,
        fact_check_id = %fact_check.id,
        correction_type = %correction.correction_type,
        within_sla = correction.resolved_within_sla(),
        "Correction resolved"
    );

    if correction.correction_type == CorrectionType::Substantial {
        let notification = Notification::new(
            NotificationKind::CorrectionPublished,
            format!("Correction published: {}", fact_check.title),
            fact_check.public_notice.clone().unwrap_or_default(),
            json!({
                "correction_id": correction.id,
                "fact_check_id": fact_check.id,
                "status": fact_check.status,
            }),
        );
        dispatch_best_effort(deps.notifier.as_ref(), notification).await;
    }

    Ok((correction, fact_check))
}

/// Send one digest listing every open request past its SLA deadline.
/// Returns how many were overdue.
pub async fn notify_overdue_corrections(deps: &ServerDeps, now: DateTime<Utc>) -> Result<usize> {
    let overdue = deps.corrections.find_overdue_corrections(now).await?;
    if overdue.is_empty() {
        info!("No correction requests past SLA");
        return Ok(0);
    }

    warn!(count = overdue.len(), "Correction requests past SLA");

    let lines: Vec<String> = overdue
        .iter()
        .map(|c| {
            format!(
                "- {} ({}) on fact-check {}: due {}",
                c.id,
                c.correction_type,
                c.fact_check_id,
                c.sla_deadline.format("%Y-%m-%d %H:%M UTC")
            )
        })
        .collect();
    let ids: Vec<_> = overdue.iter().map(|c| c.id).collect();

    let notification = Notification::new(
        NotificationKind::CorrectionsOverdue,
        format!("{} correction request(s) past SLA", overdue.len()),
        lines.join("\n"),
        json!({ "correction_ids": ids }),
    );
    dispatch_best_effort(deps.notifier.as_ref(), notification).await;

    Ok(overdue.len())
}
