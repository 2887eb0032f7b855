//! Fact-check actions: drafting and the publication gate.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::common::FactCheckId;
use crate::domains::fact_checks::errors::PublicationError;
use crate::domains::fact_checks::models::{FactCheck, FactCheckStatus, NewFactCheck};
use crate::domains::peer_review::models::ReviewStatus;
use crate::domains::peer_review::{evaluate_triggers, TriggerResult};
use crate::kernel::ServerDeps;

pub async fn create_fact_check(input: NewFactCheck, deps: &ServerDeps) -> Result<FactCheck> {
    let fact_check = deps
        .fact_checks
        .insert_fact_check(&FactCheck::draft(input, Utc::now()))
        .await?;
    info!(fact_check_id = %fact_check.id, title = %fact_check.title, "Created fact-check draft");
    Ok(fact_check)
}

/// Publish a draft if peer review allows it.
///
/// When any active trigger fires, the most recent review session for the
/// fact-check must have been approved.
pub async fn publish_fact_check(
    fact_check_id: FactCheckId,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<FactCheck, PublicationError> {
    let fact_check = deps
        .fact_checks
        .find_fact_check(fact_check_id)
        .await?
        .ok_or(PublicationError::FactCheckNotFound(fact_check_id))?;

    if fact_check.status != FactCheckStatus::Draft {
        return Err(PublicationError::AlreadyPublished(fact_check_id));
    }

    let triggers = deps.reviews.active_triggers().await?;
    let evaluation = evaluate_triggers(&fact_check.claim_metadata(), &triggers);
    check_review_gate(fact_check_id, &evaluation, deps).await?;

    let published = deps
        .fact_checks
        .mark_published(fact_check_id, now)
        .await?
        .ok_or(PublicationError::AlreadyPublished(fact_check_id))?;

    info!(
        fact_check_id = %fact_check_id,
        reviewed = evaluation.review_required(),
        "Published fact-check"
    );
    Ok(published)
}

async fn check_review_gate(
    fact_check_id: FactCheckId,
    evaluation: &TriggerResult,
    deps: &ServerDeps,
) -> Result<(), PublicationError> {
    if !evaluation.review_required() {
        return Ok(());
    }

    let Some(session) = deps.reviews.find_latest_session(fact_check_id).await? else {
        return Err(PublicationError::ReviewRequired {
            fired: evaluation.kinds(),
        });
    };

    match session.status {
        ReviewStatus::Approved => Ok(()),
        ReviewStatus::Pending => Err(PublicationError::ReviewPending(session.id)),
        ReviewStatus::Rejected => Err(PublicationError::ReviewRejected(session.id)),
        ReviewStatus::Escalated => Err(PublicationError::ReviewEscalated(session.id)),
    }
}
