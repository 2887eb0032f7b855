use chrono::Utc;
use tracing::info;

use crate::common::{FactCheckId, MemberId};
use crate::domains::fact_checks::models::FactCheck;
use crate::domains::peer_review::errors::PeerReviewError;
use crate::domains::peer_review::models::{ReviewSession, TriggerKind};
use crate::domains::peer_review::triggers::{evaluate_triggers, TriggerResult};
use crate::kernel::ServerDeps;

/// Result of `request_review`: why review was (or was not) required
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub triggers: TriggerResult,
    /// `None` when no trigger fired
    pub session: Option<ReviewSession>,
}

async fn load_fact_check(
    fact_check_id: FactCheckId,
    deps: &ServerDeps,
) -> Result<FactCheck, PeerReviewError> {
    deps.fact_checks
        .find_fact_check(fact_check_id)
        .await?
        .ok_or(PeerReviewError::FactCheckNotFound(fact_check_id))
}

/// Evaluate the active triggers against a fact-check's claim metadata.
pub async fn evaluate_fact_check(
    fact_check: &FactCheck,
    deps: &ServerDeps,
) -> Result<TriggerResult, PeerReviewError> {
    let triggers = deps.reviews.active_triggers().await?;
    Ok(evaluate_triggers(&fact_check.claim_metadata(), &triggers))
}

/// Open a pending review round.
///
/// Reviewer ids are de-duplicated (first occurrence wins). The fact-check's
/// author and original submitter can never sit on its panel.
pub async fn open_session(
    fact_check_id: FactCheckId,
    trigger_reasons: Vec<TriggerKind>,
    reviewer_ids: Vec<MemberId>,
    deps: &ServerDeps,
) -> Result<ReviewSession, PeerReviewError> {
    let fact_check = load_fact_check(fact_check_id, deps).await?;

    let mut panel: Vec<MemberId> = Vec::with_capacity(reviewer_ids.len());
    for reviewer_id in reviewer_ids {
        if !panel.contains(&reviewer_id) {
            panel.push(reviewer_id);
        }
    }

    if panel.is_empty() {
        return Err(PeerReviewError::NoReviewers);
    }
    if let Some(conflicted) = panel.iter().find(|r| fact_check.is_conflicted(**r)) {
        return Err(PeerReviewError::SelfReview {
            fact_check_id,
            reviewer_id: *conflicted,
        });
    }
    if let Some(pending) = deps.reviews.find_pending_session(fact_check_id).await? {
        return Err(PeerReviewError::SessionAlreadyOpen {
            fact_check_id,
            session_id: pending.id,
        });
    }

    let session = ReviewSession::open(
        fact_check_id,
        trigger_reasons,
        panel,
        Utc::now(),
        deps.policy.review_deadline,
    );
    let session = deps.reviews.insert_session(&session).await?;

    info!(
        session_id = %session.id,
        fact_check_id = %fact_check_id,
        reviewers = session.reviewer_ids.len(),
        deadline = %session.deadline,
        "Opened peer review session"
    );

    Ok(session)
}

/// Evaluate triggers and open a round with the fired kinds as reasons.
pub async fn request_review(
    fact_check_id: FactCheckId,
    reviewer_ids: Vec<MemberId>,
    deps: &ServerDeps,
) -> Result<ReviewRequest, PeerReviewError> {
    let fact_check = load_fact_check(fact_check_id, deps).await?;
    let triggers = evaluate_fact_check(&fact_check, deps).await?;

    if !triggers.review_required() {
        info!(fact_check_id = %fact_check_id, "No review trigger fired");
        return Ok(ReviewRequest {
            triggers,
            session: None,
        });
    }

    info!(
        fact_check_id = %fact_check_id,
        fired = ?triggers.kinds(),
        "Peer review required"
    );

    let session = open_session(fact_check_id, triggers.kinds(), reviewer_ids, deps).await?;
    Ok(ReviewRequest {
        triggers,
        session: Some(session),
    })
}
