use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::common::{MemberId, ReviewSessionId};
use crate::domains::peer_review::errors::PeerReviewError;
use crate::domains::peer_review::models::{DecisionInput, DecisionOutcome, ReviewStatus};
use crate::kernel::notifier::{dispatch_best_effort, Notification, NotificationKind};
use crate::kernel::ServerDeps;

/// Record a reviewer's decision and return the session status afterwards.
///
/// The caller has already checked that `reviewer_id` is an eligible reviewer.
pub async fn submit_decision(
    session_id: ReviewSessionId,
    reviewer_id: MemberId,
    approve: bool,
    comment: Option<String>,
    deps: &ServerDeps,
) -> Result<ReviewStatus, PeerReviewError> {
    let input = DecisionInput {
        reviewer_id,
        approve,
        comment,
    };
    let outcome = deps
        .reviews
        .record_decision(session_id, input, Utc::now())
        .await?;

    info!(
        session_id = %session_id,
        reviewer_id = %reviewer_id,
        approve = approve,
        status = %outcome.status,
        "Review decision recorded"
    );

    if outcome.closed_session() {
        notify_closed(session_id, &outcome, deps).await;
    }

    Ok(outcome.status)
}

async fn notify_closed(session_id: ReviewSessionId, outcome: &DecisionOutcome, deps: &ServerDeps) {
    let (kind, verdict) = match outcome.status {
        ReviewStatus::Approved => (NotificationKind::ReviewApproved, "approved"),
        ReviewStatus::Rejected => (NotificationKind::ReviewRejected, "rejected"),
        // Escalation is only reached through the sweep
        ReviewStatus::Pending | ReviewStatus::Escalated => return,
    };

    let notification = Notification::new(
        kind,
        format!("Peer review {}", verdict),
        format!(
            "Review session {} was {} after reviewer {} decided.",
            session_id, verdict, outcome.decision.reviewer_id
        ),
        json!({
            "session_id": session_id,
            "status": outcome.status,
            "decided_by": outcome.decision.reviewer_id,
        }),
    );
    dispatch_best_effort(deps.notifier.as_ref(), notification).await;
}
