use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::common::ReviewSessionId;
use crate::domains::peer_review::models::ReviewSession;
use crate::kernel::notifier::{dispatch_best_effort, Notification, NotificationKind};
use crate::kernel::ServerDeps;

/// Outcome of one escalation sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub examined: usize,
    pub escalated: Vec<ReviewSessionId>,
    pub failed: Vec<ReviewSessionId>,
}

/// Escalate every pending session at or past its deadline.
///
/// Safe to run repeatedly: already-escalated sessions are no longer pending
/// and are not picked up again. A failure on one session is logged and the
/// sweep moves on to the next.
pub async fn sweep_escalations(deps: &ServerDeps, now: DateTime<Utc>) -> Result<SweepReport> {
    let overdue = deps.reviews.find_overdue_sessions(now).await?;

    let mut report = SweepReport {
        examined: overdue.len(),
        ..Default::default()
    };

    for session in overdue {
        match deps.reviews.escalate_session(session.id, now).await {
            Ok(Some(escalated)) => {
                info!(
                    session_id = %escalated.id,
                    fact_check_id = %escalated.fact_check_id,
                    deadline = %escalated.deadline,
                    "Escalated overdue review session"
                );
                notify_escalated(&escalated, deps).await;
                report.escalated.push(escalated.id);
            }
            // Closed by a decision between the query and the update
            Ok(None) => {}
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "Failed to escalate review session");
                report.failed.push(session.id);
            }
        }
    }

    info!(
        examined = report.examined,
        escalated = report.escalated.len(),
        failed = report.failed.len(),
        "Escalation sweep complete"
    );
    Ok(report)
}

async fn notify_escalated(session: &ReviewSession, deps: &ServerDeps) {
    let notification = Notification::new(
        NotificationKind::ReviewEscalated,
        "Peer review escalated",
        format!(
            "Review session {} for fact-check {} passed its deadline ({}) without consensus.",
            session.id, session.fact_check_id, session.deadline
        ),
        json!({
            "session_id": session.id,
            "fact_check_id": session.fact_check_id,
            "deadline": session.deadline,
            "reviewer_ids": session.reviewer_ids,
        }),
    );
    dispatch_best_effort(deps.notifier.as_ref(), notification).await;
}
