//! Consensus resolution for a review round.
//!
//! Recomputed from the full decision list every time; there is no incremental
//! state. A single rejection closes the round. Approval needs every assigned
//! reviewer to approve.

use std::collections::HashSet;

use super::models::{ReviewDecision, ReviewStatus};
use crate::common::MemberId;

pub fn resolve(reviewer_ids: &[MemberId], decisions: &[ReviewDecision]) -> ReviewStatus {
    let assigned: HashSet<MemberId> = reviewer_ids.iter().copied().collect();

    // Decisions from anyone outside the panel never count
    let counted = decisions.iter().filter(|d| assigned.contains(&d.reviewer_id));

    let mut approvals = HashSet::new();
    for decision in counted {
        if !decision.approve {
            return ReviewStatus::Rejected;
        }
        approvals.insert(decision.reviewer_id);
    }

    if !assigned.is_empty() && approvals.len() == assigned.len() {
        ReviewStatus::Approved
    } else {
        ReviewStatus::Pending
    }
}
