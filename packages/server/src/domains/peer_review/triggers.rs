//! Review trigger evaluation.
//!
//! Pure function of the claim metadata and the trigger configuration. All
//! firing triggers are returned so the audit trail records every reason.

use serde::{Deserialize, Serialize};

use super::models::{ReviewTrigger, TriggerKind};
use crate::common::ReviewTriggerId;

/// Claim attributes that can make peer review mandatory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimMetadata {
    pub topic_tags: Vec<String>,
    pub view_count: i64,
    pub manual_flag: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredTrigger {
    pub trigger_id: ReviewTriggerId,
    pub kind: TriggerKind,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerResult {
    pub fired: Vec<FiredTrigger>,
}

impl TriggerResult {
    pub fn review_required(&self) -> bool {
        !self.fired.is_empty()
    }

    /// Distinct fired kinds in evaluation order
    pub fn kinds(&self) -> Vec<TriggerKind> {
        let mut kinds = Vec::new();
        for fired in &self.fired {
            if !kinds.contains(&fired.kind) {
                kinds.push(fired.kind);
            }
        }
        kinds
    }
}

pub fn evaluate_triggers(claim: &ClaimMetadata, triggers: &[ReviewTrigger]) -> TriggerResult {
    let fired = triggers
        .iter()
        .filter(|trigger| trigger.active)
        .filter_map(|trigger| {
            fire_reason(claim, trigger).map(|reason| FiredTrigger {
                trigger_id: trigger.id,
                kind: trigger.kind,
                reason,
            })
        })
        .collect();

    TriggerResult { fired }
}

fn fire_reason(claim: &ClaimMetadata, trigger: &ReviewTrigger) -> Option<String> {
    match trigger.kind {
        TriggerKind::PoliticalTopic | TriggerKind::HealthClaim => {
            matching_tag(&claim.topic_tags, &trigger.topic_tags)
                .map(|tag| format!("{} topic tag '{}'", trigger.kind, tag))
        }
        TriggerKind::HighEngagement => {
            let threshold = trigger.threshold?;
            (claim.view_count >= threshold)
                .then(|| format!("{} views (threshold {})", claim.view_count, threshold))
        }
        TriggerKind::ManualFlag => claim
            .manual_flag
            .then(|| "flagged for review by staff".to_string()),
    }
}

fn matching_tag<'a>(claim_tags: &'a [String], trigger_tags: &[String]) -> Option<&'a str> {
    claim_tags.iter().map(|t| t.trim()).find(|tag| {
        trigger_tags
            .iter()
            .any(|configured| configured.trim().eq_ignore_ascii_case(tag))
    })
}
