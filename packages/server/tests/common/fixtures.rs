//! Test fixtures for creating test data.
//!
//! These fixtures go through the workflow actions so the stored state matches
//! what production code would produce.

use chrono::{DateTime, Utc};
use factcheck_core::common::MemberId;
use factcheck_core::domains::corrections::models::{CorrectionType, NewCorrectionRequest};
use factcheck_core::domains::fact_checks::actions::create_fact_check;
use factcheck_core::domains::fact_checks::models::{FactCheck, NewFactCheck};
use factcheck_core::domains::peer_review::actions::save_trigger;
use factcheck_core::domains::peer_review::models::{ReviewTrigger, TriggerKind};
use factcheck_core::kernel::ServerDeps;

/// View count at which the default high-engagement trigger fires
pub const ENGAGEMENT_THRESHOLD: i64 = 10_000;

/// The four EFCSN triggers as a newsroom would typically configure them
pub async fn seed_default_triggers(deps: &ServerDeps) -> Vec<ReviewTrigger> {
    let admin = MemberId::new();
    let triggers = vec![
        ReviewTrigger::new(TriggerKind::PoliticalTopic, None)
            .with_topic_tags(["politics", "election"]),
        ReviewTrigger::new(TriggerKind::HealthClaim, None).with_topic_tags(["health", "vaccines"]),
        ReviewTrigger::new(TriggerKind::HighEngagement, None)
            .with_threshold(ENGAGEMENT_THRESHOLD),
        ReviewTrigger::new(TriggerKind::ManualFlag, None),
    ];

    let mut saved = Vec::with_capacity(triggers.len());
    for trigger in triggers {
        saved.push(
            save_trigger(trigger, admin, deps)
                .await
                .expect("Failed to save trigger"),
        );
    }
    saved
}

/// Create a draft fact-check by `author` with the given tags and views
pub async fn create_draft(
    deps: &ServerDeps,
    author: MemberId,
    tags: &[&str],
    view_count: i64,
) -> FactCheck {
    let input = NewFactCheck::builder()
        .title("Claim about local water supply")
        .author_id(author)
        .topic_tags(tags.iter().map(|t| t.to_string()).collect::<Vec<_>>())
        .view_count(view_count)
        .build();
    create_fact_check(input, deps)
        .await
        .expect("Failed to create fact-check")
}

/// Create a draft that trips the health-claim trigger
pub async fn create_health_claim(deps: &ServerDeps, author: MemberId) -> FactCheck {
    create_draft(deps, author, &["health"], 250).await
}

pub fn correction_form(fact_check: &FactCheck, correction_type: CorrectionType) -> NewCorrectionRequest {
    NewCorrectionRequest {
        fact_check_id: fact_check.id,
        correction_type,
        requester_email: Some("reader@example.org".to_string()),
        description: "The cited study was retracted in 2024.".to_string(),
    }
}

pub fn reviewers(n: usize) -> Vec<MemberId> {
    (0..n).map(|_| MemberId::new()).collect()
}

pub fn days_after(at: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    at + chrono::Duration::days(days)
}
