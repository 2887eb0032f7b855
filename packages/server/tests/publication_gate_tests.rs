//! Publishing is blocked until a required peer review has been approved.

mod common;

use chrono::Utc;
use common::*;
use factcheck_core::common::{FactCheckId, MemberId};
use factcheck_core::domains::fact_checks::actions::publish_fact_check;
use factcheck_core::domains::fact_checks::models::FactCheckStatus;
use factcheck_core::domains::fact_checks::PublicationError;
use factcheck_core::domains::peer_review::actions::{
    open_session, request_review, submit_decision, sweep_escalations,
};
use factcheck_core::domains::peer_review::models::TriggerKind;
use factcheck_core::kernel::TestDependencies;

#[tokio::test]
async fn untriggered_draft_publishes_directly() {
    let test = TestDependencies::new();
    let deps = test.server_deps();
    seed_default_triggers(&deps).await;
    let fact_check = create_draft(&deps, MemberId::new(), &["weather"], 40).await;
    let now = Utc::now();

    let published = publish_fact_check(fact_check.id, now, &deps).await.unwrap();

    assert_eq!(published.status, FactCheckStatus::Published);
    assert_eq!(published.published_at, Some(now));
}

#[tokio::test]
async fn triggered_draft_without_review_is_blocked() {
    let test = TestDependencies::new();
    let deps = test.server_deps();
    seed_default_triggers(&deps).await;
    let fact_check = create_health_claim(&deps, MemberId::new()).await;

    let err = publish_fact_check(fact_check.id, Utc::now(), &deps)
        .await
        .unwrap_err();

    match err {
        PublicationError::ReviewRequired { fired } => {
            assert_eq!(fired, vec![TriggerKind::HealthClaim])
        }
        other => panic!("expected ReviewRequired, got {other:?}"),
    }
    let stored = deps.fact_checks.find_fact_check(fact_check.id).await.unwrap().unwrap();
    assert_eq!(stored.status, FactCheckStatus::Draft);
}

#[tokio::test]
async fn pending_review_blocks_publication() {
    let test = TestDependencies::new();
    let deps = test.server_deps();
    seed_default_triggers(&deps).await;
    let fact_check = create_health_claim(&deps, MemberId::new()).await;
    let session = request_review(fact_check.id, reviewers(2), &deps)
        .await
        .unwrap()
        .session
        .unwrap();

    let err = publish_fact_check(fact_check.id, Utc::now(), &deps)
        .await
        .unwrap_err();

    assert!(matches!(err, PublicationError::ReviewPending(id) if id == session.id));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn rejected_review_blocks_publication() {
    let test = TestDependencies::new();
    let deps = test.server_deps();
    seed_default_triggers(&deps).await;
    let fact_check = create_health_claim(&deps, MemberId::new()).await;
    let panel = reviewers(2);
    let session = request_review(fact_check.id, panel.clone(), &deps)
        .await
        .unwrap()
        .session
        .unwrap();
    submit_decision(session.id, panel[1], false, None, &deps)
        .await
        .unwrap();

    let err = publish_fact_check(fact_check.id, Utc::now(), &deps)
        .await
        .unwrap_err();

    assert!(matches!(err, PublicationError::ReviewRejected(_)));
}

#[tokio::test]
async fn escalated_review_blocks_publication() {
    let test = TestDependencies::new();
    let deps = test.server_deps();
    seed_default_triggers(&deps).await;
    let fact_check = create_health_claim(&deps, MemberId::new()).await;
    let session = request_review(fact_check.id, reviewers(1), &deps)
        .await
        .unwrap()
        .session
        .unwrap();
    sweep_escalations(&deps, days_after(session.created_at, 8))
        .await
        .unwrap();

    let err = publish_fact_check(fact_check.id, Utc::now(), &deps)
        .await
        .unwrap_err();

    assert!(matches!(err, PublicationError::ReviewEscalated(_)));
}

#[tokio::test]
async fn approved_review_allows_publication() {
    let test = TestDependencies::new();
    let deps = test.server_deps();
    seed_default_triggers(&deps).await;
    let fact_check = create_health_claim(&deps, MemberId::new()).await;
    let panel = reviewers(2);
    let session = request_review(fact_check.id, panel.clone(), &deps)
        .await
        .unwrap()
        .session
        .unwrap();
    for reviewer in &panel {
        submit_decision(session.id, *reviewer, true, None, &deps)
            .await
            .unwrap();
    }

    let published = publish_fact_check(fact_check.id, Utc::now(), &deps)
        .await
        .unwrap();

    assert_eq!(published.status, FactCheckStatus::Published);
}

#[tokio::test]
async fn latest_round_decides_after_rejection() {
    let test = TestDependencies::new();
    let deps = test.server_deps();
    seed_default_triggers(&deps).await;
    let fact_check = create_health_claim(&deps, MemberId::new()).await;

    let first_panel = reviewers(1);
    let first = open_session(fact_check.id, vec![TriggerKind::HealthClaim], first_panel.clone(), &deps)
        .await
        .unwrap();
    submit_decision(first.id, first_panel[0], false, None, &deps)
        .await
        .unwrap();

    let second_panel = reviewers(1);
    let second = open_session(fact_check.id, vec![TriggerKind::HealthClaim], second_panel.clone(), &deps)
        .await
        .unwrap();
    submit_decision(second.id, second_panel[0], true, None, &deps)
        .await
        .unwrap();

    assert!(publish_fact_check(fact_check.id, Utc::now(), &deps).await.is_ok());
}

#[tokio::test]
async fn cannot_publish_twice() {
    let test = TestDependencies::new();
    let deps = test.server_deps();
    let fact_check = create_draft(&deps, MemberId::new(), &[], 0).await;
    publish_fact_check(fact_check.id, Utc::now(), &deps).await.unwrap();

    let err = publish_fact_check(fact_check.id, Utc::now(), &deps)
        .await
        .unwrap_err();

    assert!(matches!(err, PublicationError::AlreadyPublished(_)));
}

#[tokio::test]
async fn unknown_fact_check_cannot_be_published() {
    let test = TestDependencies::new();
    let deps = test.server_deps();

    let err = publish_fact_check(FactCheckId::new(), Utc::now(), &deps)
        .await
        .unwrap_err();

    assert!(matches!(err, PublicationError::FactCheckNotFound(_)));
}
