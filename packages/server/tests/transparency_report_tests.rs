//! Monthly transparency report generation over in-memory workflow data.

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::*;
use factcheck_core::common::{MemberId, ReportingPeriod};
use factcheck_core::domains::corrections::models::{CorrectionRequest, CorrectionType};
use factcheck_core::domains::fact_checks::actions::publish_fact_check;
use factcheck_core::domains::peer_review::models::{ReviewSession, ReviewStatus, TriggerKind};
use factcheck_core::domains::transparency::actions::{find_report, generate_monthly_report};
use factcheck_core::kernel::{NotificationKind, TestDependencies};

#[tokio::test]
async fn report_aggregates_the_month() {
    let test = TestDependencies::new();
    let deps = test.server_deps();
    let period = ReportingPeriod::month(2026, 3).unwrap();
    let mid_march = Utc.with_ymd_and_hms(2026, 3, 12, 10, 0, 0).unwrap();
    let window = deps.policy.review_deadline;

    // Two fact-checks published in March, one in April
    for published_at in [mid_march, mid_march + Duration::days(3), period.end] {
        let draft = create_draft(&deps, MemberId::new(), &[], 0).await;
        publish_fact_check(draft.id, published_at, &deps).await.unwrap();
    }

    let subject = create_draft(&deps, MemberId::new(), &[], 0).await;
    let sessions = [
        ReviewSession::open(
            subject.id,
            vec![TriggerKind::HealthClaim, TriggerKind::HighEngagement],
            reviewers(2),
            mid_march,
            window,
        )
        .closed(ReviewStatus::Approved, mid_march + Duration::days(2)),
        ReviewSession::open(
            subject.id,
            vec![TriggerKind::PoliticalTopic],
            reviewers(1),
            mid_march + Duration::days(1),
            window,
        )
        .closed(ReviewStatus::Escalated, mid_march + Duration::days(8)),
        // Opened in February, outside the period
        ReviewSession::open(
            subject.id,
            vec![TriggerKind::HealthClaim],
            reviewers(1),
            period.start - Duration::days(3),
            window,
        )
        .closed(ReviewStatus::Rejected, period.start),
    ];
    for session in sessions {
        test.store.put_session(session);
    }

    let sla = deps.policy.correction_sla;
    let substantial = CorrectionRequest::receive(
        correction_form(&subject, CorrectionType::Substantial),
        mid_march,
        sla,
    );
    let minor = CorrectionRequest::receive(
        correction_form(&subject, CorrectionType::Minor),
        mid_march,
        sla,
    );
    test.store.put_correction(substantial);
    test.store.put_correction(minor);

    let generated_at = Utc.with_ymd_and_hms(2026, 4, 1, 2, 0, 0).unwrap();
    let report = generate_monthly_report(period, generated_at, &deps)
        .await
        .unwrap();

    assert_eq!(report.period(), period);
    assert_eq!(report.fact_checks_published, 2);
    assert_eq!(report.reviews_opened, 2);
    assert_eq!(report.reviews_approved, 1);
    assert_eq!(report.reviews_escalated, 1);
    assert_eq!(report.reviews_rejected, 0);
    assert_eq!(report.trigger_counts.0[&TriggerKind::HealthClaim], 1);
    assert_eq!(report.trigger_counts.0[&TriggerKind::HighEngagement], 1);
    assert_eq!(report.trigger_counts.0[&TriggerKind::PoliticalTopic], 1);
    assert_eq!(report.trigger_counts.0[&TriggerKind::ManualFlag], 0);
    assert_eq!(report.corrections_received, 2);
    assert_eq!(report.corrections_substantial, 1);
    assert_eq!(report.corrections_minor, 1);
    assert_eq!(report.corrections_overdue, 2);
    assert_eq!(report.sla_compliance(), None);

    let ready = test
        .notifier
        .sent_of_kind(NotificationKind::TransparencyReportReady);
    assert_eq!(ready.len(), 1);
    assert!(ready[0].subject.contains("2026-03"));
}

#[tokio::test]
async fn empty_month_produces_zeroed_report() {
    let test = TestDependencies::new();
    let deps = test.server_deps();
    let period = ReportingPeriod::month(2025, 12).unwrap();

    let report = generate_monthly_report(period, Utc::now(), &deps)
        .await
        .unwrap();

    assert_eq!(report.fact_checks_published, 0);
    assert_eq!(report.reviews_opened, 0);
    assert_eq!(report.corrections_received, 0);
    assert_eq!(report.trigger_counts.0.len(), TriggerKind::ALL.len());
}

#[tokio::test]
async fn regenerating_replaces_the_stored_report() {
    let test = TestDependencies::new();
    let deps = test.server_deps();
    let period = ReportingPeriod::month(2026, 5).unwrap();

    let first = generate_monthly_report(period, Utc::now(), &deps)
        .await
        .unwrap();

    let draft = create_draft(&deps, MemberId::new(), &[], 0).await;
    publish_fact_check(draft.id, period.start + Duration::hours(1), &deps)
        .await
        .unwrap();
    let second = generate_monthly_report(period, Utc::now(), &deps)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    let stored = find_report(period, &deps).await.unwrap().unwrap();
    assert_eq!(stored.fact_checks_published, 1);
}

#[tokio::test]
async fn missing_report_is_none() {
    let test = TestDependencies::new();
    let deps = test.server_deps();

    let report = find_report(ReportingPeriod::month(2024, 1).unwrap(), &deps)
        .await
        .unwrap();

    assert!(report.is_none());
}
