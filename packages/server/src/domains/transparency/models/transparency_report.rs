use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;

use crate::common::{ReportingPeriod, TransparencyReportId};
use crate::domains::corrections::models::{CorrectionRequest, CorrectionStatus, CorrectionType};
use crate::domains::peer_review::models::{ReviewSession, ReviewStatus, TriggerKind};

/// Monthly EFCSN transparency figures. One row per period.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TransparencyReport {
    pub id: TransparencyReportId,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub fact_checks_published: i64,
    pub reviews_opened: i64,
    pub reviews_approved: i64,
    pub reviews_rejected: i64,
    pub reviews_escalated: i64,
    pub reviews_pending: i64,
    /// Sessions opened per trigger kind (a session can count under several)
    pub trigger_counts: Json<BTreeMap<TriggerKind, i64>>,
    pub corrections_received: i64,
    pub corrections_minor: i64,
    pub corrections_update: i64,
    pub corrections_substantial: i64,
    pub corrections_resolved: i64,
    pub corrections_resolved_within_sla: i64,
    pub corrections_overdue: i64,
    pub generated_at: DateTime<Utc>,
}

impl TransparencyReport {
    /// Aggregate the period's review sessions and correction requests.
    ///
    /// `sessions` and `corrections` must already be limited to those opened or
    /// received inside `period`; anything outside it is ignored anyway.
    /// Overdue corrections are judged at `generated_at`.
    pub fn build(
        period: ReportingPeriod,
        sessions: &[ReviewSession],
        corrections: &[CorrectionRequest],
        fact_checks_published: i64,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut report = Self {
            id: TransparencyReportId::new(),
            period_start: period.start,
            period_end: period.end,
            fact_checks_published,
            reviews_opened: 0,
            reviews_approved: 0,
            reviews_rejected: 0,
            reviews_escalated: 0,
            reviews_pending: 0,
            trigger_counts: Json(TriggerKind::ALL.iter().map(|k| (*k, 0)).collect()),
            corrections_received: 0,
            corrections_minor: 0,
            corrections_update: 0,
            corrections_substantial: 0,
            corrections_resolved: 0,
            corrections_resolved_within_sla: 0,
            corrections_overdue: 0,
            generated_at,
        };

        for session in sessions.iter().filter(|s| period.contains(s.created_at)) {
            report.reviews_opened += 1;
            match session.status {
                ReviewStatus::Pending => report.reviews_pending += 1,
                ReviewStatus::Approved => report.reviews_approved += 1,
                ReviewStatus::Rejected => report.reviews_rejected += 1,
                ReviewStatus::Escalated => report.reviews_escalated += 1,
            }

            let mut kinds = session.trigger_reasons.clone();
            kinds.sort();
            kinds.dedup();
            for kind in kinds {
                *report.trigger_counts.0.entry(kind).or_insert(0) += 1;
            }
        }

        for correction in corrections.iter().filter(|c| period.contains(c.received_at)) {
            report.corrections_received += 1;
            match correction.correction_type {
                CorrectionType::Minor => report.corrections_minor += 1,
                CorrectionType::Update => report.corrections_update += 1,
                CorrectionType::Substantial => report.corrections_substantial += 1,
            }
            match correction.status {
                CorrectionStatus::Resolved => {
                    report.corrections_resolved += 1;
                    if correction.resolved_within_sla() {
                        report.corrections_resolved_within_sla += 1;
                    }
                }
                CorrectionStatus::Open => {
                    if correction.is_overdue(generated_at) {
                        report.corrections_overdue += 1;
                    }
                }
            }
        }

        report
    }

    pub fn period(&self) -> ReportingPeriod {
        ReportingPeriod {
            start: self.period_start,
            end: self.period_end,
        }
    }

    /// Share of resolved corrections answered within the SLA, if any were resolved
    pub fn sla_compliance(&self) -> Option<f64> {
        (self.corrections_resolved > 0).then(|| {
            self.corrections_resolved_within_sla as f64 / self.corrections_resolved as f64
        })
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl TransparencyReport {
    /// Insert, replacing any earlier report for the same period
    pub async fn upsert(&self, pool: &PgPool) -> Result<Self> {
        let report = sqlx::query_as::<_, TransparencyReport>(
            r#"
            INSERT INTO transparency_reports (
                id, period_start, period_end, fact_checks_published,
                reviews_opened, reviews_approved, reviews_rejected, reviews_escalated,
                reviews_pending, trigger_counts, corrections_received, corrections_minor,
                corrections_update, corrections_substantial, corrections_resolved,
                corrections_resolved_within_sla, corrections_overdue, generated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ON CONFLICT (period_start) DO UPDATE
            SET
                period_end = EXCLUDED.period_end,
                fact_checks_published = EXCLUDED.fact_checks_published,
                reviews_opened = EXCLUDED.reviews_opened,
                reviews_approved = EXCLUDED.reviews_approved,
                reviews_rejected = EXCLUDED.reviews_rejected,
                reviews_escalated = EXCLUDED.reviews_escalated,
                reviews_pending = EXCLUDED.reviews_pending,
                trigger_counts = EXCLUDED.trigger_counts,
                corrections_received = EXCLUDED.corrections_received,
                corrections_minor = EXCLUDED.corrections_minor,
                corrections_update = EXCLUDED.corrections_update,
                corrections_substantial = EXCLUDED.corrections_substantial,
                corrections_resolved = EXCLUDED.corrections_resolved,
                corrections_resolved_within_sla = EXCLUDED.corrections_resolved_within_sla,
                corrections_overdue = EXCLUDED.corrections_overdue,
                generated_at = EXCLUDED.generated_at
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.period_start)
        .bind(self.period_end)
        .bind(self.fact_checks_published)
        .bind(self.reviews_opened)
        .bind(self.reviews_approved)
        .bind(self.reviews_rejected)
        .bind(self.reviews_escalated)
        .bind(self.reviews_pending)
        .bind(&self.trigger_counts)
        .bind(self.corrections_received)
        .bind(self.corrections_minor)
        .bind(self.corrections_update)
        .bind(self.corrections_substantial)
        .bind(self.corrections_resolved)
        .bind(self.corrections_resolved_within_sla)
        .bind(self.corrections_overdue)
        .bind(self.generated_at)
        .fetch_one(pool)
        .await?;
        Ok(report)
    }

    pub async fn find_by_period_start(
        period_start: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let report = sqlx::query_as::<_, TransparencyReport>(
            "SELECT * FROM transparency_reports WHERE period_start = $1",
        )
        .bind(period_start)
        .fetch_optional(pool)
        .await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{FactCheckId, MemberId};
    use crate::domains::corrections::models::{CorrectionResolution, NewCorrectionRequest};
    use chrono::{Duration, TimeZone};

    fn march() -> ReportingPeriod {
        ReportingPeriod::month(2026, 3).unwrap()
    }

    fn session(at: DateTime<Utc>, reasons: Vec<TriggerKind>, status: ReviewStatus) -> ReviewSession {
        ReviewSession::open(
            FactCheckId::new(),
            reasons,
            vec![MemberId::new()],
            at,
            Duration::days(7),
        )
        .closed(status, at + Duration::days(1))
    }

    fn correction(kind: CorrectionType, at: DateTime<Utc>) -> CorrectionRequest {
        CorrectionRequest::receive(
            NewCorrectionRequest {
                fact_check_id: FactCheckId::new(),
                correction_type: kind,
                requester_email: None,
                description: "wrong figure".to_string(),
            },
            at,
            Duration::days(7),
        )
    }

    fn resolve(c: CorrectionRequest, after: Duration) -> CorrectionRequest {
        let resolution = CorrectionResolution {
            correction_id: c.id,
            resolved_by: MemberId::new(),
            note: "fixed".to_string(),
            resolved_at: c.received_at + after,
        };
        c.resolved(&resolution)
    }

    #[test]
    fn counts_sessions_by_outcome_and_trigger() {
        let day = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let sessions = vec![
            session(day, vec![TriggerKind::HealthClaim], ReviewStatus::Approved),
            session(
                day,
                vec![TriggerKind::HealthClaim, TriggerKind::HighEngagement],
                ReviewStatus::Rejected,
            ),
            session(day, vec![TriggerKind::ManualFlag], ReviewStatus::Escalated),
            session(day, vec![TriggerKind::PoliticalTopic], ReviewStatus::Pending),
            // February, outside the period
            session(day - Duration::days(30), vec![TriggerKind::HealthClaim], ReviewStatus::Approved),
        ];

        let report = TransparencyReport::build(march(), &sessions, &[], 12, day);

        assert_eq!(report.fact_checks_published, 12);
        assert_eq!(report.reviews_opened, 4);
        assert_eq!(report.reviews_approved, 1);
        assert_eq!(report.reviews_rejected, 1);
        assert_eq!(report.reviews_escalated, 1);
        assert_eq!(report.reviews_pending, 1);
        assert_eq!(report.trigger_counts.0[&TriggerKind::HealthClaim], 2);
        assert_eq!(report.trigger_counts.0[&TriggerKind::HighEngagement], 1);
        assert_eq!(report.trigger_counts.0[&TriggerKind::PoliticalTopic], 1);
    }

    #[test]
    fn counts_corrections_and_sla_compliance() {
        let received = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let generated_at = Utc.with_ymd_and_hms(2026, 4, 1, 2, 0, 0).unwrap();
        let corrections = vec![
            resolve(correction(CorrectionType::Minor, received), Duration::days(1)),
            resolve(correction(CorrectionType::Update, received), Duration::days(10)),
            correction(CorrectionType::Substantial, received),
            correction(CorrectionType::Minor, generated_at - Duration::days(2)),
        ];

        let report = TransparencyReport::build(march(), &[], &corrections, 0, generated_at);

        assert_eq!(report.corrections_received, 4);
        assert_eq!(report.corrections_minor, 2);
        assert_eq!(report.corrections_update, 1);
        assert_eq!(report.corrections_substantial, 1);
        assert_eq!(report.corrections_resolved, 2);
        assert_eq!(report.corrections_resolved_within_sla, 1);
        assert_eq!(report.corrections_overdue, 1);
        assert_eq!(report.sla_compliance(), Some(0.5));
    }

    #[test]
    fn empty_month_has_zeroed_trigger_counts() {
        let report = TransparencyReport::build(march(), &[], &[], 0, Utc::now());
        assert_eq!(report.trigger_counts.0.len(), TriggerKind::ALL.len());
        assert!(report.trigger_counts.0.values().all(|count| *count == 0));
        assert_eq!(report.sla_compliance(), None);
    }
}
