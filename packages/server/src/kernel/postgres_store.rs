//! Postgres-backed implementation of the store traits.
//!
//! SQL lives on the model types; this adapter owns transactions and maps
//! constraint violations onto domain errors.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::{BaseCorrectionStore, BaseFactCheckStore, BaseReportStore, BaseReviewStore};
use crate::common::{
    CorrectionRequestId, FactCheckId, MemberId, ReviewSessionId, ReviewTriggerId,
};
use crate::domains::corrections::models::{CorrectionRequest, CorrectionResolution};
use crate::domains::fact_checks::models::{FactCheck, FactCheckAmendment};
use crate::domains::peer_review::errors::PeerReviewError;
use crate::domains::peer_review::models::{
    DecisionInput, DecisionOutcome, ReviewDecision, ReviewSession, ReviewTrigger,
};
use crate::domains::transparency::models::TransparencyReport;

const ONE_PENDING_SESSION_INDEX: &str = "review_sessions_one_pending_per_fact_check";
const ONE_DECISION_PER_REVIEWER: &str = "review_decisions_session_reviewer_key";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(constraint)
        }
        _ => false,
    }
}

#[async_trait]
impl BaseFactCheckStore for PgStore {
    async fn insert_fact_check(&self, fact_check: &FactCheck) -> Result<FactCheck> {
        fact_check.insert(&self.pool).await
    }

    async fn find_fact_check(&self, id: FactCheckId) -> Result<Option<FactCheck>> {
        FactCheck::find_by_id(id, &self.pool).await
    }

    async fn mark_published(&self, id: FactCheckId, now: DateTime<Utc>) -> Result<Option<FactCheck>> {
        FactCheck::mark_published(id, now, &self.pool).await
    }

    async fn count_published_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<i64> {
        FactCheck::count_published_between(start, end, &self.pool).await
    }
}

#[async_trait]
impl BaseReviewStore for PgStore {
    async fn active_triggers(&self) -> Result<Vec<ReviewTrigger>> {
        ReviewTrigger::find_active(&self.pool).await
    }

    async fn save_trigger(&self, trigger: &ReviewTrigger) -> Result<ReviewTrigger> {
        trigger.upsert(&self.pool).await
    }

    async fn set_trigger_active(
        &self,
        id: ReviewTriggerId,
        active: bool,
        updated_by: MemberId,
    ) -> Result<Option<ReviewTrigger>> {
        ReviewTrigger::set_active(id, active, updated_by, &self.pool).await
    }

    async fn insert_session(&self, session: &ReviewSession) -> Result<ReviewSession, PeerReviewError> {
        match session.insert(&self.pool).await {
            Ok(inserted) => Ok(inserted),
            Err(e) if violates(&e, ONE_PENDING_SESSION_INDEX) => {
                let existing =
                    ReviewSession::find_pending_for_fact_check(session.fact_check_id, &self.pool)
                        .await?;
                Err(PeerReviewError::SessionAlreadyOpen {
                    fact_check_id: session.fact_check_id,
                    session_id: existing.map(|s| s.id).unwrap_or_else(ReviewSessionId::nil),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_session(&self, id: ReviewSessionId) -> Result<Option<ReviewSession>> {
        ReviewSession::find_by_id(id, &self.pool).await
    }

    async fn find_pending_session(&self, fact_check_id: FactCheckId) -> Result<Option<ReviewSession>> {
        ReviewSession::find_pending_for_fact_check(fact_check_id, &self.pool).await
    }

    async fn find_latest_session(&self, fact_check_id: FactCheckId) -> Result<Option<ReviewSession>> {
        ReviewSession::find_latest_for_fact_check(fact_check_id, &self.pool).await
    }

    async fn find_decisions(&self, session_id: ReviewSessionId) -> Result<Vec<ReviewDecision>> {
        ReviewDecision::find_by_session(session_id, &self.pool).await
    }

    async fn record_decision(
        &self,
        session_id: ReviewSessionId,
        input: DecisionInput,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, PeerReviewError> {
        let mut tx = self.pool.begin().await?;

        let session = ReviewSession::find_for_update(session_id, &mut *tx)
            .await?
            .ok_or(PeerReviewError::SessionNotFound(session_id))?;
        let existing = ReviewDecision::find_by_session(session_id, &mut *tx).await?;

        let outcome = session.plan_decision(&existing, input, now)?;

        if let Err(e) = outcome.decision.insert(&mut *tx).await {
            if violates(&e, ONE_DECISION_PER_REVIEWER) {
                return Err(PeerReviewError::DuplicateDecision {
                    session_id,
                    reviewer_id: outcome.decision.reviewer_id,
                });
            }
            return Err(e.into());
        }

        if outcome.closed_session() {
            ReviewSession::close(session_id, outcome.status, now, &mut *tx).await?;
        }

        tx.commit().await?;

        debug!(
            session_id = %session_id,
            reviewer_id = %outcome.decision.reviewer_id,
            status = %outcome.status,
            "Recorded review decision"
        );
        Ok(outcome)
    }

    async fn find_overdue_sessions(&self, now: DateTime<Utc>) -> Result<Vec<ReviewSession>> {
        ReviewSession::find_overdue(now, &self.pool).await
    }

    async fn escalate_session(
        &self,
        id: ReviewSessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<ReviewSession>> {
        ReviewSession::escalate(id, now, &self.pool).await
    }

    async fn sessions_opened_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ReviewSession>> {
        ReviewSession::find_opened_between(start, end, &self.pool).await
    }
}

#[async_trait]
impl BaseCorrectionStore for PgStore {
    async fn insert_correction(&self, correction: &CorrectionRequest) -> Result<CorrectionRequest> {
        correction.insert(&self.pool).await
    }

    async fn find_correction(&self, id: CorrectionRequestId) -> Result<Option<CorrectionRequest>> {
        CorrectionRequest::find_by_id(id, &self.pool).await
    }

    async fn resolve_correction(
        &self,
        resolution: &CorrectionResolution,
        fact_check_id: FactCheckId,
        amendment: &FactCheckAmendment,
    ) -> Result<Option<(CorrectionRequest, FactCheck)>> {
        let mut tx = self.pool.begin().await?;

        let Some(correction) = CorrectionRequest::resolve(resolution, &mut *tx).await? else {
            return Ok(None);
        };
        let fact_check =
            FactCheck::amend(fact_check_id, amendment, resolution.resolved_at, &mut *tx)
                .await?
                .with_context(|| format!("Fact-check {} vanished during correction", fact_check_id))?;

        tx.commit().await?;
        Ok(Some((correction, fact_check)))
    }

    async fn find_overdue_corrections(&self, now: DateTime<Utc>) -> Result<Vec<CorrectionRequest>> {
        CorrectionRequest::find_overdue(now, &self.pool).await
    }

    async fn corrections_received_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CorrectionRequest>> {
        CorrectionRequest::find_received_between(start, end, &self.pool).await
    }
}

#[async_trait]
impl BaseReportStore for PgStore {
    async fn save_report(&self, report: &TransparencyReport) -> Result<TransparencyReport> {
        report.upsert(&self.pool).await
    }

    async fn find_report(&self, period_start: DateTime<Utc>) -> Result<Option<TransparencyReport>> {
        TransparencyReport::find_by_period_start(period_start, &self.pool).await
    }
}
