// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Workflow rules live in the domains and call into these collaborators.
//
// Naming convention: Base* for trait names (e.g., BaseReviewStore, BaseNotifier)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

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
use crate::kernel::notifier::Notification;

// =============================================================================
// Fact-check storage
// =============================================================================

#[async_trait]
pub trait BaseFactCheckStore: Send + Sync {
    async fn insert_fact_check(&self, fact_check: &FactCheck) -> Result<FactCheck>;

    async fn find_fact_check(&self, id: FactCheckId) -> Result<Option<FactCheck>>;

    /// Publish a draft; `None` when missing or not a draft
    async fn mark_published(&self, id: FactCheckId, now: DateTime<Utc>) -> Result<Option<FactCheck>>;

    async fn count_published_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<i64>;
}

// =============================================================================
// Peer review storage
// =============================================================================

#[async_trait]
pub trait BaseReviewStore: Send + Sync {
    async fn active_triggers(&self) -> Result<Vec<ReviewTrigger>>;

    async fn save_trigger(&self, trigger: &ReviewTrigger) -> Result<ReviewTrigger>;

    async fn set_trigger_active(
        &self,
        id: ReviewTriggerId,
        active: bool,
        updated_by: MemberId,
    ) -> Result<Option<ReviewTrigger>>;

    /// Fails with `SessionAlreadyOpen` when the fact-check has a pending round
    async fn insert_session(&self, session: &ReviewSession) -> Result<ReviewSession, PeerReviewError>;

    async fn find_session(&self, id: ReviewSessionId) -> Result<Option<ReviewSession>>;

    async fn find_pending_session(&self, fact_check_id: FactCheckId) -> Result<Option<ReviewSession>>;

    async fn find_latest_session(&self, fact_check_id: FactCheckId) -> Result<Option<ReviewSession>>;

    async fn find_decisions(&self, session_id: ReviewSessionId) -> Result<Vec<ReviewDecision>>;

    /// Serialized per session: validate via `ReviewSession::plan_decision`,
    /// insert the decision and apply the resolved status as one unit.
    async fn record_decision(
        &self,
        session_id: ReviewSessionId,
        input: DecisionInput,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, PeerReviewError>;

    async fn find_overdue_sessions(&self, now: DateTime<Utc>) -> Result<Vec<ReviewSession>>;

    /// Escalate if still pending and overdue; `None` when nothing changed
    async fn escalate_session(
        &self,
        id: ReviewSessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<ReviewSession>>;

    async fn sessions_opened_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ReviewSession>>;
}

// =============================================================================
// Correction storage
// =============================================================================

#[async_trait]
pub trait BaseCorrectionStore: Send + Sync {
    async fn insert_correction(&self, correction: &CorrectionRequest) -> Result<CorrectionRequest>;

    async fn find_correction(&self, id: CorrectionRequestId) -> Result<Option<CorrectionRequest>>;

    /// Resolve the request and amend its fact-check atomically.
    /// `None` when the request was no longer open.
    async fn resolve_correction(
        &self,
        resolution: &CorrectionResolution,
        fact_check_id: FactCheckId,
        amendment: &FactCheckAmendment,
    ) -> Result<Option<(CorrectionRequest, FactCheck)>>;

    async fn find_overdue_corrections(&self, now: DateTime<Utc>) -> Result<Vec<CorrectionRequest>>;

    async fn corrections_received_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CorrectionRequest>>;
}

// =============================================================================
// Transparency report storage
// =============================================================================

#[async_trait]
pub trait BaseReportStore: Send + Sync {
    /// Upsert keyed by period start
    async fn save_report(&self, report: &TransparencyReport) -> Result<TransparencyReport>;

    async fn find_report(&self, period_start: DateTime<Utc>) -> Result<Option<TransparencyReport>>;
}

// =============================================================================
// Notification Trait (Infrastructure - email/webhook fan-out)
// =============================================================================

#[async_trait]
pub trait BaseNotifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}
