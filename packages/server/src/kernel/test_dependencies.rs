// TestDependencies - in-memory implementations for testing
//
// Provides a mutex-backed store with the same semantics as PgStore and a
// recording notifier, wired into ServerDeps.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::notifier::{Notification, NotificationKind};
use super::{
    BaseCorrectionStore, BaseFactCheckStore, BaseNotifier, BaseReportStore, BaseReviewStore,
    ServerDeps,
};
use crate::common::{
    CorrectionRequestId, FactCheckId, MemberId, ReviewSessionId, ReviewTriggerId,
};
use crate::config::ReviewPolicy;
use crate::domains::corrections::models::{CorrectionRequest, CorrectionResolution};
use crate::domains::fact_checks::models::{FactCheck, FactCheckAmendment, FactCheckStatus};
use crate::domains::peer_review::errors::PeerReviewError;
use crate::domains::peer_review::models::{
    DecisionInput, DecisionOutcome, ReviewDecision, ReviewSession, ReviewStatus, ReviewTrigger,
};
use crate::domains::transparency::models::TransparencyReport;

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Default)]
struct State {
    fact_checks: HashMap<FactCheckId, FactCheck>,
    triggers: HashMap<ReviewTriggerId, ReviewTrigger>,
    sessions: HashMap<ReviewSessionId, ReviewSession>,
    decisions: Vec<ReviewDecision>,
    corrections: HashMap<CorrectionRequestId, CorrectionRequest>,
    reports: BTreeMap<DateTime<Utc>, TransparencyReport>,
    failing_escalations: HashSet<ReviewSessionId>,
}

/// Store with a single lock around all state; each call is one atomic unit
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make `escalate_session` fail for this session (sweep isolation tests)
    pub fn fail_escalation_for(&self, session_id: ReviewSessionId) {
        self.state().failing_escalations.insert(session_id);
    }

    /// Overwrite a stored session, e.g. to backdate it
    pub fn put_session(&self, session: ReviewSession) {
        self.state().sessions.insert(session.id, session);
    }

    pub fn put_correction(&self, correction: CorrectionRequest) {
        self.state().corrections.insert(correction.id, correction);
    }

    pub fn session_count(&self) -> usize {
        self.state().sessions.len()
    }
}

#[async_trait]
impl BaseFactCheckStore for InMemoryStore {
    async fn insert_fact_check(&self, fact_check: &FactCheck) -> Result<FactCheck> {
        self.state()
            .fact_checks
            .insert(fact_check.id, fact_check.clone());
        Ok(fact_check.clone())
    }

    async fn find_fact_check(&self, id: FactCheckId) -> Result<Option<FactCheck>> {
        Ok(self.state().fact_checks.get(&id).cloned())
    }

    async fn mark_published(&self, id: FactCheckId, now: DateTime<Utc>) -> Result<Option<FactCheck>> {
        let mut state = self.state();
        let Some(fact_check) = state.fact_checks.get_mut(&id) else {
            return Ok(None);
        };
        if fact_check.status != FactCheckStatus::Draft {
            return Ok(None);
        }
        fact_check.status = FactCheckStatus::Published;
        fact_check.published_at = Some(now);
        fact_check.updated_at = now;
        Ok(Some(fact_check.clone()))
    }

    async fn count_published_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<i64> {
        let count = self
            .state()
            .fact_checks
            .values()
            .filter(|f| matches!(f.published_at, Some(at) if at >= start && at < end))
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl BaseReviewStore for InMemoryStore {
    async fn active_triggers(&self) -> Result<Vec<ReviewTrigger>> {
        let mut triggers: Vec<_> = self
            .state()
            .triggers
            .values()
            .filter(|t| t.active)
            .cloned()
            .collect();
        triggers.sort_by_key(|t| (t.kind, t.updated_at));
        Ok(triggers)
    }

    async fn save_trigger(&self, trigger: &ReviewTrigger) -> Result<ReviewTrigger> {
        self.state().triggers.insert(trigger.id, trigger.clone());
        Ok(trigger.clone())
    }

    async fn set_trigger_active(
        &self,
        id: ReviewTriggerId,
        active: bool,
        updated_by: MemberId,
    ) -> Result<Option<ReviewTrigger>> {
        let mut state = self.state();
        Ok(state.triggers.get_mut(&id).map(|trigger| {
            trigger.active = active;
            trigger.updated_by = Some(updated_by);
            trigger.updated_at = Utc::now();
            trigger.clone()
        }))
    }

    async fn insert_session(&self, session: &ReviewSession) -> Result<ReviewSession, PeerReviewError> {
        let mut state = self.state();
        if let Some(existing) = state
            .sessions
            .values()
            .find(|s| s.fact_check_id == session.fact_check_id && !s.status.is_terminal())
        {
            return Err(PeerReviewError::SessionAlreadyOpen {
                fact_check_id: session.fact_check_id,
                session_id: existing.id,
            });
        }
        state.sessions.insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn find_session(&self, id: ReviewSessionId) -> Result<Option<ReviewSession>> {
        Ok(self.state().sessions.get(&id).cloned())
    }

    async fn find_pending_session(&self, fact_check_id: FactCheckId) -> Result<Option<ReviewSession>> {
        Ok(self
            .state()
            .sessions
            .values()
            .find(|s| s.fact_check_id == fact_check_id && !s.status.is_terminal())
            .cloned())
    }

    async fn find_latest_session(&self, fact_check_id: FactCheckId) -> Result<Option<ReviewSession>> {
        Ok(self
            .state()
            .sessions
            .values()
            .filter(|s| s.fact_check_id == fact_check_id)
            .max_by_key(|s| (s.created_at, s.id))
            .cloned())
    }

    async fn find_decisions(&self, session_id: ReviewSessionId) -> Result<Vec<ReviewDecision>> {
        Ok(self
            .state()
            .decisions
            .iter()
            .filter(|d| d.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn record_decision(
        &self,
        session_id: ReviewSessionId,
        input: DecisionInput,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, PeerReviewError> {
        let mut state = self.state();
        let session = state
            .sessions
            .get(&session_id)
            .cloned()
            .ok_or(PeerReviewError::SessionNotFound(session_id))?;
        let existing: Vec<_> = state
            .decisions
            .iter()
            .filter(|d| d.session_id == session_id)
            .cloned()
            .collect();

        let outcome = session.plan_decision(&existing, input, now)?;

        state.decisions.push(outcome.decision.clone());
        if outcome.closed_session() {
            let closed = session.closed(outcome.status, now);
            state.sessions.insert(session_id, closed);
        }
        Ok(outcome)
    }

    async fn find_overdue_sessions(&self, now: DateTime<Utc>) -> Result<Vec<ReviewSession>> {
        let mut overdue: Vec<_> = self
            .state()
            .sessions
            .values()
            .filter(|s| s.is_overdue(now))
            .cloned()
            .collect();
        overdue.sort_by_key(|s| s.deadline);
        Ok(overdue)
    }

    async fn escalate_session(
        &self,
        id: ReviewSessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<ReviewSession>> {
        let mut state = self.state();
        if state.failing_escalations.contains(&id) {
            anyhow::bail!("injected escalation failure for session {}", id);
        }
        let Some(session) = state.sessions.get(&id).cloned() else {
            return Ok(None);
        };
        if !session.is_overdue(now) {
            return Ok(None);
        }
        let escalated = session.closed(ReviewStatus::Escalated, now);
        state.sessions.insert(id, escalated.clone());
        Ok(Some(escalated))
    }

    async fn sessions_opened_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ReviewSession>> {
        let mut sessions: Vec<_> = self
            .state()
            .sessions
            .values()
            .filter(|s| s.created_at >= start && s.created_at < end)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.created_at);
        Ok(sessions)
    }
}

#[async_trait]
impl BaseCorrectionStore for InMemoryStore {
    async fn insert_correction(&self, correction: &CorrectionRequest) -> Result<CorrectionRequest> {
        self.state()
            .corrections
            .insert(correction.id, correction.clone());
        Ok(correction.clone())
    }

    async fn find_correction(&self, id: CorrectionRequestId) -> Result<Option<CorrectionRequest>> {
        Ok(self.state().corrections.get(&id).cloned())
    }

    async fn resolve_correction(
        &self,
        resolution: &CorrectionResolution,
        fact_check_id: FactCheckId,
        amendment: &FactCheckAmendment,
    ) -> Result<Option<(CorrectionRequest, FactCheck)>> {
        let mut state = self.state();
        let Some(correction) = state.corrections.get(&resolution.correction_id).cloned() else {
            return Ok(None);
        };
        if !correction.is_open() {
            return Ok(None);
        }
        let fact_check = state
            .fact_checks
            .get(&fact_check_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Fact-check {} vanished during correction", fact_check_id))?;

        let correction = correction.resolved(resolution);
        let fact_check = fact_check.amended(amendment, resolution.resolved_at);
        state.corrections.insert(correction.id, correction.clone());
        state.fact_checks.insert(fact_check.id, fact_check.clone());
        Ok(Some((correction, fact_check)))
    }

    async fn find_overdue_corrections(&self, now: DateTime<Utc>) -> Result<Vec<CorrectionRequest>> {
        let mut overdue: Vec<_> = self
            .state()
            .corrections
            .values()
            .filter(|c| c.is_overdue(now))
            .cloned()
            .collect();
        overdue.sort_by_key(|c| c.sla_deadline);
        Ok(overdue)
    }

    async fn corrections_received_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CorrectionRequest>> {
        let mut received: Vec<_> = self
            .state()
            .corrections
            .values()
            .filter(|c| c.received_at >= start && c.received_at < end)
            .cloned()
            .collect();
        received.sort_by_key(|c| c.received_at);
        Ok(received)
    }
}

#[async_trait]
impl BaseReportStore for InMemoryStore {
    async fn save_report(&self, report: &TransparencyReport) -> Result<TransparencyReport> {
        let mut state = self.state();
        let mut stored = report.clone();
        if let Some(previous) = state.reports.get(&report.period_start) {
            stored.id = previous.id;
        }
        state.reports.insert(stored.period_start, stored.clone());
        Ok(stored)
    }

    async fn find_report(&self, period_start: DateTime<Utc>) -> Result<Option<TransparencyReport>> {
        Ok(self.state().reports.get(&period_start).cloned())
    }
}

// =============================================================================
// Mock Notifier
// =============================================================================

#[derive(Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: Mutex<bool>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail
    pub fn fail_sends(&self) {
        *self.fail.lock().unwrap_or_else(|p| p.into_inner()) = true;
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn sent_of_kind(&self, kind: NotificationKind) -> Vec<Notification> {
        self.sent().into_iter().filter(|n| n.kind == kind).collect()
    }
}

#[async_trait]
impl BaseNotifier for MockNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        if *self.fail.lock().unwrap_or_else(|p| p.into_inner()) {
            anyhow::bail!("mock notifier configured to fail");
        }
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(notification.clone());
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// In-memory ServerDeps plus handles for assertions
pub struct TestDependencies {
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<MockNotifier>,
    pub policy: ReviewPolicy,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            notifier: Arc::new(MockNotifier::new()),
            policy: ReviewPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReviewPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.notifier.clone(),
            self.policy,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
