use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use super::{ReviewDecision, TriggerKind};
use crate::common::{FactCheckId, MemberId, ReviewSessionId};
use crate::domains::peer_review::consensus;
use crate::domains::peer_review::errors::PeerReviewError;

/// One peer-review round for a fact-check
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewSession {
    pub id: ReviewSessionId,
    pub fact_check_id: FactCheckId,
    pub status: ReviewStatus,
    /// Every trigger that fired when the round was opened
    pub trigger_reasons: Vec<TriggerKind>,
    pub reviewer_ids: Vec<MemberId>,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    /// When the session left `pending`
    pub closed_at: Option<DateTime<Utc>>,
}

/// Review session state machine: `pending` moves to exactly one terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "review_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
    Escalated,
}

impl ReviewStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReviewStatus::Pending)
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewStatus::Pending => write!(f, "pending"),
            ReviewStatus::Approved => write!(f, "approved"),
            ReviewStatus::Rejected => write!(f, "rejected"),
            ReviewStatus::Escalated => write!(f, "escalated"),
        }
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            "escalated" => Ok(ReviewStatus::Escalated),
            _ => Err(anyhow::anyhow!("Invalid review status: {}", s)),
        }
    }
}

/// A reviewer's vote as submitted by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionInput {
    pub reviewer_id: MemberId,
    pub approve: bool,
    pub comment: Option<String>,
}

/// What recording a decision does to the session
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub decision: ReviewDecision,
    pub previous_status: ReviewStatus,
    pub status: ReviewStatus,
}

impl DecisionOutcome {
    /// True when this decision closed the session.
    pub fn closed_session(&self) -> bool {
        self.previous_status != self.status
    }
}

impl ReviewSession {
    /// New pending round. Reviewer validation happens in `open_session`.
    pub fn open(
        fact_check_id: FactCheckId,
        trigger_reasons: Vec<TriggerKind>,
        reviewer_ids: Vec<MemberId>,
        created_at: DateTime<Utc>,
        review_window: Duration,
    ) -> Self {
        Self {
            id: ReviewSessionId::new(),
            fact_check_id,
            status: ReviewStatus::Pending,
            trigger_reasons,
            reviewer_ids,
            created_at,
            deadline: created_at + review_window,
            closed_at: None,
        }
    }

    pub fn is_assigned(&self, member_id: MemberId) -> bool {
        self.reviewer_ids.contains(&member_id)
    }

    /// Pending and at or past its deadline.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == ReviewStatus::Pending && now >= self.deadline
    }

    /// Validate a decision against the current decision set and compute the
    /// resulting status. Storage calls this inside its transaction.
    pub fn plan_decision(
        &self,
        existing: &[ReviewDecision],
        input: DecisionInput,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, PeerReviewError> {
        if self.status.is_terminal() {
            return Err(PeerReviewError::SessionClosed {
                session_id: self.id,
                status: self.status,
            });
        }
        if !self.is_assigned(input.reviewer_id) {
            return Err(PeerReviewError::NotAssigned {
                session_id: self.id,
                reviewer_id: input.reviewer_id,
            });
        }
        if existing.iter().any(|d| d.reviewer_id == input.reviewer_id) {
            return Err(PeerReviewError::DuplicateDecision {
                session_id: self.id,
                reviewer_id: input.reviewer_id,
            });
        }

        let decision = ReviewDecision::new(self.id, input, now);
        let mut decisions = existing.to_vec();
        decisions.push(decision.clone());

        Ok(DecisionOutcome {
            decision,
            previous_status: self.status,
            status: consensus::resolve(&self.reviewer_ids, &decisions),
        })
    }

    /// Apply a terminal transition in memory (mirrors the SQL updates).
    pub fn closed(mut self, status: ReviewStatus, at: DateTime<Utc>) -> Self {
        if !self.status.is_terminal() && status.is_terminal() {
            self.status = status;
            self.closed_at = Some(at);
        }
        self
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl ReviewSession {
    pub async fn insert(&self, pool: &PgPool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ReviewSession>(
            r#"
            INSERT INTO review_sessions (
                id, fact_check_id, status, trigger_reasons, reviewer_ids, created_at, deadline
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.fact_check_id)
        .bind(self.status)
        .bind(&self.trigger_reasons)
        .bind(&self.reviewer_ids)
        .bind(self.created_at)
        .bind(self.deadline)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(id: ReviewSessionId, pool: &PgPool) -> Result<Option<Self>> {
        let session =
            sqlx::query_as::<_, ReviewSession>("SELECT * FROM review_sessions WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(session)
    }

    /// Row-locks the session for the rest of the transaction
    pub async fn find_for_update(
        id: ReviewSessionId,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let session = sqlx::query_as::<_, ReviewSession>(
            "SELECT * FROM review_sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(session)
    }

    pub async fn find_pending_for_fact_check(
        fact_check_id: FactCheckId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let session = sqlx::query_as::<_, ReviewSession>(
            "SELECT * FROM review_sessions WHERE fact_check_id = $1 AND status = 'pending'",
        )
        .bind(fact_check_id)
        .fetch_optional(pool)
        .await?;
        Ok(session)
    }

    pub async fn find_latest_for_fact_check(
        fact_check_id: FactCheckId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let session = sqlx::query_as::<_, ReviewSession>(
            r#"
            SELECT * FROM review_sessions
            WHERE fact_check_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(fact_check_id)
        .fetch_optional(pool)
        .await?;
        Ok(session)
    }

    /// Close a pending session inside the decision transaction
    pub async fn close(
        id: ReviewSessionId,
        status: ReviewStatus,
        at: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let session = sqlx::query_as::<_, ReviewSession>(
            r#"
            UPDATE review_sessions
            SET status = $2, closed_at = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(at)
        .fetch_one(conn)
        .await?;
        Ok(session)
    }

    /// Pending sessions at or past their deadline
    pub async fn find_overdue(now: DateTime<Utc>, pool: &PgPool) -> Result<Vec<Self>> {
        let sessions = sqlx::query_as::<_, ReviewSession>(
            r#"
            SELECT * FROM review_sessions
            WHERE status = 'pending' AND deadline <= $1
            ORDER BY deadline
            "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await?;
        Ok(sessions)
    }

    /// Escalate if still pending and overdue. `None` means nothing changed.
    pub async fn escalate(
        id: ReviewSessionId,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let session = sqlx::query_as::<_, ReviewSession>(
            r#"
            UPDATE review_sessions
            SET status = 'escalated', closed_at = $2
            WHERE id = $1 AND status = 'pending' AND deadline <= $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(pool)
        .await?;
        Ok(session)
    }

    pub async fn find_opened_between(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let sessions = sqlx::query_as::<_, ReviewSession>(
            r#"
            SELECT * FROM review_sessions
            WHERE created_at >= $1 AND created_at < $2
            ORDER BY created_at
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;
        Ok(sessions)
    }
}
