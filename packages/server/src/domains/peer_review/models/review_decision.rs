use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use super::DecisionInput;
use crate::common::{MemberId, ReviewDecisionId, ReviewSessionId};

/// One reviewer's vote. Unique per (session, reviewer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewDecision {
    pub id: ReviewDecisionId,
    pub session_id: ReviewSessionId,
    pub reviewer_id: MemberId,
    pub approve: bool,
    pub comment: Option<String>,
    pub decided_at: DateTime<Utc>,
}

impl ReviewDecision {
    pub fn new(session_id: ReviewSessionId, input: DecisionInput, decided_at: DateTime<Utc>) -> Self {
        Self {
            id: ReviewDecisionId::new(),
            session_id,
            reviewer_id: input.reviewer_id,
            approve: input.approve,
            comment: input
                .comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            decided_at,
        }
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl ReviewDecision {
    pub async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ReviewDecision>(
            r#"
            INSERT INTO review_decisions (id, session_id, reviewer_id, approve, comment, decided_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.session_id)
        .bind(self.reviewer_id)
        .bind(self.approve)
        .bind(&self.comment)
        .bind(self.decided_at)
        .fetch_one(conn)
        .await
    }

    pub async fn find_by_session<'e, E>(session_id: ReviewSessionId, executor: E) -> Result<Vec<Self>>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let decisions = sqlx::query_as::<_, ReviewDecision>(
            "SELECT * FROM review_decisions WHERE session_id = $1 ORDER BY decided_at, id",
        )
        .bind(session_id)
        .fetch_all(executor)
        .await?;
        Ok(decisions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_comments_are_dropped() {
        let decision = ReviewDecision::new(
            ReviewSessionId::new(),
            DecisionInput {
                reviewer_id: MemberId::new(),
                approve: true,
                comment: Some("   ".to_string()),
            },
            Utc::now(),
        );
        assert_eq!(decision.comment, None);
    }
}
