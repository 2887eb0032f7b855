use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{MemberId, ReviewTriggerId};

/// Condition that makes peer review mandatory before publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "review_trigger_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    PoliticalTopic,
    HealthClaim,
    HighEngagement,
    ManualFlag,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 4] = [
        TriggerKind::PoliticalTopic,
        TriggerKind::HealthClaim,
        TriggerKind::HighEngagement,
        TriggerKind::ManualFlag,
    ];
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerKind::PoliticalTopic => write!(f, "political_topic"),
            TriggerKind::HealthClaim => write!(f, "health_claim"),
            TriggerKind::HighEngagement => write!(f, "high_engagement"),
            TriggerKind::ManualFlag => write!(f, "manual_flag"),
        }
    }
}

impl std::str::FromStr for TriggerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "political_topic" => Ok(TriggerKind::PoliticalTopic),
            "health_claim" => Ok(TriggerKind::HealthClaim),
            "high_engagement" => Ok(TriggerKind::HighEngagement),
            "manual_flag" => Ok(TriggerKind::ManualFlag),
            _ => Err(anyhow::anyhow!("Invalid review trigger kind: {}", s)),
        }
    }
}

/// Administrator-maintained trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewTrigger {
    pub id: ReviewTriggerId,
    pub kind: TriggerKind,
    /// Inclusive cutoff for `HighEngagement` (view count)
    pub threshold: Option<i64>,
    /// Tags matched by `PoliticalTopic` / `HealthClaim`
    pub topic_tags: Vec<String>,
    pub active: bool,
    pub updated_by: Option<MemberId>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewTrigger {
    pub fn new(kind: TriggerKind, updated_by: Option<MemberId>) -> Self {
        Self {
            id: ReviewTriggerId::new(),
            kind,
            threshold: None,
            topic_tags: Vec::new(),
            active: true,
            updated_by,
            updated_at: Utc::now(),
        }
    }

    pub fn with_threshold(mut self, threshold: i64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_topic_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topic_tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl ReviewTrigger {
    pub async fn find_active(pool: &PgPool) -> Result<Vec<Self>> {
        let triggers = sqlx::query_as::<_, ReviewTrigger>(
            "SELECT * FROM review_triggers WHERE active = true ORDER BY kind, updated_at",
        )
        .fetch_all(pool)
        .await?;
        Ok(triggers)
    }

    /// Insert or replace the trigger configuration
    pub async fn upsert(&self, pool: &PgPool) -> Result<Self> {
        let trigger = sqlx::query_as::<_, ReviewTrigger>(
            r#"
            INSERT INTO review_triggers (id, kind, threshold, topic_tags, active, updated_by, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET
                kind = EXCLUDED.kind,
                threshold = EXCLUDED.threshold,
                topic_tags = EXCLUDED.topic_tags,
                active = EXCLUDED.active,
                updated_by = EXCLUDED.updated_by,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.kind)
        .bind(self.threshold)
        .bind(&self.topic_tags)
        .bind(self.active)
        .bind(self.updated_by)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await?;
        Ok(trigger)
    }

    pub async fn set_active(
        id: ReviewTriggerId,
        active: bool,
        updated_by: MemberId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let trigger = sqlx::query_as::<_, ReviewTrigger>(
            r#"
            UPDATE review_triggers
            SET active = $2, updated_by = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(active)
        .bind(updated_by)
        .fetch_optional(pool)
        .await?;
        Ok(trigger)
    }
}
