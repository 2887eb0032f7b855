use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use typed_builder::TypedBuilder;

use crate::common::{FactCheckId, MemberId};
use crate::domains::peer_review::ClaimMetadata;

/// A fact-check article plus the claim metadata used for review triggers
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FactCheck {
    pub id: FactCheckId,
    pub title: String,
    pub author_id: MemberId,
    /// End user whose submission started this fact-check, if any
    pub submitted_by: Option<MemberId>,
    pub topic_tags: Vec<String>,
    pub view_count: i64,
    pub manual_review_flag: bool,
    pub status: FactCheckStatus,
    pub public_notice: Option<String>,
    pub correction_count: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub last_corrected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "fact_check_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FactCheckStatus {
    Draft,
    Published,
    Corrected,
}

impl FactCheckStatus {
    pub fn is_public(&self) -> bool {
        matches!(self, FactCheckStatus::Published | FactCheckStatus::Corrected)
    }
}

impl std::fmt::Display for FactCheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactCheckStatus::Draft => write!(f, "draft"),
            FactCheckStatus::Published => write!(f, "published"),
            FactCheckStatus::Corrected => write!(f, "corrected"),
        }
    }
}

/// Input for a new draft fact-check
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewFactCheck {
    pub title: String,
    pub author_id: MemberId,
    #[builder(default, setter(strip_option))]
    pub submitted_by: Option<MemberId>,
    #[builder(default)]
    pub topic_tags: Vec<String>,
    #[builder(default)]
    pub view_count: i64,
    #[builder(default)]
    pub manual_review_flag: bool,
}

/// Changes a resolved correction makes to the public fact-check.
///
/// Status is derived from the stored row at write time, never written as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactCheckAmendment {
    /// Move a published fact-check to `Corrected`. Drafts keep their status.
    pub marks_corrected: bool,
    /// `None` keeps the existing notice
    pub public_notice: Option<String>,
}

impl FactCheck {
    pub fn draft(input: NewFactCheck, now: DateTime<Utc>) -> Self {
        Self {
            id: FactCheckId::new(),
            title: input.title,
            author_id: input.author_id,
            submitted_by: input.submitted_by,
            topic_tags: input.topic_tags,
            view_count: input.view_count,
            manual_review_flag: input.manual_review_flag,
            status: FactCheckStatus::Draft,
            public_notice: None,
            correction_count: 0,
            published_at: None,
            last_corrected_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn claim_metadata(&self) -> ClaimMetadata {
        ClaimMetadata {
            topic_tags: self.topic_tags.clone(),
            view_count: self.view_count,
            manual_flag: self.manual_review_flag,
        }
    }

    /// Authors and original submitters may never review their own fact-check.
    pub fn is_conflicted(&self, member_id: MemberId) -> bool {
        self.author_id == member_id || self.submitted_by == Some(member_id)
    }

    /// Apply an amendment in memory (mirrors `amend` in SQL).
    pub fn amended(mut self, amendment: &FactCheckAmendment, now: DateTime<Utc>) -> Self {
        if amendment.marks_corrected && self.status.is_public() {
            self.status = FactCheckStatus::Corrected;
        }
        if let Some(notice) = &amendment.public_notice {
            self.public_notice = Some(notice.clone());
        }
        self.correction_count += 1;
        self.last_corrected_at = Some(now);
        self.updated_at = now;
        self
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl FactCheck {
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        let fact_check = sqlx::query_as::<_, FactCheck>(
            r#"
            INSERT INTO fact_checks (
                id, title, author_id, submitted_by, topic_tags, view_count,
                manual_review_flag, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.title)
        .bind(self.author_id)
        .bind(self.submitted_by)
        .bind(&self.topic_tags)
        .bind(self.view_count)
        .bind(self.manual_review_flag)
        .bind(self.status)
        .bind(self.created_at)
        .fetch_one(pool)
        .await?;
        Ok(fact_check)
    }

    pub async fn find_by_id(id: FactCheckId, pool: &PgPool) -> Result<Option<Self>> {
        let fact_check = sqlx::query_as::<_, FactCheck>("SELECT * FROM fact_checks WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(fact_check)
    }

    /// Publish a draft. Returns `None` when the fact-check is missing or not a draft.
    pub async fn mark_published(
        id: FactCheckId,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let fact_check = sqlx::query_as::<_, FactCheck>(
            r#"
            UPDATE fact_checks
            SET status = 'published', published_at = $2, updated_at = $2
            WHERE id = $1 AND status = 'draft'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(pool)
        .await?;
        Ok(fact_check)
    }

    /// Runs inside the correction-resolution transaction
    pub async fn amend(
        id: FactCheckId,
        amendment: &FactCheckAmendment,
        now: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let fact_check = sqlx::query_as::<_, FactCheck>(
            r#"
            UPDATE fact_checks
            SET
                status = CASE
                    WHEN $2 AND status IN ('published', 'corrected') THEN 'corrected'::fact_check_status
                    ELSE status
                END,
                public_notice = COALESCE($3, public_notice),
                correction_count = correction_count + 1,
                last_corrected_at = $4,
                updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(amendment.marks_corrected)
        .bind(&amendment.public_notice)
        .bind(now)
        .fetch_optional(conn)
        .await?;
        Ok(fact_check)
    }

    pub async fn count_published_between(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM fact_checks WHERE published_at >= $1 AND published_at < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(author: MemberId, submitter: Option<MemberId>) -> FactCheck {
        let mut input = NewFactCheck::builder()
            .title("Claim about vaccines")
            .author_id(author)
            .topic_tags(vec!["health".to_string()])
            .view_count(1200)
            .build();
        input.submitted_by = submitter;
        FactCheck::draft(input, Utc::now())
    }

    #[test]
    fn author_and_submitter_are_conflicted() {
        let author = MemberId::new();
        let submitter = MemberId::new();
        let fact_check = sample(author, Some(submitter));

        assert!(fact_check.is_conflicted(author));
        assert!(fact_check.is_conflicted(submitter));
        assert!(!fact_check.is_conflicted(MemberId::new()));
    }

    #[test]
    fn claim_metadata_copies_trigger_inputs() {
        let fact_check = sample(MemberId::new(), None);
        let claim = fact_check.claim_metadata();
        assert_eq!(claim.topic_tags, vec!["health".to_string()]);
        assert_eq!(claim.view_count, 1200);
        assert!(!claim.manual_flag);
    }

    #[test]
    fn amendment_without_notice_keeps_previous_notice() {
        let mut fact_check = sample(MemberId::new(), None);
        fact_check.public_notice = Some("Update: earlier note".to_string());
        let now = Utc::now();

        let amended = fact_check.amended(
            &FactCheckAmendment {
                marks_corrected: false,
                public_notice: None,
            },
            now,
        );

        assert_eq!(amended.public_notice.as_deref(), Some("Update: earlier note"));
        assert_eq!(amended.correction_count, 1);
        assert_eq!(amended.last_corrected_at, Some(now));
    }

    #[test]
    fn marking_corrected_applies_to_current_status() {
        let amendment = FactCheckAmendment {
            marks_corrected: true,
            public_notice: Some("Correction: verdict changed".to_string()),
        };

        let draft = sample(MemberId::new(), None);
        assert_eq!(
            draft.amended(&amendment, Utc::now()).status,
            FactCheckStatus::Draft
        );

        let mut published = sample(MemberId::new(), None);
        published.status = FactCheckStatus::Published;
        assert_eq!(
            published.amended(&amendment, Utc::now()).status,
            FactCheckStatus::Corrected
        );
    }

    #[test]
    fn silent_amendment_keeps_publication() {
        let mut published = sample(MemberId::new(), None);
        published.status = FactCheckStatus::Published;
        let amended = published.amended(
            &FactCheckAmendment {
                marks_corrected: false,
                public_notice: None,
            },
            Utc::now(),
        );
        assert_eq!(amended.status, FactCheckStatus::Published);
    }
}
