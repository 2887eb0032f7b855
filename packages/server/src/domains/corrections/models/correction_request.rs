use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{CorrectionRequestId, FactCheckId, MemberId};
use crate::domains::fact_checks::models::FactCheckAmendment;

/// Public request to correct a published fact-check. Never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CorrectionRequest {
    pub id: CorrectionRequestId,
    pub fact_check_id: FactCheckId,
    pub correction_type: CorrectionType,
    pub status: CorrectionStatus,
    pub requester_email: Option<String>,
    pub description: String,
    pub received_at: DateTime<Utc>,
    pub sla_deadline: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<MemberId>,
    pub resolution_note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "correction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CorrectionType {
    /// Typos, broken links, wording that does not change the verdict
    Minor,
    /// New information added without changing the verdict
    Update,
    /// Verdict or key finding changes
    Substantial,
}

impl std::fmt::Display for CorrectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrectionType::Minor => write!(f, "minor"),
            CorrectionType::Update => write!(f, "update"),
            CorrectionType::Substantial => write!(f, "substantial"),
        }
    }
}

impl std::str::FromStr for CorrectionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "minor" => Ok(CorrectionType::Minor),
            "update" => Ok(CorrectionType::Update),
            "substantial" => Ok(CorrectionType::Substantial),
            _ => Err(anyhow::anyhow!("Invalid correction type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "correction_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CorrectionStatus {
    Open,
    Resolved,
}

/// Input from the public correction form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCorrectionRequest {
    pub fact_check_id: FactCheckId,
    pub correction_type: CorrectionType,
    pub requester_email: Option<String>,
    pub description: String,
}

/// Reviewer resolution of an open request
#[derive(Debug, Clone)]
pub struct CorrectionResolution {
    pub correction_id: CorrectionRequestId,
    pub resolved_by: MemberId,
    pub note: String,
    pub resolved_at: DateTime<Utc>,
}

impl CorrectionType {
    /// How resolving a correction of this type changes the fact-check.
    ///
    /// Minor fixes are silent, updates add a public notice, substantial
    /// corrections add a notice and mark a public fact-check as corrected.
    pub fn amendment_for(&self, note: &str, at: DateTime<Utc>) -> FactCheckAmendment {
        let date = at.format("%Y-%m-%d");
        match self {
            CorrectionType::Minor => FactCheckAmendment {
                marks_corrected: false,
                public_notice: None,
            },
            CorrectionType::Update => FactCheckAmendment {
                marks_corrected: false,
                public_notice: Some(format!("Update ({}): {}", date, note)),
            },
            CorrectionType::Substantial => FactCheckAmendment {
                marks_corrected: true,
                public_notice: Some(format!("Correction ({}): {}", date, note)),
            },
        }
    }
}

impl CorrectionRequest {
    pub fn receive(input: NewCorrectionRequest, received_at: DateTime<Utc>, sla: Duration) -> Self {
        Self {
            id: CorrectionRequestId::new(),
            fact_check_id: input.fact_check_id,
            correction_type: input.correction_type,
            status: CorrectionStatus::Open,
            requester_email: input
                .requester_email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            description: input.description.trim().to_string(),
            received_at,
            sla_deadline: received_at + sla,
            resolved_at: None,
            resolved_by: None,
            resolution_note: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == CorrectionStatus::Open
    }

    /// Still open after the SLA deadline
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && now > self.sla_deadline
    }

    pub fn resolved_within_sla(&self) -> bool {
        matches!(self.resolved_at, Some(at) if at <= self.sla_deadline)
    }

    /// Apply a resolution in memory (mirrors `resolve` in SQL).
    pub fn resolved(mut self, resolution: &CorrectionResolution) -> Self {
        self.status = CorrectionStatus::Resolved;
        self.resolved_at = Some(resolution.resolved_at);
        self.resolved_by = Some(resolution.resolved_by);
        self.resolution_note = Some(resolution.note.clone());
        self
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl CorrectionRequest {
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        let correction = sqlx::query_as::<_, CorrectionRequest>(
            r#"
            INSERT INTO correction_requests (
                id, fact_check_id, correction_type, status, requester_email,
                description, received_at, sla_deadline
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.fact_check_id)
        .bind(self.correction_type)
        .bind(self.status)
        .bind(&self.requester_email)
        .bind(&self.description)
        .bind(self.received_at)
        .bind(self.sla_deadline)
        .fetch_one(pool)
        .await?;
        Ok(correction)
    }

    pub async fn find_by_id(id: CorrectionRequestId, pool: &PgPool) -> Result<Option<Self>> {
        let correction = sqlx::query_as::<_, CorrectionRequest>(
            "SELECT * FROM correction_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(correction)
    }

    /// Resolve an open request. `None` when it is missing or already resolved.
    pub async fn resolve(
        resolution: &CorrectionResolution,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let correction = sqlx::query_as::<_, CorrectionRequest>(
            r#"
            UPDATE correction_requests
            SET
                status = 'resolved',
                resolved_at = $2,
                resolved_by = $3,
                resolution_note = $4
            WHERE id = $1 AND status = 'open'
            RETURNING *
            "#,
        )
        .bind(resolution.correction_id)
        .bind(resolution.resolved_at)
        .bind(resolution.resolved_by)
        .bind(&resolution.note)
        .fetch_optional(conn)
        .await?;
        Ok(correction)
    }

    pub async fn find_overdue(now: DateTime<Utc>, pool: &PgPool) -> Result<Vec<Self>> {
        let corrections = sqlx::query_as::<_, CorrectionRequest>(
            r#"
            SELECT * FROM correction_requests
            WHERE status = 'open' AND sla_deadline < $1
            ORDER BY sla_deadline
            "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await?;
        Ok(corrections)
    }

    pub async fn find_received_between(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let corrections = sqlx::query_as::<_, CorrectionRequest>(
            r#"
            SELECT * FROM correction_requests
            WHERE received_at >= $1 AND received_at < $2
            ORDER BY received_at
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;
        Ok(corrections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: CorrectionType, received_at: DateTime<Utc>) -> CorrectionRequest {
        CorrectionRequest::receive(
            NewCorrectionRequest {
                fact_check_id: FactCheckId::new(),
                correction_type: kind,
                requester_email: Some("  ".to_string()),
                description: "  The date is wrong ".to_string(),
            },
            received_at,
            Duration::days(7),
        )
    }

    #[test]
    fn sla_deadline_is_seven_days_after_receipt() {
        let received = Utc::now();
        let correction = request(CorrectionType::Minor, received);
        assert_eq!(correction.sla_deadline, received + Duration::days(7));
        assert_eq!(correction.description, "The date is wrong");
        assert_eq!(correction.requester_email, None);
    }

    #[test]
    fn overdue_only_while_open_and_past_deadline() {
        let received = Utc::now();
        let correction = request(CorrectionType::Update, received);
        assert!(!correction.is_overdue(correction.sla_deadline));
        assert!(correction.is_overdue(correction.sla_deadline + Duration::seconds(1)));

        let resolved = correction.clone().resolved(&CorrectionResolution {
            correction_id: correction.id,
            resolved_by: MemberId::new(),
            note: "fixed".to_string(),
            resolved_at: received + Duration::days(9),
        });
        assert!(!resolved.is_overdue(received + Duration::days(30)));
        assert!(!resolved.resolved_within_sla());
    }

    #[test]
    fn minor_correction_is_silent() {
        let amendment = CorrectionType::Minor.amendment_for("typo", Utc::now());
        assert!(!amendment.marks_corrected);
        assert_eq!(amendment.public_notice, None);
    }

    #[test]
    fn update_adds_notice_without_status_change() {
        let at = Utc::now();
        let amendment = CorrectionType::Update.amendment_for("new source", at);
        assert!(!amendment.marks_corrected);
        assert_eq!(
            amendment.public_notice,
            Some(format!("Update ({}): new source", at.format("%Y-%m-%d")))
        );
    }

    #[test]
    fn substantial_marks_fact_check_corrected() {
        let amendment = CorrectionType::Substantial.amendment_for("verdict", Utc::now());
        assert!(amendment.marks_corrected);
        assert!(amendment.public_notice.unwrap().starts_with("Correction ("));
    }
}
