use thiserror::Error;

use super::models::ReviewStatus;
use crate::common::{FactCheckId, MemberId, ReviewSessionId};

/// Failures of the peer-review workflow operations
#[derive(Error, Debug)]
pub enum PeerReviewError {
    #[error("Member {reviewer_id} authored or submitted fact-check {fact_check_id} and cannot review it")]
    SelfReview {
        fact_check_id: FactCheckId,
        reviewer_id: MemberId,
    },

    #[error("A review session needs at least one reviewer")]
    NoReviewers,

    #[error("Fact-check not found: {0}")]
    FactCheckNotFound(FactCheckId),

    #[error("Review session not found: {0}")]
    SessionNotFound(ReviewSessionId),

    #[error("Fact-check {fact_check_id} already has pending review session {session_id}")]
    SessionAlreadyOpen {
        fact_check_id: FactCheckId,
        session_id: ReviewSessionId,
    },

    #[error("Member {reviewer_id} is not assigned to review session {session_id}")]
    NotAssigned {
        session_id: ReviewSessionId,
        reviewer_id: MemberId,
    },

    #[error("Member {reviewer_id} already decided on review session {session_id}")]
    DuplicateDecision {
        session_id: ReviewSessionId,
        reviewer_id: MemberId,
    },

    #[error("Review session {session_id} is closed ({status})")]
    SessionClosed {
        session_id: ReviewSessionId,
        status: ReviewStatus,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl PeerReviewError {
    /// Caller/input errors (4xx-equivalent). Everything else is infrastructure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PeerReviewError::Storage(_))
    }
}

impl From<sqlx::Error> for PeerReviewError {
    fn from(err: sqlx::Error) -> Self {
        PeerReviewError::Storage(err.into())
    }
}
