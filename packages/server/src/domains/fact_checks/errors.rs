use thiserror::Error;

use crate::common::{FactCheckId, ReviewSessionId};
use crate::domains::peer_review::models::TriggerKind;

/// Why a fact-check could not be published
#[derive(Error, Debug)]
pub enum PublicationError {
    #[error("Fact-check not found: {0}")]
    FactCheckNotFound(FactCheckId),

    #[error("Fact-check {0} is already published")]
    AlreadyPublished(FactCheckId),

    #[error("Peer review is required before publication (triggers: {fired:?})")]
    ReviewRequired { fired: Vec<TriggerKind> },

    #[error("Peer review session {0} is still pending")]
    ReviewPending(ReviewSessionId),

    #[error("Peer review session {0} rejected this fact-check")]
    ReviewRejected(ReviewSessionId),

    #[error("Peer review session {0} was escalated to administrators")]
    ReviewEscalated(ReviewSessionId),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl PublicationError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PublicationError::Storage(_))
    }
}
