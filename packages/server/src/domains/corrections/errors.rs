use thiserror::Error;

use crate::common::{CorrectionRequestId, FactCheckId};

#[derive(Error, Debug)]
pub enum CorrectionError {
    #[error("Fact-check not found: {0}")]
    FactCheckNotFound(FactCheckId),

    #[error("Correction request not found: {0}")]
    NotFound(CorrectionRequestId),

    #[error("Correction request {0} is already resolved")]
    AlreadyResolved(CorrectionRequestId),

    #[error("Correction requests need a description")]
    EmptyDescription,

    #[error("Resolving a correction needs a resolution note")]
    EmptyResolutionNote,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl CorrectionError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CorrectionError::Storage(_))
    }
}
