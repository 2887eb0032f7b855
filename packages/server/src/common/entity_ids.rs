//! Typed id aliases for every persisted entity.

pub use super::id::{Id, V7};

/// Marker for platform members (authors, submitters, reviewers, admins).
pub struct Member;

/// Marker for fact-check articles.
pub struct FactCheck;

/// Marker for administrator-maintained review triggers.
pub struct ReviewTrigger;

/// Marker for peer-review rounds.
pub struct ReviewSession;

/// Marker for individual reviewer decisions.
pub struct ReviewDecision;

/// Marker for public correction requests.
pub struct CorrectionRequest;

/// Marker for monthly transparency reports.
pub struct TransparencyReport;

pub type MemberId = Id<Member>;
pub type FactCheckId = Id<FactCheck>;
pub type ReviewTriggerId = Id<ReviewTrigger>;
pub type ReviewSessionId = Id<ReviewSession>;
pub type ReviewDecisionId = Id<ReviewDecision>;
pub type CorrectionRequestId = Id<CorrectionRequest>;
pub type TransparencyReportId = Id<TransparencyReport>;
