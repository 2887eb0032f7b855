//! Peer review under EFCSN rules: trigger evaluation, review rounds,
//! unanimous consensus and deadline escalation.

pub mod actions;
pub mod consensus;
pub mod errors;
pub mod models;
pub mod triggers;

pub use errors::PeerReviewError;
pub use triggers::{evaluate_triggers, ClaimMetadata, FiredTrigger, TriggerResult};
