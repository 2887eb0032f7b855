// Common types shared across domains and the kernel

pub mod entity_ids;
pub mod id;
pub mod period;

pub use entity_ids::*;
pub use id::{Id, V7};
pub use period::ReportingPeriod;
