pub mod review_decision;
pub mod review_session;
pub mod review_trigger;

pub use review_decision::*;
pub use review_session::*;
pub use review_trigger::*;
