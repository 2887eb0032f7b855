//! Peer review actions
//!
//! Entry points called by the surrounding application (HTTP layer, scheduler,
//! ops CLI). They take typed ids and `ServerDeps` and return domain results.

pub mod open_session;
pub mod submit_decision;
pub mod sweep;
pub mod triggers;

pub use open_session::*;
pub use submit_decision::*;
pub use sweep::*;
pub use triggers::*;
