// Fact-Check Workflow - Core
//
// Peer review under EFCSN rules (triggers, unanimous consensus, deadline
// escalation), correction requests with SLA tracking, and monthly
// transparency reports.
//
// Domains live in domains/*; infrastructure (stores, notifications,
// scheduler) lives in kernel/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
