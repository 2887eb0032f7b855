//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod notifier;
pub mod postgres_store;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use notifier::{dispatch_best_effort, LogNotifier, Notification, NotificationKind, WebhookNotifier};
pub use postgres_store::PgStore;
pub use scheduled_tasks::start_scheduler;
pub use test_dependencies::{InMemoryStore, MockNotifier, TestDependencies};
pub use traits::*;
