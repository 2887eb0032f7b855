//! Server dependencies for workflow actions (using traits for testability)
//!
//! This module provides the central dependency container used by every domain
//! action. Storage and notification go through trait objects so tests can
//! swap in the in-memory implementations from `test_dependencies`.

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::{Config, ReviewPolicy};
use crate::kernel::notifier::{LogNotifier, WebhookNotifier};
use crate::kernel::postgres_store::PgStore;
use crate::kernel::{
    BaseCorrectionStore, BaseFactCheckStore, BaseNotifier, BaseReportStore, BaseReviewStore,
};

/// Server dependencies accessible to actions
#[derive(Clone)]
pub struct ServerDeps {
    pub fact_checks: Arc<dyn BaseFactCheckStore>,
    pub reviews: Arc<dyn BaseReviewStore>,
    pub corrections: Arc<dyn BaseCorrectionStore>,
    pub reports: Arc<dyn BaseReportStore>,
    pub notifier: Arc<dyn BaseNotifier>,
    /// Loaded once at startup, read-only afterwards
    pub policy: ReviewPolicy,
}

impl ServerDeps {
    pub fn new(
        fact_checks: Arc<dyn BaseFactCheckStore>,
        reviews: Arc<dyn BaseReviewStore>,
        corrections: Arc<dyn BaseCorrectionStore>,
        reports: Arc<dyn BaseReportStore>,
        notifier: Arc<dyn BaseNotifier>,
        policy: ReviewPolicy,
    ) -> Self {
        Self {
            fact_checks,
            reviews,
            corrections,
            reports,
            notifier,
            policy,
        }
    }

    /// Production wiring: one Postgres store behind every storage trait
    pub fn postgres(pool: PgPool, notifier: Arc<dyn BaseNotifier>, policy: ReviewPolicy) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            notifier,
            policy,
        )
    }

    /// Webhook notifier when configured, log-only otherwise
    pub fn notifier_from_config(config: &Config) -> Arc<dyn BaseNotifier> {
        match &config.notification_webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
            None => {
                tracing::warn!("NOTIFICATION_WEBHOOK_URL not set, notifications will only be logged");
                Arc::new(LogNotifier)
            }
        }
    }
}
