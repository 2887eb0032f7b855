use anyhow::{Context, Result};
use chrono::Duration;
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub review_deadline_days: i64,
    pub correction_sla_days: i64,
    pub notification_webhook_url: Option<String>,
    pub escalation_sweep_cron: String,
    pub correction_sla_cron: String,
    pub transparency_report_cron: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            review_deadline_days: parse_days("REVIEW_DEADLINE_DAYS")?,
            correction_sla_days: parse_days("CORRECTION_SLA_DAYS")?,
            notification_webhook_url: env::var("NOTIFICATION_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            escalation_sweep_cron: env::var("ESCALATION_SWEEP_CRON")
                .unwrap_or_else(|_| "0 0 * * * *".to_string()),
            correction_sla_cron: env::var("CORRECTION_SLA_CRON")
                .unwrap_or_else(|_| "0 0 8 * * *".to_string()),
            transparency_report_cron: env::var("TRANSPARENCY_REPORT_CRON")
                .unwrap_or_else(|_| "0 0 2 1 * *".to_string()),
        })
    }

    /// Workflow policy derived once at startup and shared read-only afterwards.
    pub fn review_policy(&self) -> Result<ReviewPolicy> {
        ReviewPolicy::from_days(self.review_deadline_days, self.correction_sla_days)
    }
}

fn parse_days(name: &str) -> Result<i64> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a whole number of days", name)),
        Err(_) => Ok(DEFAULT_WINDOW_DAYS),
    }
}

/// EFCSN windows: seven days for a review round and for answering a correction.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Longest window either workflow accepts
pub const MAX_WINDOW_DAYS: i64 = 365;

/// Immutable timing rules for the review and correction workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewPolicy {
    pub review_deadline: Duration,
    pub correction_sla: Duration,
}

impl ReviewPolicy {
    pub fn from_days(review_deadline_days: i64, correction_sla_days: i64) -> Result<Self> {
        anyhow::ensure!(
            (1..=MAX_WINDOW_DAYS).contains(&review_deadline_days),
            "review deadline must be between 1 and {} days (got {})",
            MAX_WINDOW_DAYS,
            review_deadline_days
        );
        anyhow::ensure!(
            (1..=MAX_WINDOW_DAYS).contains(&correction_sla_days),
            "correction SLA must be between 1 and {} days (got {})",
            MAX_WINDOW_DAYS,
            correction_sla_days
        );
        Ok(Self {
            review_deadline: Duration::days(review_deadline_days),
            correction_sla: Duration::days(correction_sla_days),
        })
    }
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            review_deadline: Duration::days(DEFAULT_WINDOW_DAYS),
            correction_sla: Duration::days(DEFAULT_WINDOW_DAYS),
        }
    }
}
