//! Fact-check workflow server
//!
//! Runs migrations, starts the scheduled workflow jobs (escalation sweep,
//! correction SLA digest, monthly transparency report) and serves the
//! operational HTTP endpoints.

use std::sync::Arc;

use anyhow::{Context, Result};
use factcheck_core::kernel::{start_scheduler, ServerDeps};
use factcheck_core::{server::build_app, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,factcheck_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting fact-check workflow server");

    let config = Config::from_env().context("Failed to load configuration")?;
    let policy = config
        .review_policy()
        .context("Invalid review policy configuration")?;
    tracing::info!(
        review_deadline_days = config.review_deadline_days,
        correction_sla_days = config.correction_sla_days,
        "Configuration loaded"
    );

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let notifier = ServerDeps::notifier_from_config(&config);
    let deps = Arc::new(ServerDeps::postgres(pool.clone(), notifier, policy));

    // Keep the handle alive for the lifetime of the server
    let _scheduler = start_scheduler(deps.clone(), &config)
        .await
        .context("Failed to start scheduler")?;

    let app = build_app(pool, deps);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
