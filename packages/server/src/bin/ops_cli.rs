//! Operations CLI for the fact-check workflow
//!
//! Runs the scheduled jobs on demand (escalation sweep, correction SLA
//! digest, transparency report) and applies migrations. Prints JSON so the
//! output can be piped into other tooling.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use factcheck_core::common::ReportingPeriod;
use factcheck_core::config::Config;
use factcheck_core::domains::corrections::actions::notify_overdue_corrections;
use factcheck_core::domains::peer_review::actions::sweep_escalations;
use factcheck_core::domains::transparency::actions::generate_monthly_report;
use factcheck_core::kernel::ServerDeps;
use serde::Serialize;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "ops_cli")]
#[command(about = "Fact-check workflow operations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Escalate review sessions past their deadline
    SweepEscalations,

    /// Send the digest of correction requests past their SLA
    OverdueCorrections,

    /// Generate a monthly transparency report (defaults to last month)
    TransparencyReport {
        #[arg(long, requires = "month")]
        year: Option<i32>,
        #[arg(long, requires = "year")]
        month: Option<u32>,
    },
}

#[derive(Serialize)]
struct Response<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

fn output<T: Serialize>(resp: Response<T>) -> Result<()> {
    println!("{}", serde_json::to_string(&resp)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,factcheck_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Migrate => cmd_migrate(&config).await,
        Commands::SweepEscalations => cmd_sweep(&config).await,
        Commands::OverdueCorrections => cmd_overdue(&config).await,
        Commands::TransparencyReport { year, month } => {
            cmd_report(&config, year.zip(month)).await
        }
    }
}

async fn get_pool(config: &Config) -> Result<PgPool> {
    PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

async fn get_deps(config: &Config) -> Result<ServerDeps> {
    let pool = get_pool(config).await?;
    let policy = config.review_policy()?;
    Ok(ServerDeps::postgres(
        pool,
        ServerDeps::notifier_from_config(config),
        policy,
    ))
}

async fn cmd_migrate(config: &Config) -> Result<()> {
    let pool = get_pool(config).await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    output::<()>(Response {
        success: true,
        message: Some("Migrations applied".to_string()),
        data: None,
    })
}

async fn cmd_sweep(config: &Config) -> Result<()> {
    let deps = get_deps(config).await?;
    let report = sweep_escalations(&deps, Utc::now()).await?;

    output(Response {
        success: report.failed.is_empty(),
        message: Some(format!(
            "Escalated {} of {} overdue sessions",
            report.escalated.len(),
            report.examined
        )),
        data: Some(report),
    })
}

async fn cmd_overdue(config: &Config) -> Result<()> {
    let deps = get_deps(config).await?;
    let count = notify_overdue_corrections(&deps, Utc::now()).await?;

    output(Response {
        success: true,
        message: Some(format!("{} correction requests past SLA", count)),
        data: Some(count),
    })
}

async fn cmd_report(config: &Config, year_month: Option<(i32, u32)>) -> Result<()> {
    let now = Utc::now();
    let period = match year_month {
        Some((year, month)) => ReportingPeriod::month(year, month)?,
        None => ReportingPeriod::previous(now)?,
    };

    let deps = get_deps(config).await?;
    let report = generate_monthly_report(period, now, &deps).await?;

    output(Response {
        success: true,
        message: Some(format!("Transparency report {}", period.label())),
        data: Some(report),
    })
}
