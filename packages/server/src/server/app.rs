//! Application setup.
//!
//! The workflow operations are invoked by the surrounding platform; this
//! process only exposes operational endpoints.

use axum::{extract::Extension, routing::get, Router};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::health_handler;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub deps: Arc<ServerDeps>,
}

pub fn build_app(db_pool: PgPool, deps: Arc<ServerDeps>) -> Router {
    let state = AppState { db_pool, deps };

    Router::new()
        .route("/health", get(health_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}
