// HTTP server setup (Axum, operational routes only)
pub mod app;
pub mod routes;

pub use app::*;
