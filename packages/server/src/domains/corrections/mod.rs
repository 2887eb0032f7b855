pub mod actions;
pub mod errors;
pub mod models;

pub use errors::CorrectionError;
