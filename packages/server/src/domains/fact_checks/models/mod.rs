pub mod fact_check;

pub use fact_check::*;
