pub mod transparency_report;

pub use transparency_report::*;
