pub mod correction_request;

pub use correction_request::*;
