// Business domains
pub mod corrections;
pub mod fact_checks;
pub mod peer_review;
pub mod transparency;
