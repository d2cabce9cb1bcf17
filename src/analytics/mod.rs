pub mod blocking;
pub mod correlation;
pub mod field_stats;
pub mod lags;
pub mod log_analyzer;
pub mod patterns;
pub mod scoring;
pub mod timeframes;
pub mod validation;
pub mod veto;

pub use log_analyzer::*;
