pub mod insight;
pub mod log;

pub use insight::{GeminiInsightProvider, InsightProvider};
pub use log::{DocumentHealthLogStore, HealthLogService, HealthLogStore};
