pub mod engine;
pub mod metrics;

pub use engine::{BacktestReport, WalkForwardConfig, WalkForwardEngine};
pub use metrics::MetricsCalculator;
