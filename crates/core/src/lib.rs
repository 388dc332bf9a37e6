pub mod config;
pub mod config_loader;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{
    AppConfig, BacktestDefaults, CacheConfig, ForecastConfig, HolidayCalendar, MarketDataConfig,
};
pub use config_loader::ConfigLoader;
pub use error::{HarbingerError, Result};
pub use traits::{ForecastModel, Forecaster, MarketDataSource, StrategyPolicy};
pub use types::{validate_series, BacktestRecord, ForecastPoint, PerformanceMetrics, PricePoint};
