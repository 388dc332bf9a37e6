pub mod holidays;
pub mod seasonal_trend;

pub use seasonal_trend::{SeasonalTrendForecaster, SeasonalTrendModel, MIN_FIT_POINTS};
