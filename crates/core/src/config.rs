use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub market_data: MarketDataConfig,
    pub forecast: ForecastConfig,
    pub backtest: BacktestDefaults,
}

/// Artifact cache location and freshness windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory artifacts are stored under.
    pub dir: String,
    /// Freshness window for cached price series, in seconds. Zero disables
    /// reuse and refetches on every call.
    pub data_ttl_secs: u64,
    /// Freshness window for cached trained models, in seconds.
    pub model_ttl_secs: u64,
}

/// Market-data client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataConfig {
    /// Base URL of the daily-quote CSV endpoint.
    pub endpoint: String,
    /// Deadline for a single fetch call, in seconds.
    pub timeout_secs: u64,
    /// Bounded retries for transient fetch failures.
    pub max_retries: u32,
}

/// Holiday calendar the forecaster can fold into its seasonal components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolidayCalendar {
    /// United States market holidays.
    Us,
}

/// Forecaster tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Model a day-of-week effect.
    pub weekly_seasonality: bool,
    /// Model a time-of-year effect.
    pub yearly_seasonality: bool,
    /// Country-holiday calendar to include, if any.
    pub holidays: Option<HolidayCalendar>,
    /// Trend-change sensitivity. Higher values fit the trend on a shorter,
    /// more reactive recent segment of the window.
    pub changepoint_prior_scale: f64,
    /// Nominal coverage of the forecast uncertainty interval.
    pub interval_width: f64,
    /// Deadline for a single fit call, in seconds.
    pub train_timeout_secs: u64,
}

/// Default simulation parameters for the backtest operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestDefaults {
    /// Trailing observations per training window.
    pub lookback: usize,
    /// Days ahead each forecast covers and each trade is held.
    pub horizon: usize,
    /// Starting portfolio value.
    pub initial_capital: f64,
    /// Predicted-return threshold above which a trade is taken.
    pub threshold: f64,
    /// Fraction of portfolio value allocated per trade.
    pub allocation_fraction: f64,
    /// Annual risk-free rate used in the Sharpe ratio.
    pub risk_free_rate: f64,
    /// Trading steps per year used for annualization.
    pub annualization_factor: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig {
                dir: "cache".to_string(),
                data_ttl_secs: 86_400,
                model_ttl_secs: 86_400,
            },
            market_data: MarketDataConfig {
                endpoint: "https://stooq.com".to_string(),
                timeout_secs: 30,
                max_retries: 3,
            },
            forecast: ForecastConfig::default(),
            backtest: BacktestDefaults::default(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            weekly_seasonality: true,
            yearly_seasonality: true,
            holidays: Some(HolidayCalendar::Us),
            changepoint_prior_scale: 0.05,
            interval_width: 0.95,
            train_timeout_secs: 120,
        }
    }
}

impl Default for BacktestDefaults {
    fn default() -> Self {
        Self {
            lookback: 180,
            horizon: 30,
            initial_capital: 10_000.0,
            threshold: 0.02,
            allocation_fraction: 0.10,
            risk_free_rate: 0.03,
            annualization_factor: 252.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backtest_parameters_match_documented_values() {
        let defaults = BacktestDefaults::default();
        assert_eq!(defaults.lookback, 180);
        assert_eq!(defaults.horizon, 30);
        assert!((defaults.threshold - 0.02).abs() < f64::EPSILON);
        assert!((defaults.allocation_fraction - 0.10).abs() < f64::EPSILON);
        assert!((defaults.risk_free_rate - 0.03).abs() < f64::EPSILON);
        assert!((defaults.annualization_factor - 252.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_forecast_enables_both_seasonalities() {
        let config = ForecastConfig::default();
        assert!(config.weekly_seasonality);
        assert!(config.yearly_seasonality);
        assert_eq!(config.holidays, Some(HolidayCalendar::Us));
        assert!((config.changepoint_prior_scale - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn holiday_calendar_serializes_lowercase() {
        let json = serde_json::to_string(&HolidayCalendar::Us).unwrap();
        assert_eq!(json, "\"us\"");
    }

    #[test]
    fn app_config_round_trips_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cache.data_ttl_secs, config.cache.data_ttl_secs);
        assert_eq!(back.market_data.endpoint, config.market_data.endpoint);
        assert_eq!(back.backtest.lookback, config.backtest.lookback);
    }
}
