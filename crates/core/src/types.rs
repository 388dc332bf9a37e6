//! Shared data types for price history, forecasts, and backtest output.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{HarbingerError, Result};

/// A single daily closing price observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Calendar date of the observation.
    pub date: NaiveDate,
    /// Closing price.
    pub value: Decimal,
}

impl PricePoint {
    /// Creates a new price point.
    #[must_use]
    pub fn new(date: NaiveDate, value: Decimal) -> Self {
        Self { date, value }
    }
}

/// Validates that a series is non-empty with strictly increasing dates.
///
/// # Errors
///
/// Returns `EmptySeries` for an empty slice and `InvalidParameter` when dates
/// are out of order or duplicated.
pub fn validate_series(symbol: &str, series: &[PricePoint]) -> Result<()> {
    if series.is_empty() {
        return Err(HarbingerError::empty_series(symbol));
    }
    for pair in series.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(HarbingerError::invalid_parameter(format!(
                "series for {symbol} is not strictly date-ordered at {}",
                pair[1].date
            )));
        }
    }
    Ok(())
}

/// One point of a forecast: central estimate plus uncertainty interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Forecasted calendar date.
    pub date: NaiveDate,
    /// Central predicted value.
    pub point_estimate: f64,
    /// Lower uncertainty bound.
    pub lower_bound: f64,
    /// Upper uncertainty bound.
    pub upper_bound: f64,
}

/// One walk-forward simulation step, emitted per window.
///
/// `date` is the last date of the step's training window. Records are
/// append-only and strictly date-ordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRecord {
    /// Last date of the training window for this step.
    pub date: NaiveDate,
    /// Strategy portfolio value after settling this step.
    pub portfolio_value: Decimal,
    /// Buy-and-hold reference value at this step's settlement price.
    pub benchmark_value: Decimal,
    /// Forecasted return over the horizon.
    pub predicted_return: f64,
    /// Realized return over the horizon.
    pub actual_return: f64,
}

/// Risk-adjusted performance summary derived from a record sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Final portfolio value over initial capital, minus one.
    pub total_return: f64,
    /// Final benchmark value over initial capital, minus one.
    pub benchmark_return: f64,
    /// Annualized Sharpe ratio of portfolio step returns; 0 when undefined.
    pub sharpe_ratio: f64,
    /// Mean portfolio step return minus mean benchmark step return.
    pub alpha: f64,
    /// Worst decline from a running peak, as a non-positive fraction.
    pub max_drawdown: f64,
}

impl PerformanceMetrics {
    /// Metrics for a run that produced no records.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            total_return: 0.0,
            benchmark_return: 0.0,
            sharpe_ratio: 0.0,
            alpha: 0.0,
            max_drawdown: 0.0,
        }
    }
}
