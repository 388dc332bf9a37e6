//! Seasonal trend forecaster.
//!
//! Decomposes a price window into a linear trend plus optional day-of-week,
//! time-of-year, and holiday effects, each estimated as mean residuals after
//! the previous component is removed. The changepoint prior scale controls
//! how much of the window the trend is fitted on: higher values shorten the
//! fit segment so the trend reacts faster to recent changes.
//!
//! The trained model is plain serde data so callers can persist it through
//! the artifact cache and reload it across process restarts.

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use harbinger_core::config::{ForecastConfig, HolidayCalendar};
use harbinger_core::error::{HarbingerError, Result};
use harbinger_core::traits::{ForecastModel, Forecaster};
use harbinger_core::types::{validate_series, ForecastPoint, PricePoint};

use crate::holidays::is_holiday;

/// Minimum window length the fitter accepts.
pub const MIN_FIT_POINTS: usize = 14;

/// Fits [`SeasonalTrendModel`]s from price windows.
#[derive(Debug, Clone)]
pub struct SeasonalTrendForecaster {
    config: ForecastConfig,
}

/// A fitted trend + seasonality model, serializable for caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalTrendModel {
    last_date: NaiveDate,
    last_x: f64,
    slope: f64,
    intercept: f64,
    weekday_effects: [f64; 7],
    month_effects: [f64; 12],
    holiday_effect: f64,
    calendar: Option<HolidayCalendar>,
    sigma: f64,
    z: f64,
}

impl SeasonalTrendForecaster {
    /// Creates a forecaster with the given tuning.
    #[must_use]
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Fits a model on the window. CPU-bound but cheap for daily windows;
    /// callers wanting a deadline wrap the call in a timeout.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientHistory` when the window is shorter than
    /// [`MIN_FIT_POINTS`] and `Train` when it is not date-ordered.
    pub fn fit_model(&self, window: &[PricePoint]) -> Result<SeasonalTrendModel> {
        if window.len() < MIN_FIT_POINTS {
            return Err(HarbingerError::InsufficientHistory {
                required: MIN_FIT_POINTS,
                actual: window.len(),
            });
        }
        validate_series("fit window", window)
            .map_err(|e| HarbingerError::train(e.to_string()))?;

        let n = window.len();
        let ys: Vec<f64> = window
            .iter()
            .map(|p| f64::try_from(p.value).unwrap_or(0.0))
            .collect();

        let trend_len = effective_trend_window(n, self.config.changepoint_prior_scale);
        let (slope, intercept) = fit_trend(&ys, trend_len);

        let mut residuals: Vec<f64> = ys
            .iter()
            .enumerate()
            .map(|(i, y)| y - (intercept + slope * i as f64))
            .collect();

        let mut weekday_effects = [0.0; 7];
        if self.config.weekly_seasonality {
            weekday_effects = mean_by_group(window, &residuals, |p| {
                p.date.weekday().num_days_from_monday() as usize
            });
            for (i, p) in window.iter().enumerate() {
                residuals[i] -= weekday_effects[p.date.weekday().num_days_from_monday() as usize];
            }
        }

        let mut month_effects = [0.0; 12];
        if self.config.yearly_seasonality {
            month_effects = mean_by_group(window, &residuals, |p| p.date.month0() as usize);
            for (i, p) in window.iter().enumerate() {
                residuals[i] -= month_effects[p.date.month0() as usize];
            }
        }

        let mut holiday_effect = 0.0;
        if let Some(calendar) = self.config.holidays {
            let holiday_residuals: Vec<f64> = window
                .iter()
                .zip(&residuals)
                .filter(|(p, _)| is_holiday(calendar, p.date))
                .map(|(_, r)| *r)
                .collect();
            if !holiday_residuals.is_empty() {
                holiday_effect =
                    holiday_residuals.iter().sum::<f64>() / holiday_residuals.len() as f64;
                for (i, p) in window.iter().enumerate() {
                    if is_holiday(calendar, p.date) {
                        residuals[i] -= holiday_effect;
                    }
                }
            }
        }

        let sigma = population_std(&residuals);

        debug!(
            points = n,
            trend_len,
            slope,
            sigma,
            "fitted seasonal trend model"
        );

        Ok(SeasonalTrendModel {
            last_date: window[n - 1].date,
            last_x: (n - 1) as f64,
            slope,
            intercept,
            weekday_effects,
            month_effects,
            holiday_effect,
            calendar: self.config.holidays,
            sigma,
            z: z_score(self.config.interval_width),
        })
    }
}

#[async_trait]
impl Forecaster for SeasonalTrendForecaster {
    async fn fit(&self, window: &[PricePoint]) -> Result<Box<dyn ForecastModel>> {
        Ok(Box::new(self.fit_model(window)?))
    }
}

impl ForecastModel for SeasonalTrendModel {
    fn predict(&self, horizon_days: u32) -> Result<Vec<ForecastPoint>> {
        if horizon_days == 0 {
            return Err(HarbingerError::invalid_parameter(
                "horizon must be at least 1 day",
            ));
        }

        let mut points = Vec::with_capacity(horizon_days as usize);
        for k in 1..=i64::from(horizon_days) {
            let date = self.last_date + Duration::days(k);
            let mut estimate = self.intercept + self.slope * (self.last_x + k as f64);
            estimate += self.weekday_effects[date.weekday().num_days_from_monday() as usize];
            estimate += self.month_effects[date.month0() as usize];
            if let Some(calendar) = self.calendar {
                if is_holiday(calendar, date) {
                    estimate += self.holiday_effect;
                }
            }

            // Uncertainty widens with the step ahead.
            let width = self.z * self.sigma * (k as f64).sqrt();
            points.push(ForecastPoint {
                date,
                point_estimate: estimate,
                lower_bound: estimate - width,
                upper_bound: estimate + width,
            });
        }

        Ok(points)
    }
}

/// Length of the trailing segment the trend is fitted on.
///
/// The default prior scale (0.05) uses the whole window; larger scales use
/// proportionally less of it, floored so the fit stays determined.
fn effective_trend_window(n: usize, changepoint_prior_scale: f64) -> usize {
    if changepoint_prior_scale <= 0.0 {
        return n;
    }
    let ratio = (0.05 / changepoint_prior_scale).clamp(0.0, 1.0);
    let len = (n as f64 * ratio).round() as usize;
    len.clamp(MIN_FIT_POINTS.min(n), n)
}

/// Ordinary least squares over the last `len` observations, in the index
/// space of the full window.
fn fit_trend(ys: &[f64], len: usize) -> (f64, f64) {
    let start = ys.len() - len;
    let xs: Vec<f64> = (start..ys.len()).map(|i| i as f64).collect();
    let tail = &ys[start..];

    let mean_x = xs.iter().sum::<f64>() / len as f64;
    let mean_y = tail.iter().sum::<f64>() / len as f64;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (x, y) in xs.iter().zip(tail) {
        covariance += (x - mean_x) * (y - mean_y);
        variance += (x - mean_x).powi(2);
    }

    let slope = if variance > 0.0 { covariance / variance } else { 0.0 };
    (slope, mean_y - slope * mean_x)
}

fn mean_by_group<const N: usize, G>(window: &[PricePoint], residuals: &[f64], group: G) -> [f64; N]
where
    G: Fn(&PricePoint) -> usize,
{
    let mut sums = [0.0; N];
    let mut counts = [0usize; N];
    for (p, r) in window.iter().zip(residuals) {
        let g = group(p);
        sums[g] += r;
        counts[g] += 1;
    }
    let mut means = [0.0; N];
    for g in 0..N {
        if counts[g] > 0 {
            means[g] = sums[g] / counts[g] as f64;
        }
    }
    means
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Two-sided normal critical value for the common interval widths.
fn z_score(interval_width: f64) -> f64 {
    if interval_width >= 0.99 {
        2.576
    } else if interval_width >= 0.95 {
        1.960
    } else if interval_width >= 0.90 {
        1.645
    } else if interval_width >= 0.80 {
        1.282
    } else {
        1.0
    }
}
