//! Walk-forward backtesting engine.
//!
//! Slides a training window across a price series one step at a time. Each
//! step retrains the forecaster on the trailing window, turns the forecast
//! into a trade via the strategy policy, settles the trade at the price one
//! horizon ahead, and emits a record. Portfolio value carries across steps,
//! so the record sequence is inherently sequential and non-restartable:
//! records are pulled one at a time in the manner of a data provider's
//! `next_event`.
//!
//! # Indexing
//!
//! With anchor index `i` running from `lookback` to `len - horizon - 1`:
//! the training window is the `lookback` points ending at `i`, the trade
//! settles at `series[i + horizon]`, and the benchmark holds from
//! `series[lookback]` (the first anchor) for the whole run. A series of
//! length `N` therefore yields exactly `max(0, N - lookback - horizon)`
//! records; a series no longer than `lookback + horizon` yields an empty
//! run, by design, rather than an error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use harbinger_core::error::{HarbingerError, Result};
use harbinger_core::traits::{Forecaster, StrategyPolicy};
use harbinger_core::types::{BacktestRecord, PerformanceMetrics, PricePoint};

/// Simulation parameters for one walk-forward run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardConfig {
    /// Trailing observations per training window.
    pub lookback: usize,
    /// Days ahead each forecast covers and each trade is held.
    pub horizon: usize,
    /// Starting portfolio value.
    pub initial_capital: Decimal,
}

impl WalkForwardConfig {
    /// Creates a config with the given windows and starting capital.
    #[must_use]
    pub fn new(lookback: usize, horizon: usize, initial_capital: Decimal) -> Self {
        Self {
            lookback,
            horizon,
            initial_capital,
        }
    }

    /// Validates the simulation parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a zero lookback or horizon, or a
    /// non-positive initial capital.
    pub fn validate(&self) -> Result<()> {
        if self.lookback == 0 {
            return Err(HarbingerError::invalid_parameter("lookback must be positive"));
        }
        if self.horizon == 0 {
            return Err(HarbingerError::invalid_parameter("horizon must be positive"));
        }
        if self.initial_capital <= Decimal::ZERO {
            return Err(HarbingerError::invalid_parameter(
                "initial capital must be positive",
            ));
        }
        Ok(())
    }
}

/// Complete output of one backtest: the step records plus derived metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// One record per simulation step, ordered by date.
    pub records: Vec<BacktestRecord>,
    /// Risk-adjusted performance summary.
    pub metrics: PerformanceMetrics,
}

/// Sliding-window simulator over a single price series.
pub struct WalkForwardEngine<'a> {
    series: &'a [PricePoint],
    forecaster: &'a dyn Forecaster,
    policy: &'a dyn StrategyPolicy,
    config: WalkForwardConfig,
    index: usize,
    portfolio_value: Decimal,
    benchmark_base: Option<Decimal>,
}

impl<'a> WalkForwardEngine<'a> {
    /// Creates an engine positioned at the first window.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the config fails validation or the
    /// series carries a non-positive price; returns and settlements divide
    /// by prices, so every price must be positive. A series too short to
    /// produce any window is accepted and yields zero records.
    pub fn new(
        series: &'a [PricePoint],
        forecaster: &'a dyn Forecaster,
        policy: &'a dyn StrategyPolicy,
        config: WalkForwardConfig,
    ) -> Result<Self> {
        config.validate()?;
        if let Some(bad) = series.iter().find(|p| p.value <= Decimal::ZERO) {
            return Err(HarbingerError::invalid_parameter(format!(
                "non-positive price {} at {}",
                bad.value, bad.date
            )));
        }
        let benchmark_base = series.get(config.lookback).map(|p| p.value);
        Ok(Self {
            series,
            forecaster,
            policy,
            index: config.lookback,
            portfolio_value: config.initial_capital,
            benchmark_base,
            config,
        })
    }

    /// Advances one window and emits its record, or `None` when the series
    /// is exhausted. Each call retrains the forecaster; a forecaster failure
    /// aborts the run with no retry.
    ///
    /// # Errors
    ///
    /// Propagates forecaster fit/predict failures.
    pub async fn next_record(&mut self) -> Result<Option<BacktestRecord>> {
        if self.index + self.config.horizon >= self.series.len() {
            return Ok(None);
        }
        let Some(benchmark_base) = self.benchmark_base else {
            return Ok(None);
        };

        let i = self.index;
        let anchor = &self.series[i];
        let train_window = &self.series[i + 1 - self.config.lookback..=i];
        let settle = &self.series[i + self.config.horizon];

        let model = self.forecaster.fit(train_window).await?;
        let forecast = model.predict(self.config.horizon as u32)?;
        let terminal = forecast
            .last()
            .ok_or_else(|| HarbingerError::train("forecaster produced no points"))?;

        let anchor_price = f64::try_from(anchor.value).unwrap_or(0.0);
        let predicted_return = if anchor_price > 0.0 {
            terminal.point_estimate / anchor_price - 1.0
        } else {
            0.0
        };

        let actual_return = (settle.value - anchor.value) / anchor.value;
        let position_size = self.policy.decide(predicted_return, self.portfolio_value);

        // An untaken trade is a flat step: value unchanged, never implicitly
        // invested in the benchmark.
        self.portfolio_value += position_size * actual_return;

        let benchmark_value = self.config.initial_capital * settle.value / benchmark_base;

        debug!(
            date = %anchor.date,
            predicted_return,
            actual_return = %actual_return,
            position = %position_size,
            portfolio = %self.portfolio_value,
            "walk-forward step settled"
        );

        self.index += 1;
        Ok(Some(BacktestRecord {
            date: anchor.date,
            portfolio_value: self.portfolio_value,
            benchmark_value,
            predicted_return,
            actual_return: f64::try_from(actual_return).unwrap_or(0.0),
        }))
    }

    /// Drains the remaining windows into an ordered record sequence.
    ///
    /// # Errors
    ///
    /// Propagates the first forecaster failure; no partial recovery.
    pub async fn run(mut self) -> Result<Vec<BacktestRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await? {
            records.push(record);
        }
        info!(
            steps = records.len(),
            lookback = self.config.lookback,
            horizon = self.config.horizon,
            "walk-forward run complete"
        );
        Ok(records)
    }
}
