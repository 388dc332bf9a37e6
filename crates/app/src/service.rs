//! Transport-independent application service.
//!
//! `AppService` ties the artifact cache, a market data source, the seasonal
//! trend forecaster, and the walk-forward engine into the four caller-facing
//! operations: history, train, predict, backtest. Callers (the CLI today)
//! own presentation; everything here returns plain data or a structured
//! error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::info;

use harbinger_backtest::{BacktestReport, MetricsCalculator, WalkForwardConfig, WalkForwardEngine};
use harbinger_core::config::AppConfig;
use harbinger_core::error::{HarbingerError, Result};
use harbinger_core::traits::{ForecastModel, Forecaster, MarketDataSource};
use harbinger_core::types::{ForecastPoint, PricePoint};
use harbinger_data::{series_csv, ArtifactCache};
use harbinger_forecast::{SeasonalTrendForecaster, SeasonalTrendModel};
use harbinger_strategy::ThresholdPolicy;

/// Caller-facing operations over one cache, one data source, one forecaster.
pub struct AppService<S> {
    source: S,
    cache: Arc<ArtifactCache>,
    forecaster: SeasonalTrendForecaster,
    config: AppConfig,
}

impl<S: MarketDataSource> AppService<S> {
    /// Creates a service around an existing cache and data source.
    pub fn new(source: S, cache: Arc<ArtifactCache>, config: AppConfig) -> Self {
        let forecaster = SeasonalTrendForecaster::new(config.forecast.clone());
        Self {
            source,
            cache,
            forecaster,
            config,
        }
    }

    /// Returns the historical price series for `symbol`, cache-through.
    ///
    /// A fresh cached artifact short-circuits the source entirely; otherwise
    /// the source is fetched and the encoded series replaces the artifact.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a blank symbol, and propagates fetch
    /// and decode failures.
    pub async fn get_history(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        let symbol = normalize_symbol(symbol)?;
        let key = data_key(&symbol);
        let ttl = Duration::from_secs(self.config.cache.data_ttl_secs);

        let bytes = self
            .cache
            .get_or_fetch(&key, ttl, || async {
                let series = self.source.fetch(&symbol).await?;
                series_csv::encode(&series)
            })
            .await?;

        series_csv::decode(&symbol, &bytes)
    }

    /// Trains a model on the full cached history and stores it.
    ///
    /// The stored artifact is always overwritten: retraining a symbol
    /// replaces its model regardless of the old model's age. The fit runs on
    /// a blocking thread under the configured training deadline.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` when the fit exceeds the deadline,
    /// `InsufficientHistory` when the history is too short, and propagates
    /// history failures.
    pub async fn train(&self, symbol: &str) -> Result<SeasonalTrendModel> {
        let history = self.get_history(symbol).await?;
        let symbol = normalize_symbol(symbol)?;

        let deadline_secs = self.config.forecast.train_timeout_secs;
        let forecaster = self.forecaster.clone();
        let window = history.clone();
        let fit = tokio::task::spawn_blocking(move || forecaster.fit_model(&window));

        let joined = tokio::time::timeout(Duration::from_secs(deadline_secs), fit)
            .await
            .map_err(|_| HarbingerError::timeout("train", deadline_secs))?;
        let model = joined.map_err(|e| HarbingerError::train(format!("fit task failed: {e}")))??;

        let bytes = serde_json::to_vec(&model)
            .map_err(|e| HarbingerError::train(format!("model encode: {e}")))?;
        self.cache.store(&model_key(&symbol), &bytes).await?;

        info!(symbol = %symbol, points = history.len(), "model trained and stored");
        Ok(model)
    }

    /// Forecasts `days` calendar days ahead from the stored model.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a zero horizon, `ModelNotFound` when no
    /// fresh model artifact exists for the symbol, and `Train` when the
    /// artifact cannot be decoded.
    pub async fn predict(&self, symbol: &str, days: u32) -> Result<Vec<ForecastPoint>> {
        if days == 0 {
            return Err(HarbingerError::invalid_parameter(
                "forecast horizon must be at least 1 day",
            ));
        }
        let symbol = normalize_symbol(symbol)?;
        let ttl = Duration::from_secs(self.config.cache.model_ttl_secs);

        let bytes = self
            .cache
            .load_fresh(&model_key(&symbol), ttl)
            .await?
            .ok_or_else(|| HarbingerError::model_not_found(&symbol))?;
        let model: SeasonalTrendModel = serde_json::from_slice(&bytes)
            .map_err(|e| HarbingerError::train(format!("stored model for {symbol}: {e}")))?;

        model.predict(days)
    }

    /// Runs a walk-forward backtest over the symbol's cached history.
    ///
    /// The strategy is the configured threshold policy; records and metrics
    /// come back together as one report.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for bad simulation parameters and
    /// propagates history and forecaster failures.
    pub async fn backtest(
        &self,
        symbol: &str,
        lookback: usize,
        horizon: usize,
        initial_capital: Decimal,
    ) -> Result<BacktestReport> {
        let history = self.get_history(symbol).await?;

        let config = WalkForwardConfig::new(lookback, horizon, initial_capital);
        let policy = ThresholdPolicy::new(
            self.config.backtest.threshold,
            decimal_from_f64(self.config.backtest.allocation_fraction)?,
        );
        // Every per-step fit runs under the same deadline as train().
        let forecaster = DeadlineForecaster::new(
            &self.forecaster,
            Duration::from_secs(self.config.forecast.train_timeout_secs),
        );
        let engine = WalkForwardEngine::new(&history, &forecaster, &policy, config)?;
        let records = engine.run().await?;

        let metrics = MetricsCalculator::new(initial_capital)
            .with_risk_free_rate(self.config.backtest.risk_free_rate)
            .with_annualization_factor(self.config.backtest.annualization_factor)
            .compute(&records);

        Ok(BacktestReport { records, metrics })
    }
}

/// Applies a per-call deadline to an inner forecaster's fit.
struct DeadlineForecaster<'a, F> {
    inner: &'a F,
    deadline: Duration,
}

impl<'a, F: Forecaster> DeadlineForecaster<'a, F> {
    fn new(inner: &'a F, deadline: Duration) -> Self {
        Self { inner, deadline }
    }
}

#[async_trait]
impl<F: Forecaster> Forecaster for DeadlineForecaster<'_, F> {
    async fn fit(&self, window: &[PricePoint]) -> Result<Box<dyn ForecastModel>> {
        tokio::time::timeout(self.deadline, self.inner.fit(window))
            .await
            .map_err(|_| HarbingerError::timeout("fit", self.deadline.as_secs()))?
    }
}

/// Converts an f64 amount to the nearest decimal.
///
/// # Errors
///
/// Returns `InvalidParameter` for amounts with no decimal representation
/// (NaN, infinities, out of range).
pub fn decimal_from_f64(amount: f64) -> Result<Decimal> {
    Decimal::from_f64(amount)
        .ok_or_else(|| HarbingerError::invalid_parameter(format!("bad amount {amount}")))
}

fn normalize_symbol(symbol: &str) -> Result<String> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(HarbingerError::invalid_parameter("symbol must not be empty"));
    }
    Ok(trimmed.to_ascii_uppercase())
}

fn data_key(symbol: &str) -> String {
    format!("{symbol}.csv")
}

fn model_key(symbol: &str) -> String {
    format!("{symbol}.model.json")
}
