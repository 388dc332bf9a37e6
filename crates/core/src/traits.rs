use crate::error::Result;
use crate::types::{ForecastPoint, PricePoint};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Supplies an ordered historical price series for a symbol.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<Vec<PricePoint>>;
}

/// Trains a forecasting model on a price window.
///
/// Training may take non-trivial wall time; callers apply their own timeout.
/// The forecaster must not cache trained models itself.
#[async_trait]
pub trait Forecaster: Send + Sync {
    async fn fit(&self, window: &[PricePoint]) -> Result<Box<dyn ForecastModel>>;
}

/// A trained model that can forecast forward from its training window.
pub trait ForecastModel: Send + Sync {
    /// Forecasts exactly the next `horizon_days` calendar days after the
    /// training window's last date.
    fn predict(&self, horizon_days: u32) -> Result<Vec<ForecastPoint>>;
}

/// Maps a predicted return and current portfolio value to a position size.
///
/// Implementations must be pure and stateless: the decision depends only on
/// the instantaneous inputs, never on portfolio history.
pub trait StrategyPolicy: Send + Sync {
    fn decide(&self, predicted_return: f64, portfolio_value: Decimal) -> Decimal;
}
