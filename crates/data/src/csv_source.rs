//! Market-data source backed by a local `date,close` CSV file.
//!
//! Useful for offline backtests and deterministic test fixtures.

use std::path::PathBuf;

use async_trait::async_trait;

use harbinger_core::error::Result;
use harbinger_core::traits::MarketDataSource;
use harbinger_core::types::PricePoint;

use crate::series_csv;

/// Reads a series from a CSV file regardless of the requested symbol.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    /// Creates a source reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MarketDataSource for CsvFileSource {
    async fn fetch(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        let bytes = tokio::fs::read(&self.path).await?;
        series_csv::decode(symbol, &bytes)
    }
}
