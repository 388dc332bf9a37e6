//! Daily-quote client for the Stooq CSV endpoint.
//!
//! Stooq serves end-of-day history as plain CSV
//! (`Date,Open,High,Low,Close,Volume`), no API key required. Plain US
//! tickers get a `.us` suffix; symbols that already carry a market suffix
//! pass through unchanged.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use harbinger_core::config::MarketDataConfig;
use harbinger_core::error::{HarbingerError, Result};
use harbinger_core::traits::MarketDataSource;
use harbinger_core::types::{validate_series, PricePoint};

const BACKOFF_BASE_MS: u64 = 500;
const BACKOFF_MAX_SHIFT: u32 = 6;

/// Exponential retry delay, capped so large attempt counts cannot overflow
/// the shift.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(BACKOFF_BASE_MS << attempt.min(BACKOFF_MAX_SHIFT))
}

/// HTTP client for Stooq daily price history.
#[derive(Debug, Clone)]
pub struct StooqClient {
    client: reqwest::Client,
    endpoint: String,
    timeout_secs: u64,
    max_retries: u32,
}

impl StooqClient {
    /// Creates a client from market-data configuration.
    ///
    /// # Errors
    ///
    /// Returns `Fetch` if the HTTP client cannot be constructed.
    pub fn new(config: &MarketDataConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HarbingerError::fetch(format!("http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        })
    }

    fn url_for(&self, symbol: &str) -> String {
        let lower = symbol.to_lowercase();
        let qualified = if lower.contains('.') {
            lower
        } else {
            format!("{lower}.us")
        };
        format!("{}/q/d/l/?s={qualified}&i=d", self.endpoint)
    }

    async fn fetch_once(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        let url = self.url_for(symbol);
        debug!(symbol, %url, "fetching daily history");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                HarbingerError::timeout("fetch", self.timeout_secs)
            } else {
                HarbingerError::fetch(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarbingerError::fetch(format!(
                "{symbol}: http status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| HarbingerError::fetch(format!("reading body: {e}")))?;

        parse_daily_csv(symbol, &body)
    }
}

#[async_trait]
impl MarketDataSource for StooqClient {
    async fn fetch(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(symbol).await {
                Ok(series) => return Ok(series),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        symbol,
                        attempt,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "transient fetch failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Parses a Stooq `Date,Open,High,Low,Close,Volume` body into a series.
///
/// # Errors
///
/// Returns `EmptySeries` when the body has no data rows and `Fetch` on
/// malformed rows.
pub fn parse_daily_csv(symbol: &str, body: &str) -> Result<Vec<PricePoint>> {
    // Stooq answers unknown symbols with a short "No data" body.
    if body.trim().is_empty() || body.starts_with("No data") {
        return Err(HarbingerError::empty_series(symbol));
    }

    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let mut series = Vec::new();

    for row in reader.records() {
        let record = row.map_err(|e| HarbingerError::fetch(format!("{symbol}: csv row: {e}")))?;
        if record.len() < 5 {
            return Err(HarbingerError::fetch(format!(
                "{symbol}: expected at least 5 columns, got {}",
                record.len()
            )));
        }
        let date = NaiveDate::from_str(&record[0])
            .map_err(|e| HarbingerError::fetch(format!("{symbol}: bad date: {e}")))?;
        let close = Decimal::from_str(&record[4])
            .map_err(|e| HarbingerError::fetch(format!("{symbol}: bad close: {e}")))?;
        series.push(PricePoint::new(date, close));
    }

    if series.is_empty() {
        return Err(HarbingerError::empty_series(symbol));
    }

    series.sort_by_key(|p| p.date);
    validate_series(symbol, &series)?;
    Ok(series)
}
