//! CSV codec for price series artifacts.
//!
//! The cached form of a series is a two-column `date,close` CSV, which keeps
//! artifacts inspectable with ordinary tools.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use harbinger_core::error::{HarbingerError, Result};
use harbinger_core::types::{validate_series, PricePoint};

/// Encodes a series as `date,close` CSV bytes.
///
/// # Errors
///
/// Returns `Fetch` if the writer fails, which does not happen for in-memory
/// output under normal conditions.
pub fn encode(series: &[PricePoint]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["date", "close"])
        .map_err(|e| HarbingerError::fetch(format!("csv encode: {e}")))?;
    for point in series {
        writer
            .write_record([point.date.to_string(), point.value.to_string()])
            .map_err(|e| HarbingerError::fetch(format!("csv encode: {e}")))?;
    }
    writer
        .into_inner()
        .map_err(|e| HarbingerError::fetch(format!("csv encode: {e}")))
}

/// Decodes `date,close` CSV bytes into a validated series.
///
/// # Errors
///
/// Returns `Fetch` on malformed rows, `EmptySeries` when no rows decode, and
/// `InvalidParameter` when dates are not strictly increasing.
pub fn decode(symbol: &str, bytes: &[u8]) -> Result<Vec<PricePoint>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut series = Vec::new();

    for row in reader.records() {
        let record = row.map_err(|e| HarbingerError::fetch(format!("csv decode: {e}")))?;
        if record.len() < 2 {
            return Err(HarbingerError::fetch(format!(
                "csv decode: expected 2 columns, got {}",
                record.len()
            )));
        }
        let date = NaiveDate::from_str(&record[0])
            .map_err(|e| HarbingerError::fetch(format!("bad date {:?}: {e}", &record[0])))?;
        let value = Decimal::from_str(&record[1])
            .map_err(|e| HarbingerError::fetch(format!("bad close {:?}: {e}", &record[1])))?;
        series.push(PricePoint::new(date, value));
    }

    validate_series(symbol, &series)?;
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_series() -> Vec<PricePoint> {
        vec![
            PricePoint::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), dec!(187.15)),
            PricePoint::new(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), dec!(184.25)),
            PricePoint::new(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(), dec!(181.91)),
        ]
    }

    #[test]
    fn encode_then_decode_preserves_series() {
        let series = sample_series();
        let bytes = encode(&series).unwrap();
        let back = decode("AAPL", &bytes).unwrap();
        assert_eq!(back, series);
    }

    #[test]
    fn encode_writes_header_row() {
        let bytes = encode(&sample_series()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("date,close\n"));
    }

    #[test]
    fn decode_rejects_header_only_input() {
        let err = decode("AAPL", b"date,close\n").unwrap_err();
        assert_eq!(err.kind(), "empty_series");
    }

    #[test]
    fn decode_rejects_malformed_date() {
        let err = decode("AAPL", b"date,close\nnot-a-date,100\n").unwrap_err();
        assert_eq!(err.kind(), "fetch_error");
    }

    #[test]
    fn decode_rejects_malformed_close() {
        let err = decode("AAPL", b"date,close\n2024-01-02,abc\n").unwrap_err();
        assert_eq!(err.kind(), "fetch_error");
    }

    #[test]
    fn decode_rejects_unordered_dates() {
        let input = b"date,close\n2024-01-03,100\n2024-01-02,101\n";
        let err = decode("AAPL", input).unwrap_err();
        assert_eq!(err.kind(), "invalid_parameter");
    }
}
