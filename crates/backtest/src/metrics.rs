//! Performance metrics over a walk-forward record sequence.
//!
//! All ratios are computed in f64 from the exact Decimal record values.
//! Degenerate inputs (no records, a single record, zero dispersion) produce
//! guarded zero defaults, never NaN or infinity. The alpha here is a simple
//! unannualized mean step-return difference while the Sharpe ratio is
//! annualized; the mismatched time bases are intentional and preserved.

use rust_decimal::Decimal;

use harbinger_core::types::{BacktestRecord, PerformanceMetrics};

/// Computes risk-adjusted metrics from backtest records.
pub struct MetricsCalculator {
    initial_capital: Decimal,
    risk_free_rate: f64,
    annualization_factor: f64,
}

impl MetricsCalculator {
    /// Creates a calculator with the default 3% annual risk-free rate and
    /// 252 steps per year.
    #[must_use]
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            risk_free_rate: 0.03,
            annualization_factor: 252.0,
        }
    }

    /// Sets the annual risk-free rate.
    #[must_use]
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    /// Sets the annualization factor (steps per year).
    #[must_use]
    pub fn with_annualization_factor(mut self, factor: f64) -> Self {
        self.annualization_factor = factor;
        self
    }

    /// Derives the metrics for an ordered record sequence.
    #[must_use]
    pub fn compute(&self, records: &[BacktestRecord]) -> PerformanceMetrics {
        let Some(last) = records.last() else {
            return PerformanceMetrics::empty();
        };

        let capital = f64::try_from(self.initial_capital).unwrap_or(0.0);
        let portfolio: Vec<f64> = records
            .iter()
            .map(|r| f64::try_from(r.portfolio_value).unwrap_or(0.0))
            .collect();
        let benchmark: Vec<f64> = records
            .iter()
            .map(|r| f64::try_from(r.benchmark_value).unwrap_or(0.0))
            .collect();

        let total_return = if capital > 0.0 {
            f64::try_from(last.portfolio_value).unwrap_or(0.0) / capital - 1.0
        } else {
            0.0
        };
        let benchmark_return = if capital > 0.0 {
            f64::try_from(last.benchmark_value).unwrap_or(0.0) / capital - 1.0
        } else {
            0.0
        };

        let portfolio_steps = step_returns(&portfolio);
        let benchmark_steps = step_returns(&benchmark);

        PerformanceMetrics {
            total_return,
            benchmark_return,
            sharpe_ratio: self.sharpe(&portfolio_steps),
            alpha: alpha(&portfolio_steps, &benchmark_steps),
            max_drawdown: max_drawdown(&portfolio),
        }
    }

    /// Annualized Sharpe ratio over excess step returns. Zero when fewer
    /// than two step returns exist or the dispersion is zero.
    fn sharpe(&self, steps: &[f64]) -> f64 {
        if steps.len() < 2 {
            return 0.0;
        }

        let daily_risk_free =
            (1.0 + self.risk_free_rate).powf(1.0 / self.annualization_factor) - 1.0;
        let excess: Vec<f64> = steps.iter().map(|r| r - daily_risk_free).collect();

        let mean = excess.iter().sum::<f64>() / excess.len() as f64;
        let variance =
            excess.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / excess.len() as f64;
        let std_dev = variance.sqrt();

        if std_dev > 0.0 {
            self.annualization_factor.sqrt() * mean / std_dev
        } else {
            0.0
        }
    }
}

/// Per-step fractional changes; the first value has no step return.
fn step_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|pair| {
            if pair[0] != 0.0 {
                pair[1] / pair[0] - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Simple unannualized mean step-return difference.
fn alpha(portfolio_steps: &[f64], benchmark_steps: &[f64]) -> f64 {
    if portfolio_steps.is_empty() || benchmark_steps.is_empty() {
        return 0.0;
    }
    let mean_p = portfolio_steps.iter().sum::<f64>() / portfolio_steps.len() as f64;
    let mean_b = benchmark_steps.iter().sum::<f64>() / benchmark_steps.len() as f64;
    mean_p - mean_b
}

/// Worst decline from the running peak as a non-positive fraction; zero when
/// the series never dips below its peak.
fn max_drawdown(values: &[f64]) -> f64 {
    let mut worst = 0.0_f64;
    let mut peak = f64::MIN;
    for &value in values {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let drawdown = value / peak - 1.0;
            if drawdown < worst {
                worst = drawdown;
            }
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use rust_decimal_macros::dec;

    fn records_from(portfolio: &[Decimal], benchmark: &[Decimal]) -> Vec<BacktestRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        portfolio
            .iter()
            .zip(benchmark)
            .enumerate()
            .map(|(i, (p, b))| BacktestRecord {
                date: start + Duration::days(i as i64),
                portfolio_value: *p,
                benchmark_value: *b,
                predicted_return: 0.0,
                actual_return: 0.0,
            })
            .collect()
    }

    fn flat_benchmark(n: usize) -> Vec<Decimal> {
        vec![dec!(10000); n]
    }

    // ============================================
    // Guarded Default Tests
    // ============================================

    #[test]
    fn empty_records_yield_zero_metrics() {
        let metrics = MetricsCalculator::new(dec!(10000)).compute(&[]);
        assert_eq!(metrics, PerformanceMetrics::empty());
    }

    #[test]
    fn single_record_has_zero_sharpe() {
        let records = records_from(&[dec!(11000)], &flat_benchmark(1));
        let metrics = MetricsCalculator::new(dec!(10000)).compute(&records);
        assert!((metrics.sharpe_ratio).abs() < f64::EPSILON);
        assert!((metrics.total_return - 0.1).abs() < 1e-12);
    }

    #[test]
    fn two_records_have_one_step_return_and_zero_sharpe() {
        let records = records_from(&[dec!(10000), dec!(11000)], &flat_benchmark(2));
        let metrics = MetricsCalculator::new(dec!(10000)).compute(&records);
        assert!((metrics.sharpe_ratio).abs() < f64::EPSILON);
    }

    #[test]
    fn identical_step_returns_have_zero_sharpe() {
        // 10% every step: dispersion is exactly zero.
        let records = records_from(
            &[dec!(10000), dec!(11000), dec!(12100), dec!(13310)],
            &flat_benchmark(4),
        );
        let metrics = MetricsCalculator::new(dec!(10000)).compute(&records);
        assert!((metrics.sharpe_ratio).abs() < f64::EPSILON);
    }

    #[test]
    fn varying_positive_returns_have_positive_sharpe() {
        let records = records_from(
            &[dec!(10000), dec!(10100), dec!(10500), dec!(10600)],
            &flat_benchmark(4),
        );
        let metrics = MetricsCalculator::new(dec!(10000)).compute(&records);
        assert!(metrics.sharpe_ratio > 0.0);
        assert!(metrics.sharpe_ratio.is_finite());
    }

    // ============================================
    // Total Return Tests
    // ============================================

    #[test]
    fn total_and_benchmark_returns_use_final_values() {
        let records = records_from(
            &[dec!(10000), dec!(12000)],
            &[dec!(11000), dec!(9000)],
        );
        let metrics = MetricsCalculator::new(dec!(10000)).compute(&records);
        assert!((metrics.total_return - 0.2).abs() < 1e-12);
        assert!((metrics.benchmark_return + 0.1).abs() < 1e-12);
    }

    // ============================================
    // Alpha Tests
    // ============================================

    #[test]
    fn alpha_is_mean_step_return_difference() {
        // Portfolio steps: +10%, +10%. Benchmark steps: 0%, 0%.
        let records = records_from(
            &[dec!(10000), dec!(11000), dec!(12100)],
            &[dec!(10000), dec!(10000), dec!(10000)],
        );
        let metrics = MetricsCalculator::new(dec!(10000)).compute(&records);
        assert!((metrics.alpha - 0.1).abs() < 1e-12);
    }

    #[test]
    fn alpha_is_zero_when_portfolio_tracks_benchmark() {
        let values = [dec!(10000), dec!(10500), dec!(11025)];
        let records = records_from(&values, &values.to_vec());
        let metrics = MetricsCalculator::new(dec!(10000)).compute(&records);
        assert!(metrics.alpha.abs() < 1e-12);
    }

    // ============================================
    // Drawdown Tests
    // ============================================

    #[test]
    fn drawdown_is_zero_for_non_decreasing_series() {
        let records = records_from(
            &[dec!(10000), dec!(10000), dec!(10500), dec!(11000)],
            &flat_benchmark(4),
        );
        let metrics = MetricsCalculator::new(dec!(10000)).compute(&records);
        assert!((metrics.max_drawdown).abs() < f64::EPSILON);
    }

    #[test]
    fn drawdown_measures_decline_from_running_peak() {
        // Peak 12000, trough 9000: drawdown = 9000/12000 - 1 = -0.25.
        let records = records_from(
            &[dec!(10000), dec!(12000), dec!(9000), dec!(11000)],
            &flat_benchmark(4),
        );
        let metrics = MetricsCalculator::new(dec!(10000)).compute(&records);
        assert!((metrics.max_drawdown + 0.25).abs() < 1e-12);
    }

    #[test]
    fn drawdown_is_never_positive() {
        let records = records_from(
            &[dec!(10000), dec!(10700), dec!(10200), dec!(11500), dec!(11100)],
            &flat_benchmark(5),
        );
        let metrics = MetricsCalculator::new(dec!(10000)).compute(&records);
        assert!(metrics.max_drawdown <= 0.0);
    }

    // ============================================
    // Builder Tests
    // ============================================

    #[test]
    fn builders_override_defaults() {
        let calculator = MetricsCalculator::new(dec!(10000))
            .with_risk_free_rate(0.0)
            .with_annualization_factor(52.0);
        // With a zero risk-free rate and constant positive returns the
        // dispersion is still zero, so the guard applies.
        let records = records_from(
            &[dec!(10000), dec!(11000), dec!(12100)],
            &flat_benchmark(3),
        );
        let metrics = calculator.compute(&records);
        assert!((metrics.sharpe_ratio).abs() < f64::EPSILON);
    }
}
