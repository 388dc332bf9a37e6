//! Threshold trading policy.
//!
//! Takes a position only when the forecasted return clears a minimum edge,
//! sizing the trade as a fixed fraction of current portfolio value. The
//! decision is pure: it sees only the predicted return and the instantaneous
//! portfolio value, never the history.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use harbinger_core::traits::StrategyPolicy;

/// Allocates a fixed fraction of the portfolio when the predicted return
/// exceeds a threshold; otherwise stays flat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    /// Minimum predicted return, exclusive, required to trade.
    pub threshold: f64,
    /// Fraction of portfolio value allocated to a taken trade. Held as a
    /// decimal so position sizing stays exact for any fraction.
    pub allocation_fraction: Decimal,
}

impl ThresholdPolicy {
    /// Creates a policy with explicit parameters.
    #[must_use]
    pub fn new(threshold: f64, allocation_fraction: Decimal) -> Self {
        Self {
            threshold,
            allocation_fraction,
        }
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            threshold: 0.02,
            allocation_fraction: Decimal::new(10, 2),
        }
    }
}

impl StrategyPolicy for ThresholdPolicy {
    fn decide(&self, predicted_return: f64, portfolio_value: Decimal) -> Decimal {
        if predicted_return > self.threshold {
            self.allocation_fraction * portfolio_value
        } else {
            Decimal::ZERO
        }
    }
}
