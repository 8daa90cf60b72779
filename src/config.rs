//! # Engine Configuration
//!
//! $$
//! r_f^{\text{daily}} = (1 + r_f)^{1/P} - 1
//! $$
//!
//! Tunables shared by the index builder and the portfolio optimizer.

use crate::error::PortfolioError;
use crate::error::Result;
use crate::portfolio::ReturnMethod;

/// Runtime configuration for [`crate::IndexBuilder`] and [`crate::PortfolioOptimizer`].
#[derive(Clone, Debug)]
pub struct EngineConfig {
  /// Trading periods per year used for annualization.
  pub periods_per_year: usize,
  /// Annual risk-free rate used in Sharpe ratios and the capital market line.
  pub risk_free_rate: f64,
  /// Number of Monte Carlo portfolios.
  pub iterations: usize,
  /// Seed for the optimizer's random generator.
  pub seed: u64,
  /// Trailing window (in dates) for risk-parity volatility.
  pub risk_parity_window: usize,
  /// Number of evenly spaced target returns on the efficient frontier.
  pub frontier_points: usize,
  /// Multiplier applied to the largest observed volatility for the CML right endpoint.
  pub cml_padding: f64,
  /// Starting level of compounding indices.
  pub base_value: f64,
  /// Return aggregation used for the Monte Carlo cloud.
  pub return_method: ReturnMethod,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      periods_per_year: 252,
      risk_free_rate: 0.04,
      iterations: 10_000,
      seed: 42,
      risk_parity_window: 252,
      frontier_points: 1_000,
      cml_padding: 1.1,
      base_value: 1.0,
      return_method: ReturnMethod::Arithmetic,
    }
  }
}

impl EngineConfig {
  /// Per-period risk-free rate compounding to [`EngineConfig::risk_free_rate`] over a year.
  pub fn daily_risk_free_rate(&self) -> f64 {
    (1.0 + self.risk_free_rate).powf(1.0 / self.periods_per_year as f64) - 1.0
  }

  /// Reject values no computation can use.
  pub fn validate(&self) -> Result<()> {
    if self.periods_per_year == 0 {
      return Err(PortfolioError::InvalidParameter(
        "periods_per_year must be > 0".into(),
      ));
    }
    if !self.risk_free_rate.is_finite() {
      return Err(PortfolioError::InvalidParameter(
        "risk_free_rate must be finite".into(),
      ));
    }
    if self.iterations == 0 {
      return Err(PortfolioError::InvalidParameter(
        "iterations must be > 0".into(),
      ));
    }
    if self.risk_parity_window == 0 {
      return Err(PortfolioError::InvalidParameter(
        "risk_parity_window must be > 0".into(),
      ));
    }
    if self.frontier_points == 0 {
      return Err(PortfolioError::InvalidParameter(
        "frontier_points must be > 0".into(),
      ));
    }
    if !(self.cml_padding.is_finite() && self.cml_padding > 0.0) {
      return Err(PortfolioError::InvalidParameter(
        "cml_padding must be a positive finite number".into(),
      ));
    }
    if !(self.base_value.is_finite() && self.base_value > 0.0) {
      return Err(PortfolioError::InvalidParameter(
        "base_value must be a positive finite number".into(),
      ));
    }
    Ok(())
  }
}
