//! # Annualized Metrics
//!
//! $$
//! R_{\text{ann}} = \Big(\prod_{t=1}^{n}(1+r_t)\Big)^{P/n} - 1,\qquad
//! \sigma_{\text{ann}} = \sigma\sqrt{P}
//! $$
//!
//! Annualized return and volatility of a periodic return series.

use crate::error::PortfolioError;
use crate::error::Result;

/// Annualized performance of a return series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnualizedMetrics {
  /// Geometric annualized return.
  pub annualized_return: f64,
  /// Population standard deviation scaled by `sqrt(periods_per_year)`.
  pub annualized_volatility: f64,
}

impl AnnualizedMetrics {
  pub fn from_returns(returns: &[f64], periods_per_year: usize) -> Result<Self> {
    Ok(Self {
      annualized_return: annualized_return(returns, periods_per_year)?,
      annualized_volatility: annualized_volatility(returns, periods_per_year)?,
    })
  }
}

/// Compound the series and rescale the exponent to one year.
pub fn annualized_return(returns: &[f64], periods_per_year: usize) -> Result<f64> {
  if returns.is_empty() {
    return Err(PortfolioError::InsufficientData(
      "annualized return needs at least one observation".into(),
    ));
  }
  let growth: f64 = returns.iter().map(|r| 1.0 + r).product();
  Ok(growth.powf(periods_per_year as f64 / returns.len() as f64) - 1.0)
}

/// Population standard deviation times `sqrt(periods_per_year)`.
pub fn annualized_volatility(returns: &[f64], periods_per_year: usize) -> Result<f64> {
  if returns.len() < 2 {
    return Err(PortfolioError::InsufficientData(
      "annualized volatility needs at least two observations".into(),
    ));
  }
  let n = returns.len() as f64;
  let mean = returns.iter().sum::<f64>() / n;
  let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
  Ok(var.sqrt() * (periods_per_year as f64).sqrt())
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn full_year_of_constant_returns() {
    let returns = vec![0.001; 252];
    let m = AnnualizedMetrics::from_returns(&returns, 252).unwrap();
    assert_abs_diff_eq!(m.annualized_return, 1.001_f64.powi(252) - 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(m.annualized_volatility, 0.0, epsilon = 1e-15);
  }

  #[test]
  fn half_year_is_scaled_up() {
    let returns = vec![0.01, -0.01, 0.02];
    let r = annualized_return(&returns, 6).unwrap();
    let growth = 1.01 * 0.99 * 1.02;
    assert_abs_diff_eq!(r, growth * growth - 1.0, epsilon = 1e-12);
  }

  #[test]
  fn volatility_uses_population_std() {
    let v = annualized_volatility(&[0.01, -0.01], 4).unwrap();
    assert_abs_diff_eq!(v, 0.01 * 2.0, epsilon = 1e-12);
  }

  #[test]
  fn short_series_are_rejected() {
    assert!(annualized_return(&[], 252).is_err());
    assert!(annualized_volatility(&[0.01], 252).is_err());
  }
}
