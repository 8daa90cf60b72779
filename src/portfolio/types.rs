//! # Portfolio Types
//!
//! $$
//! S = \frac{\mathbb E[R_p]-r_f}{\sigma_p}
//! $$
//!
//! Shared enums and result containers for the optimizer.

use std::fmt::Display;
use std::str::FromStr;

use ndarray::Array1;
use ndarray::Array2;

use crate::error::PortfolioError;

/// Aggregation of per-period returns into an annual figure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReturnMethod {
  /// Mean per-period return times periods per year.
  #[default]
  Arithmetic,
  /// Compounded growth rescaled to one year.
  Geometric,
}

impl ReturnMethod {
  const NAMES: [&'static str; 2] = ["arithmetic", "geometric"];
}

impl FromStr for ReturnMethod {
  type Err = PortfolioError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "arithmetic" => Ok(Self::Arithmetic),
      "geometric" => Ok(Self::Geometric),
      _ => Err(PortfolioError::unknown_option(
        "return method",
        s,
        &Self::NAMES,
      )),
    }
  }
}

impl Display for ReturnMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ReturnMethod::Arithmetic => write!(f, "{}", Self::NAMES[0]),
      ReturnMethod::Geometric => write!(f, "{}", Self::NAMES[1]),
    }
  }
}

/// Risk/return summary of one portfolio.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PortfolioStats {
  /// Annualized expected return.
  pub expected_return: f64,
  /// Annualized volatility.
  pub volatility: f64,
  /// `(expected_return - risk_free) / volatility`; `NaN` or infinite at zero volatility.
  pub sharpe: f64,
  /// Per-asset weights in panel symbol order.
  pub weights: Vec<f64>,
}

/// Statistics of a batch of portfolios, one row of `weights` per portfolio.
#[derive(Clone, Debug, PartialEq)]
pub struct PortfolioCloud {
  pub returns: Array1<f64>,
  pub volatilities: Array1<f64>,
  pub sharpe: Array1<f64>,
  pub weights: Array2<f64>,
}

impl PortfolioCloud {
  pub fn len(&self) -> usize {
    self.returns.len()
  }

  pub fn is_empty(&self) -> bool {
    self.returns.is_empty()
  }

  /// Record of the `i`-th portfolio.
  pub fn get(&self, i: usize) -> Option<PortfolioStats> {
    (i < self.len()).then(|| PortfolioStats {
      expected_return: self.returns[i],
      volatility: self.volatilities[i],
      sharpe: self.sharpe[i],
      weights: self.weights.row(i).to_vec(),
    })
  }

  /// Index of the largest Sharpe ratio, ignoring `NaN`.
  pub fn max_sharpe_index(&self) -> Option<usize> {
    finite_order_extreme(&self.sharpe, |a, b| a > b)
  }

  /// Index of the smallest volatility, ignoring `NaN`.
  pub fn min_volatility_index(&self) -> Option<usize> {
    finite_order_extreme(&self.volatilities, |a, b| a < b)
  }

  /// `(min, max)` of the finite returns.
  pub fn return_range(&self) -> Option<(f64, f64)> {
    self
      .returns
      .iter()
      .filter(|r| r.is_finite())
      .fold(None, |acc, &r| match acc {
        None => Some((r, r)),
        Some((lo, hi)) => Some((lo.min(r), hi.max(r))),
      })
  }

  /// Largest finite volatility.
  pub fn max_volatility(&self) -> Option<f64> {
    self
      .volatilities
      .iter()
      .copied()
      .filter(|v| v.is_finite())
      .reduce(f64::max)
  }
}

/// First index whose value beats every other under `better`; `NaN` never wins.
fn finite_order_extreme(xs: &Array1<f64>, better: impl Fn(f64, f64) -> bool) -> Option<usize> {
  let mut best: Option<usize> = None;
  for (i, &x) in xs.iter().enumerate() {
    if x.is_nan() {
      continue;
    }
    match best {
      Some(b) if !better(x, xs[b]) => {}
      _ => best = Some(i),
    }
  }
  best
}

/// Output of a Monte Carlo run.
#[derive(Clone, Debug)]
pub struct MonteCarloResult {
  pub cloud: PortfolioCloud,
  /// Sampled approximation of the tangency portfolio.
  pub max_sharpe: PortfolioStats,
  pub min_volatility: PortfolioStats,
}

/// Minimum-volatility portfolio for one target return.
#[derive(Clone, Debug, PartialEq)]
pub struct FrontierPoint {
  pub target_return: f64,
  pub volatility: f64,
  pub weights: Vec<f64>,
}

/// Two endpoints of the capital market line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapitalMarketLine {
  pub x: [f64; 2],
  pub y: [f64; 2],
  /// Sharpe ratio of the tangency portfolio.
  pub slope: f64,
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;

  fn cloud() -> PortfolioCloud {
    PortfolioCloud {
      returns: array![0.05, 0.12, 0.08],
      volatilities: array![0.10, 0.20, f64::NAN],
      sharpe: array![f64::NAN, 0.4, 0.3],
      weights: array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]],
    }
  }

  #[test]
  fn selection_ignores_nan() {
    let c = cloud();
    assert_eq!(c.max_sharpe_index(), Some(1));
    assert_eq!(c.min_volatility_index(), Some(0));
    assert_eq!(c.return_range(), Some((0.05, 0.12)));
    assert_eq!(c.max_volatility(), Some(0.20));
    assert_eq!(c.get(2).unwrap().weights, vec![0.5, 0.5]);
    assert!(c.get(3).is_none());
  }

  #[test]
  fn unknown_return_method_lists_options() {
    let err = "log".parse::<ReturnMethod>().unwrap_err();
    assert_eq!(
      err.to_string(),
      "unknown return method 'log', valid options: arithmetic, geometric"
    );
    assert_eq!("Geometric".parse::<ReturnMethod>().unwrap(), ReturnMethod::Geometric);
  }
}
