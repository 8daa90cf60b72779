//! # Batched Portfolio Metrics
//!
//! $$
//! \mathbf{R} = P\,W\mu,\qquad
//! \boldsymbol\sigma = \sqrt{\operatorname{diag}(W\Sigma W^\top)},\qquad
//! \mathbf{S} = \frac{\mathbf{R}-r_f}{\boldsymbol\sigma}
//! $$
//!
//! Return, volatility and Sharpe ratio for many weight vectors at once.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use ndarray::Zip;

use super::types::ReturnMethod;

/// `(ret - risk_free) / vol` with the zero-volatility case made explicit: the sign of the
/// excess return picks `+inf` or `-inf`, and no excess return is `NaN`.
pub fn sharpe_ratio(expected_return: f64, volatility: f64, risk_free: f64) -> f64 {
  let excess = expected_return - risk_free;
  if volatility.is_nan() || excess.is_nan() {
    return f64::NAN;
  }
  if volatility > 0.0 {
    return excess / volatility;
  }
  if excess > 0.0 {
    f64::INFINITY
  } else if excess < 0.0 {
    f64::NEG_INFINITY
  } else {
    f64::NAN
  }
}

/// `sqrt(w' Σ w)` for every row of `weights` as one batched quadratic form.
pub fn batch_volatility(weights: &Array2<f64>, cov: &Array2<f64>) -> Array1<f64> {
  (weights.dot(cov) * weights)
    .sum_axis(Axis(1))
    .mapv(|v| v.max(0.0).sqrt())
}

/// Arithmetic annualized return `P * w·μ` per row.
pub fn arithmetic_returns(
  weights: &Array2<f64>,
  mean_returns: &Array1<f64>,
  periods: f64,
) -> Array1<f64> {
  weights.dot(mean_returns) * periods
}

/// Geometric annualized return per row: the portfolio's compounded growth over the
/// rows of `complete_returns`, raised to `periods / T`.
pub fn geometric_returns(
  weights: &Array2<f64>,
  complete_returns: &Array2<f64>,
  periods: f64,
) -> Array1<f64> {
  let t_len = complete_returns.nrows();
  if t_len == 0 {
    return Array1::from_elem(weights.nrows(), f64::NAN);
  }
  // T x N per-period portfolio returns
  let port = complete_returns.dot(&weights.t());
  port
    .map_axis(Axis(0), |col| col.iter().map(|r| 1.0 + r).product::<f64>())
    .mapv(|growth| growth.powf(periods / t_len as f64) - 1.0)
}

/// Inputs the metric computation needs from the optimizer.
pub struct MetricInputs<'a> {
  pub mean_returns: &'a Array1<f64>,
  pub cov: &'a Array2<f64>,
  pub complete_returns: &'a Array2<f64>,
  pub periods_per_year: f64,
  pub risk_free: f64,
}

/// `(returns, volatilities, sharpe)` for every row of `weights`.
pub fn batch_metrics(
  weights: &Array2<f64>,
  inputs: &MetricInputs<'_>,
  method: ReturnMethod,
) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
  let returns = match method {
    ReturnMethod::Arithmetic => {
      arithmetic_returns(weights, inputs.mean_returns, inputs.periods_per_year)
    }
    ReturnMethod::Geometric => {
      geometric_returns(weights, inputs.complete_returns, inputs.periods_per_year)
    }
  };
  let vols = batch_volatility(weights, inputs.cov);
  let sharpe = Zip::from(&returns)
    .and(&vols)
    .map_collect(|&r, &v| sharpe_ratio(r, v, inputs.risk_free));
  (returns, vols, sharpe)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn batched_volatility_matches_rowwise_quadratic_form() {
    let cov = array![[0.04, 0.01, 0.0], [0.01, 0.09, 0.02], [0.0, 0.02, 0.16]];
    let w = array![[0.2, 0.3, 0.5], [1.0, 0.0, 0.0], [0.1, 0.8, 0.1]];
    let vols = batch_volatility(&w, &cov);

    for (k, row) in w.outer_iter().enumerate() {
      let expected = row.dot(&cov.dot(&row)).sqrt();
      assert_abs_diff_eq!(vols[k], expected, epsilon = 1e-14);
    }
    assert_abs_diff_eq!(vols[1], 0.2, epsilon = 1e-14);
  }

  #[test]
  fn zero_volatility_sharpe_is_explicit() {
    assert_eq!(sharpe_ratio(0.10, 0.0, 0.04), f64::INFINITY);
    assert_eq!(sharpe_ratio(0.01, 0.0, 0.04), f64::NEG_INFINITY);
    assert!(sharpe_ratio(0.04, 0.0, 0.04).is_nan());
    assert_abs_diff_eq!(sharpe_ratio(0.14, 0.2, 0.04), 0.5, epsilon = 1e-15);
  }

  #[test]
  fn geometric_compounds_then_rescales() {
    let complete = array![[0.01, 0.02], [0.03, -0.01]];
    let w = array![[0.5, 0.5]];
    let g = geometric_returns(&w, &complete, 4.0);
    let growth: f64 = 1.015 * 1.01;
    assert_abs_diff_eq!(g[0], growth.powf(2.0) - 1.0, epsilon = 1e-12);
  }

  #[test]
  fn arithmetic_is_scaled_mean() {
    let mu = array![0.001, 0.002];
    let w = array![[0.5, 0.5], [0.0, 1.0]];
    let r = arithmetic_returns(&w, &mu, 252.0);
    assert_abs_diff_eq!(r[0], 0.378, epsilon = 1e-12);
    assert_abs_diff_eq!(r[1], 0.504, epsilon = 1e-12);
  }
}
