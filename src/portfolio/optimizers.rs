//! # Tangency Optimizer
//!
//! $$
//! \max_{\mathbf{w}\in\Delta}\
//! \frac{\mathbf{w}^\top\mu-r_f}{\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}},
//! \qquad \mathbf{w}=\operatorname{softmax}(\mathbf{x})
//! $$
//!
//! Long-only maximum-Sharpe search. The simplex constraint is removed by optimizing
//! unconstrained logits with Nelder-Mead.

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::solver::neldermead::NelderMead;
use ndarray::Array1;
use ndarray::Array2;
use tracing::warn;

use super::metrics::sharpe_ratio;
use super::types::PortfolioStats;

/// Stand-in objective when the volatility of a candidate is zero.
const DEGENERATE_SHARPE: f64 = 1e10;

fn dot(a: &[f64], b: &[f64]) -> f64 {
  a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn quad_form(cov: &Array2<f64>, w: &[f64]) -> f64 {
  let w = Array1::from(w.to_vec());
  w.dot(&cov.dot(&w))
}

fn softmax(x: &[f64]) -> Vec<f64> {
  if x.is_empty() {
    return Vec::new();
  }

  let max_x = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let exps: Vec<f64> = x.iter().map(|&v| (v - max_x).exp()).collect();
  let sum: f64 = exps.iter().sum();

  if sum < 1e-15 {
    vec![1.0 / x.len() as f64; x.len()]
  } else {
    exps.into_iter().map(|e| e / sum).collect()
  }
}

/// Annualized statistics of a fixed weight vector.
pub fn portfolio_stats(
  weights: Vec<f64>,
  mu: &[f64],
  cov: &Array2<f64>,
  risk_free: f64,
) -> PortfolioStats {
  let expected_return = dot(&weights, mu);
  let volatility = quad_form(cov, &weights).max(0.0).sqrt();
  PortfolioStats {
    expected_return,
    volatility,
    sharpe: sharpe_ratio(expected_return, volatility, risk_free),
    weights,
  }
}

struct NegativeSharpe {
  mu: Vec<f64>,
  cov: Array2<f64>,
  risk_free: f64,
}

impl CostFunction for NegativeSharpe {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
    let w = softmax(x);
    let ret = dot(&w, &self.mu);
    let vol = quad_form(&self.cov, &w).max(0.0).sqrt();
    let s = sharpe_ratio(ret, vol, self.risk_free);

    let s = if s.is_nan() {
      0.0
    } else {
      s.clamp(-DEGENERATE_SHARPE, DEGENERATE_SHARPE)
    };
    Ok(-s)
  }
}

/// Long-only tangency portfolio for annualized `mu` and `cov`.
///
/// Falls back to equal weights when the solver cannot be set up or fails to run.
pub fn max_sharpe(mu: &[f64], cov: &Array2<f64>, risk_free: f64) -> PortfolioStats {
  let n = mu.len();
  if n == 0 {
    return PortfolioStats::default();
  }
  if n == 1 {
    return portfolio_stats(vec![1.0], mu, cov, risk_free);
  }

  let cost = NegativeSharpe {
    mu: mu.to_vec(),
    cov: cov.clone(),
    risk_free,
  };

  let x0 = vec![0.0; n];
  let mut simplex = Vec::with_capacity(n + 1);
  simplex.push(x0.clone());
  for i in 0..n {
    let mut point = x0.clone();
    point[i] = 1.0;
    simplex.push(point);
  }

  let w = match NelderMead::new(simplex).with_sd_tolerance(1e-10) {
    Ok(solver) => {
      match Executor::new(cost, solver)
        .configure(|state| state.max_iters(5000))
        .run()
      {
        Ok(res) => {
          let best_x = res.state.best_param.unwrap_or(x0);
          softmax(&best_x)
        }
        Err(err) => {
          warn!(%err, "tangency search failed, using equal weights");
          vec![1.0 / n as f64; n]
        }
      }
    }
    Err(err) => {
      warn!(%err, "tangency solver rejected its simplex, using equal weights");
      vec![1.0 / n as f64; n]
    }
  };

  portfolio_stats(w, mu, cov, risk_free)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn uncorrelated_tangency_matches_closed_form() {
    // w ∝ Σ^{-1}(μ - r_f) = [0.08 / 0.04, 0.04 / 0.01] = [2, 4]
    let mu = [0.10, 0.06];
    let cov = array![[0.04, 0.0], [0.0, 0.01]];
    let best = max_sharpe(&mu, &cov, 0.02);

    assert_abs_diff_eq!(best.weights[0], 1.0 / 3.0, epsilon = 1e-3);
    assert_abs_diff_eq!(best.weights[1], 2.0 / 3.0, epsilon = 1e-3);
    assert_abs_diff_eq!(best.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
  }

  #[test]
  fn dominated_asset_is_almost_dropped() {
    let mu = [0.12, 0.08, -0.05];
    let cov = array![[0.04, 0.0, 0.0], [0.0, 0.02, 0.0], [0.0, 0.0, 0.03]];
    let best = max_sharpe(&mu, &cov, 0.04);

    assert!(best.weights[2] < 0.02, "weights {:?}", best.weights);
    let equal = portfolio_stats(vec![1.0 / 3.0; 3], &mu, &cov, 0.04);
    assert!(best.sharpe > equal.sharpe);
  }

  #[test]
  fn single_asset_needs_no_search() {
    let best = max_sharpe(&[0.07], &array![[0.0]], 0.04);
    assert_eq!(best.weights, vec![1.0]);
    assert_eq!(best.volatility, 0.0);
    assert_eq!(best.sharpe, f64::INFINITY);
  }

  #[test]
  fn softmax_is_a_simplex_point() {
    let w = softmax(&[800.0, 0.0, -5.0]);
    assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    assert!(w.iter().all(|&x| x >= 0.0));
    assert!(softmax(&[]).is_empty());
  }
}
