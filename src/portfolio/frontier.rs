//! # Efficient Frontier
//!
//! $$
//! \min_{\mathbf{w}}\ \tfrac12\mathbf{w}^\top\Sigma\mathbf{w}
//! \quad\text{s.t.}\quad \mathbf{1}^\top\mathbf{w}=1,\ \ \mu^\top\mathbf{w}=r^\*,\ \ 0\le w_i\le 1
//! $$
//!
//! Long-only minimum-variance portfolios solved with a primal active-set quadratic
//! programming method. With `1'w = 1` and `w >= 0` the upper bound `w <= 1` always holds,
//! so only the lower bounds enter the working set. Each iteration solves the KKT system of
//! the equality-constrained subproblem on the free assets through an SVD, which tolerates
//! singular covariance matrices.

use nalgebra::DMatrix;
use nalgebra::DVector;
use ndarray::Array1;
use ndarray::Array2;
use rayon::prelude::*;
use tracing::trace;

use super::types::FrontierPoint;

const STEP_TOL: f64 = 1e-12;
const MULTIPLIER_TOL: f64 = 1e-12;
const FEASIBILITY_TOL: f64 = 1e-8;

/// `n` evenly spaced values over `[lo, hi]` inclusive.
pub fn target_returns(lo: f64, hi: f64, n: usize) -> Vec<f64> {
  match n {
    0 => Vec::new(),
    1 => vec![lo],
    _ => {
      let step = (hi - lo) / (n - 1) as f64;
      (0..n)
        .map(|i| if i == n - 1 { hi } else { lo + step * i as f64 })
        .collect()
    }
  }
}

/// Equality-constrained, non-negative quadratic program `min ½ x'Qx`.
pub struct ActiveSetQp<'a> {
  q: &'a DMatrix<f64>,
  a_eq: DMatrix<f64>,
  b_eq: DVector<f64>,
  max_iters: usize,
}

impl<'a> ActiveSetQp<'a> {
  pub fn new(q: &'a DMatrix<f64>, a_eq: DMatrix<f64>, b_eq: DVector<f64>) -> Self {
    let max_iters = 100 + 50 * q.nrows();
    Self {
      q,
      a_eq,
      b_eq,
      max_iters,
    }
  }

  /// Solve from a feasible `x0`. `None` when the iteration cap is hit, a KKT system cannot
  /// be solved, or the result drifts off the constraint set.
  pub fn solve(&self, x0: DVector<f64>) -> Option<DVector<f64>> {
    let n = x0.len();
    let k = self.a_eq.nrows();
    let mut x = x0;
    let mut active: Vec<bool> = x.iter().map(|&v| v <= STEP_TOL).collect();
    for (xi, &a) in x.iter_mut().zip(&active) {
      if a {
        *xi = 0.0;
      }
    }

    for iter in 0..self.max_iters {
      let free: Vec<usize> = (0..n).filter(|&i| !active[i]).collect();
      if free.is_empty() {
        trace!(iter, "working set covers every asset");
        return None;
      }
      let nf = free.len();
      let g = self.q * &x;

      let mut kkt = DMatrix::<f64>::zeros(nf + k, nf + k);
      let mut rhs = DVector::<f64>::zeros(nf + k);
      for (r, &i) in free.iter().enumerate() {
        for (c, &j) in free.iter().enumerate() {
          kkt[(r, c)] = self.q[(i, j)];
        }
        for e in 0..k {
          kkt[(r, nf + e)] = self.a_eq[(e, i)];
          kkt[(nf + e, r)] = self.a_eq[(e, i)];
        }
        rhs[r] = -g[i];
      }

      let sol = match kkt.svd(true, true).solve(&rhs, 1e-14) {
        Ok(sol) => sol,
        Err(err) => {
          trace!(iter, err, "KKT solve failed");
          return None;
        }
      };
      let p = sol.rows(0, nf);
      let lambda = sol.rows(nf, k);

      if p.amax() <= STEP_TOL {
        let at_lambda = self.a_eq.transpose() * lambda;
        let release = (0..n)
          .filter(|&i| active[i])
          .map(|i| (i, g[i] + at_lambda[i]))
          .filter(|&(_, nu)| nu < -MULTIPLIER_TOL)
          .min_by(|a, b| a.1.total_cmp(&b.1));

        match release {
          Some((i, _)) => active[i] = false,
          None => return self.finish(x, iter),
        }
        continue;
      }

      let mut alpha = 1.0;
      let mut blocking = None;
      for (r, &i) in free.iter().enumerate() {
        if p[r] < 0.0 {
          let a = -x[i] / p[r];
          if a < alpha {
            alpha = a;
            blocking = Some(i);
          }
        }
      }
      for (r, &i) in free.iter().enumerate() {
        x[i] += alpha * p[r];
      }
      if let Some(i) = blocking {
        x[i] = 0.0;
        active[i] = true;
      }
    }

    trace!(max_iters = self.max_iters, "active-set iteration cap reached");
    None
  }

  fn finish(&self, mut x: DVector<f64>, iters: usize) -> Option<DVector<f64>> {
    if x.iter().any(|&v| v < -FEASIBILITY_TOL || !v.is_finite()) {
      return None;
    }
    x.iter_mut().for_each(|v| *v = v.max(0.0));
    let residual = (&self.a_eq * &x - &self.b_eq).amax();
    if residual > FEASIBILITY_TOL {
      trace!(residual, "solution violates equality constraints");
      return None;
    }
    trace!(iters, "active-set solve converged");
    Some(x)
  }
}

/// Equal weights moved along the simplex toward the highest (or lowest) return asset until
/// the portfolio return equals `target`. `None` when no long-only portfolio reaches it.
pub fn feasible_start(mu: &[f64], target: f64) -> Option<DVector<f64>> {
  let m = mu.len();
  if m == 0 || !target.is_finite() {
    return None;
  }
  let eq = 1.0 / m as f64;
  let mean = mu.iter().sum::<f64>() / m as f64;
  let tol = FEASIBILITY_TOL * (1.0 + target.abs());

  let (lo, hi) = mu.iter().enumerate().fold((0, 0), |(lo, hi), (i, &v)| {
    (
      if v < mu[lo] { i } else { lo },
      if v > mu[hi] { i } else { hi },
    )
  });
  if target > mu[hi] + tol || target < mu[lo] - tol {
    return None;
  }

  let mut w = DVector::from_element(m, eq);
  if (target - mean).abs() <= tol {
    return Some(w);
  }
  let vertex = if target > mean { hi } else { lo };
  let s = ((target - mean) / (mu[vertex] - mean)).clamp(0.0, 1.0);
  w *= 1.0 - s;
  w[vertex] += s;
  Some(w)
}

pub(crate) fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
  DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

/// Minimum-variance long-only weights with `mu·w = target`.
pub fn min_variance_for_target(
  cov: &DMatrix<f64>,
  mu: &[f64],
  target: f64,
) -> Option<Vec<f64>> {
  let m = mu.len();
  let x0 = feasible_start(mu, target)?;

  // a unique extreme-return asset is the only portfolio reaching its own return
  let tol = FEASIBILITY_TOL * (1.0 + target.abs());
  let at_extreme =
    mu.iter().all(|&v| v <= target + tol) || mu.iter().all(|&v| v >= target - tol);
  let hits: Vec<usize> = (0..m).filter(|&i| (mu[i] - target).abs() <= tol).collect();
  if at_extreme && hits.len() == 1 {
    let mut w = vec![0.0; m];
    w[hits[0]] = 1.0;
    return Some(w);
  }

  let a_eq = DMatrix::from_fn(2, m, |r, c| if r == 0 { 1.0 } else { mu[c] });
  let b_eq = DVector::from_vec(vec![1.0, target]);
  ActiveSetQp::new(cov, a_eq, b_eq)
    .solve(x0)
    .map(|w| w.iter().copied().collect())
}

/// Global minimum-variance long-only weights.
pub fn global_min_variance(cov: &DMatrix<f64>) -> Option<Vec<f64>> {
  let m = cov.nrows();
  if m == 0 {
    return None;
  }
  let a_eq = DMatrix::from_element(1, m, 1.0);
  let b_eq = DVector::from_element(1, 1.0);
  ActiveSetQp::new(cov, a_eq, b_eq)
    .solve(DVector::from_element(m, 1.0 / m as f64))
    .map(|w| w.iter().copied().collect())
}

/// Solve every target independently; unsolved targets are dropped and the remaining
/// points keep the order of `targets`.
pub fn efficient_frontier(
  cov: &Array2<f64>,
  mu: &Array1<f64>,
  targets: &[f64],
) -> Vec<FrontierPoint> {
  let q = to_dmatrix(cov);
  let mu = mu.to_vec();

  targets
    .par_iter()
    .filter_map(|&target| {
      let weights = min_variance_for_target(&q, &mu, target)?;
      let w = DVector::from_column_slice(&weights);
      let volatility = w.dot(&(&q * &w)).max(0.0).sqrt();
      Some(FrontierPoint {
        target_return: target,
        volatility,
        weights,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  fn cov3() -> Array2<f64> {
    array![[0.04, 0.006, 0.0], [0.006, 0.09, 0.012], [0.0, 0.012, 0.16]]
  }

  #[test]
  fn linspace_includes_endpoints() {
    let t = target_returns(0.1, 0.2, 5);
    assert_eq!(t.len(), 5);
    assert_eq!(t[0], 0.1);
    assert_eq!(t[4], 0.2);
    assert_abs_diff_eq!(t[2], 0.15, epsilon = 1e-15);
    assert_eq!(target_returns(0.3, 0.5, 1), vec![0.3]);
  }

  #[test]
  fn two_uncorrelated_assets_match_closed_form() {
    let cov = to_dmatrix(&array![[0.04, 0.0], [0.0, 0.09]]);
    let w = global_min_variance(&cov).unwrap();
    // w_1 = s2^2 / (s1^2 + s2^2)
    assert_abs_diff_eq!(w[0], 0.09 / 0.13, epsilon = 1e-10);
    assert_abs_diff_eq!(w[1], 0.04 / 0.13, epsilon = 1e-10);
  }

  #[test]
  fn bound_becomes_active_for_dominated_asset() {
    // third asset is much riskier and positively correlated with the first
    let cov = to_dmatrix(&array![[0.01, 0.0, 0.02], [0.0, 0.01, 0.0], [0.02, 0.0, 1.0]]);
    let w = global_min_variance(&cov).unwrap();
    assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-10);
    assert_eq!(w[2], 0.0);
    assert_abs_diff_eq!(w[0], 0.5, epsilon = 1e-10);
  }

  #[test]
  fn target_constraint_is_met() {
    let cov = to_dmatrix(&cov3());
    let mu = [0.05, 0.10, 0.20];
    let w = min_variance_for_target(&cov, &mu, 0.12).unwrap();

    let ret: f64 = w.iter().zip(&mu).map(|(a, b)| a * b).sum();
    assert_abs_diff_eq!(ret, 0.12, epsilon = 1e-9);
    assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    assert!(w.iter().all(|&x| (0.0..=1.0).contains(&x)));
  }

  #[test]
  fn unreachable_target_is_dropped() {
    let cov = cov3();
    let mu = array![0.05, 0.10, 0.20];
    let points = efficient_frontier(&cov, &mu, &[0.01, 0.08, 0.15, 0.30]);

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].target_return, 0.08);
    assert_eq!(points[1].target_return, 0.15);
  }

  #[test]
  fn extreme_targets_select_single_assets() {
    let cov = to_dmatrix(&cov3());
    let mu = [0.05, 0.10, 0.20];
    let top = min_variance_for_target(&cov, &mu, 0.20).unwrap();
    assert_abs_diff_eq!(top[2], 1.0, epsilon = 1e-9);
  }

  #[test]
  fn volatility_grows_away_from_minimum_variance() {
    let cov = cov3();
    let mu = array![0.05, 0.10, 0.20];
    let q = to_dmatrix(&cov);
    let gmv = global_min_variance(&q).unwrap();
    let gmv_ret: f64 = gmv.iter().zip(mu.iter()).map(|(a, b)| a * b).sum();

    let targets = target_returns(0.05, 0.20, 61);
    let points = efficient_frontier(&cov, &mu, &targets);
    assert_eq!(points.len(), targets.len());

    let (above, below): (Vec<&FrontierPoint>, Vec<&FrontierPoint>) =
      points.iter().partition(|p| p.target_return >= gmv_ret);
    for pair in above.windows(2) {
      assert!(pair[1].volatility >= pair[0].volatility - 1e-10);
    }
    for pair in below.windows(2) {
      assert!(pair[0].volatility >= pair[1].volatility - 1e-10);
    }
  }

  #[test]
  fn equal_expected_returns_only_reach_their_common_value() {
    let mu = [0.1, 0.1];
    assert!(feasible_start(&mu, 0.1).is_some());
    assert!(feasible_start(&mu, 0.2).is_none());
  }
}
