//! # Portfolio Data Utilities
//!
//! $$
//! \Sigma_{ij} = \frac{P}{n_{ij}-1}\sum_{t\in T_{ij}} (r_{i,t}-\bar r_i)(r_{j,t}-\bar r_j)
//! $$
//!
//! Moment estimation on a date-by-asset return matrix with missing cells. Covariances use
//! pairwise-complete observations, so dates missing one asset only drop out of the pairs
//! that involve it.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;

fn sample_mean(xs: ArrayView1<f64>) -> f64 {
  let (sum, n) = xs
    .iter()
    .filter(|x| x.is_finite())
    .fold((0.0, 0usize), |(s, n), &x| (s + x, n + 1));
  if n == 0 {
    f64::NAN
  } else {
    sum / n as f64
  }
}

/// Per-asset mean return skipping missing cells; `NaN` for an asset with no data.
pub fn mean_returns(returns: &Array2<f64>) -> Array1<f64> {
  returns.map_axis(Axis(0), sample_mean)
}

fn pairwise_covariance(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
  let pairs: Vec<(f64, f64)> = x
    .iter()
    .zip(y.iter())
    .filter(|(a, b)| a.is_finite() && b.is_finite())
    .map(|(&a, &b)| (a, b))
    .collect();
  let n = pairs.len();
  if n < 2 {
    return f64::NAN;
  }

  let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
  let my = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;
  let mut cov = 0.0;
  for (a, b) in &pairs {
    cov += (a - mx) * (b - my);
  }
  cov / (n - 1) as f64
}

/// Pairwise-complete sample covariance (ddof = 1), scaled by `periods_per_year`.
/// Pairs with fewer than two shared observations are `NaN`.
pub fn covariance_matrix(returns: &Array2<f64>, periods_per_year: f64) -> Array2<f64> {
  let m = returns.ncols();
  let mut cov = Array2::zeros((m, m));

  for i in 0..m {
    for j in i..m {
      let c = pairwise_covariance(returns.column(i), returns.column(j)) * periods_per_year;
      cov[[i, j]] = c;
      cov[[j, i]] = c;
    }
  }

  cov
}

/// Rows on which every asset has a return.
pub fn complete_rows(returns: &Array2<f64>) -> Array2<f64> {
  let keep: Vec<usize> = returns
    .outer_iter()
    .enumerate()
    .filter(|(_, row)| row.iter().all(|r| r.is_finite()))
    .map(|(t, _)| t)
    .collect();
  returns.select(Axis(0), &keep)
}

/// Correlation matrix derived from a covariance matrix; zero-variance assets get zero
/// off-diagonal correlation.
pub fn corr_from_cov(cov: &Array2<f64>) -> Array2<f64> {
  let n = cov.nrows();
  let sd: Vec<f64> = (0..n).map(|i| cov[[i, i]].max(0.0).sqrt()).collect();
  Array2::from_shape_fn((n, n), |(i, j)| {
    let denom = sd[i] * sd[j];
    if i == j {
      1.0
    } else if denom > 1e-15 {
      (cov[[i, j]] / denom).clamp(-1.0, 1.0)
    } else {
      0.0
    }
  })
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn means_skip_missing_cells() {
    let r = array![[0.01, f64::NAN], [0.03, 0.02], [f64::NAN, f64::NAN]];
    let mu = mean_returns(&r);
    assert_abs_diff_eq!(mu[0], 0.02, epsilon = 1e-15);
    assert_abs_diff_eq!(mu[1], 0.02, epsilon = 1e-15);
  }

  #[test]
  fn covariance_is_pairwise_and_annualized() {
    let r = array![
      [0.01, 0.02, f64::NAN],
      [0.03, 0.00, 0.01],
      [0.02, 0.01, 0.03],
      [f64::NAN, 0.05, 0.05]
    ];
    let cov = covariance_matrix(&r, 252.0);

    // asset 0 alone: values 0.01, 0.03, 0.02
    assert_abs_diff_eq!(cov[[0, 0]], 0.0001 * 252.0, epsilon = 1e-12);
    // assets 0 and 2 share rows 1 and 2 only
    assert_abs_diff_eq!(cov[[0, 2]], -0.0001 * 252.0, epsilon = 1e-12);
    assert_eq!(cov[[0, 2]], cov[[2, 0]]);
  }

  #[test]
  fn single_shared_observation_is_undefined() {
    let r = array![[0.01, f64::NAN], [0.02, 0.03], [f64::NAN, 0.01]];
    let cov = covariance_matrix(&r, 1.0);
    assert!(cov[[0, 1]].is_nan());
    assert!(cov[[0, 0]].is_finite());
  }

  #[test]
  fn complete_rows_drop_any_missing() {
    let r = array![[0.01, f64::NAN], [0.02, 0.03], [0.04, 0.05]];
    assert_eq!(complete_rows(&r), array![[0.02, 0.03], [0.04, 0.05]]);
  }

  #[test]
  fn correlation_handles_zero_variance() {
    let cov = array![[0.04, 0.0], [0.0, 0.0]];
    let corr = corr_from_cov(&cov);
    assert_eq!(corr, array![[1.0, 0.0], [0.0, 1.0]]);
  }
}
