//! # Equal-Weighted Index
//!
//! $$
//! I_t = I_{t-1}\Big(1 + \frac{1}{|A_t|}\sum_{i\in A_t} r_{i,t}\Big)
//! $$
//!
//! `A_t` is the set of assets with a return on date `t`. A date with no returns leaves the
//! level unchanged.

use ndarray::Array2;
use ndarray::ArrayView1;

use super::compound;

/// Mean of the finite entries, `0.0` when there are none.
pub(crate) fn cross_sectional_mean(row: ArrayView1<f64>) -> f64 {
  let (sum, n) = row
    .iter()
    .filter(|r| r.is_finite())
    .fold((0.0, 0usize), |(s, n), &r| (s + r, n + 1));
  if n == 0 {
    0.0
  } else {
    sum / n as f64
  }
}

/// Levels from `start` onward; the level at `start` is `base`.
pub fn equal_weighted_levels(returns: &Array2<f64>, start: usize, base: f64) -> Vec<f64> {
  let growth = (start + 1..returns.nrows()).map(|t| cross_sectional_mean(returns.row(t)));
  compound(base, growth)
}
