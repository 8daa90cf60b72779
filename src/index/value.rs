//! # Value-Weighted Index
//!
//! $$
//! w_{i,t} = \frac{P_{i,t} S_i}{\sum_j P_{j,t} S_j},\qquad
//! I_t = I_{t-1}\Big(1 + \sum_i w_{i,t}\, r_{i,t}\Big)
//! $$
//!
//! Weights are date-varying market-capitalization shares over the assets that have both a
//! close and a return on the date.

use ndarray::Array2;
use ndarray::ArrayView1;

use super::compound;

/// Capitalization weights for one date. Assets without a usable cap or return get zero;
/// a zero total cap yields all zeros.
pub fn cap_weights(close: ArrayView1<f64>, returns: ArrayView1<f64>, shares: &[f64]) -> Vec<f64> {
  let caps: Vec<f64> = close
    .iter()
    .zip(returns.iter())
    .zip(shares)
    .map(|((&p, &r), &s)| {
      let cap = p * s;
      if r.is_finite() && cap.is_finite() && cap > 0.0 {
        cap
      } else {
        0.0
      }
    })
    .collect();

  let total: f64 = caps.iter().sum();
  if total > 0.0 {
    caps.iter().map(|c| c / total).collect()
  } else {
    vec![0.0; caps.len()]
  }
}

/// Sum of `w_i r_i` skipping zero weights so missing returns never reach the product.
pub(crate) fn weighted_return(weights: &[f64], returns: ArrayView1<f64>) -> f64 {
  weights
    .iter()
    .zip(returns.iter())
    .filter(|&(&w, _)| w > 0.0)
    .map(|(w, r)| w * r)
    .sum()
}

pub fn value_weighted_levels(
  returns: &Array2<f64>,
  close: &Array2<f64>,
  shares: &[f64],
  start: usize,
  base: f64,
) -> Vec<f64> {
  let growth = (start + 1..returns.nrows()).map(|t| {
    let w = cap_weights(close.row(t), returns.row(t), shares);
    weighted_return(&w, returns.row(t))
  });
  compound(base, growth)
}
