//! # Price-Weighted Index
//!
//! $$
//! I_t = \frac{1}{M}\sum_{i=1}^{M} \tilde P_{i,t}
//! $$
//!
//! Un-discounted average of rebased prices. A missing rebased price contributes zero and the
//! divisor stays the total number of symbols.

use ndarray::Array2;

pub fn price_weighted_levels(normalized: &Array2<f64>, start: usize) -> Vec<f64> {
  let m = normalized.ncols() as f64;
  normalized
    .outer_iter()
    .skip(start)
    .map(|row| row.iter().filter(|p| p.is_finite()).sum::<f64>() / m)
    .collect()
}
