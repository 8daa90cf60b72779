//! # Risk-Parity Index
//!
//! $$
//! w_{i,t} = \frac{1/\hat\sigma_{i,t}}{\sum_j 1/\hat\sigma_{j,t}},\qquad
//! \hat\sigma_{i,t} = \operatorname{std}\big(r_{i,t-L+1},\dots,r_{i,t}\big)
//! $$
//!
//! Inverse rolling-volatility weights. The trailing window warms up: it uses whatever
//! observations exist until `L` dates are available.

use ndarray::Array2;
use ndarray::Axis;
use ndarray::s;
use tracing::debug;

use super::compound;
use super::value::weighted_return;

/// Sample standard deviation (ddof = 1) of the finite values in each trailing window.
/// Fewer than two observations leave the entry `NaN`.
pub fn rolling_volatility(returns: &Array2<f64>, window: usize) -> Array2<f64> {
  let (t_len, m) = returns.dim();
  let mut vol = Array2::from_elem((t_len, m), f64::NAN);

  for i in 0..m {
    let col = returns.column(i);
    for t in 0..t_len {
      let lo = (t + 1).saturating_sub(window);
      let obs = col.slice(s![lo..=t]);
      let (n, sum) = obs
        .iter()
        .filter(|r| r.is_finite())
        .fold((0usize, 0.0), |(n, sum), r| (n + 1, sum + r));
      if n < 2 {
        continue;
      }
      // two passes over the view keep constant windows at exactly zero
      let mean = sum / n as f64;
      let ss: f64 = obs
        .iter()
        .filter(|r| r.is_finite())
        .map(|r| (r - mean).powi(2))
        .sum();
      vol[[t, i]] = (ss / (n as f64 - 1.0)).sqrt();
    }
  }

  vol
}

/// `1/vol`, or zero when the volatility is zero, undefined or non-finite.
fn guarded_inverse(vol: f64) -> f64 {
  if vol.is_finite() && vol > 0.0 {
    let inv = 1.0 / vol;
    if inv.is_finite() {
      return inv;
    }
  }
  0.0
}

/// Per-date weights; a row sums to 1, or is all zeros when no asset has a defined
/// inverse volatility and a return on that date.
pub fn inverse_volatility_weights(returns: &Array2<f64>, window: usize) -> Array2<f64> {
  let vol = rolling_volatility(returns, window);
  let mut weights = Array2::zeros(returns.dim());
  let mut empty_dates = 0usize;

  for (t, mut row) in weights.axis_iter_mut(Axis(0)).enumerate() {
    for i in 0..row.len() {
      if returns[[t, i]].is_finite() {
        row[i] = guarded_inverse(vol[[t, i]]);
      }
    }
    let total: f64 = row.sum();
    if total > 0.0 {
      row /= total;
    } else {
      row.fill(0.0);
      empty_dates += 1;
    }
  }

  if empty_dates > 0 {
    debug!(empty_dates, "risk-parity dates without any eligible asset");
  }
  weights
}

pub fn risk_parity_levels(
  returns: &Array2<f64>,
  weights: &Array2<f64>,
  start: usize,
  base: f64,
) -> Vec<f64> {
  let growth = (start + 1..returns.nrows()).map(|t| {
    let w = weights.row(t).to_vec();
    weighted_return(&w, returns.row(t))
  });
  compound(base, growth)
}
