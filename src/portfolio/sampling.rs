//! # Random Weight Sampling
//!
//! $$
//! w_{k,i} = \frac{u_{k,i}}{\sum_j u_{k,j}},\qquad u_{k,i}\sim\mathcal U[0,1)
//! $$
//!
//! Long-only weights by row-normalizing non-negative draws. The induced distribution over
//! the simplex is not uniform (it concentrates near equal weights); this is accepted in
//! exchange for needing no rejection step.

use ndarray::Array2;
use ndarray::Axis;
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;

/// `n x m` matrix whose rows are long-only weight vectors summing to one.
pub fn random_weights<R: Rng + ?Sized>(rng: &mut R, n: usize, m: usize) -> Array2<f64> {
  let mut w = Array2::random_using((n, m), Uniform::new(0.0, 1.0), rng);

  for mut row in w.axis_iter_mut(Axis(0)) {
    let total = row.sum();
    if total > 0.0 {
      row /= total;
    } else {
      row.fill(1.0 / m as f64);
    }
  }

  w
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;
  use rand::rngs::StdRng;

  use super::*;

  #[test]
  fn rows_are_long_only_and_sum_to_one() {
    let mut rng = StdRng::seed_from_u64(42);
    let w = random_weights(&mut rng, 2_000, 5);

    assert_eq!(w.dim(), (2_000, 5));
    for row in w.outer_iter() {
      assert!((row.sum() - 1.0).abs() < 1e-9);
      assert!(row.iter().all(|&x| (0.0..=1.0).contains(&x)));
    }
  }

  #[test]
  fn same_seed_same_draws() {
    let a = random_weights(&mut StdRng::seed_from_u64(7), 100, 3);
    let b = random_weights(&mut StdRng::seed_from_u64(7), 100, 3);
    let c = random_weights(&mut StdRng::seed_from_u64(8), 100, 3);
    assert_eq!(a, b);
    assert_ne!(a, c);
  }
}
