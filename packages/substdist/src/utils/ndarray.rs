use ndarray::{Array, Array2, Axis, Dimension};

#[cfg(test)]
use {crate::make_error, eyre::Report};

/// Clamp each element to at least `lower`
pub fn clamp_min<D: Dimension>(a: &Array<f64, D>, lower: f64) -> Array<f64, D> {
  a.mapv(|x| num_traits::clamp_min(x, lower))
}

/// Infinity norm of a matrix: maximum absolute row sum
#[cfg(test)]
pub fn norm_inf(a: &Array2<f64>) -> f64 {
  a.map(|x| x.abs())
    .sum_axis(Axis(1))
    .fold(0.0_f64, |acc, &x| acc.max(x))
}

/// Checks that every row of a matrix sums to `expected` within `tol`
pub fn rows_sum_to(a: &Array2<f64>, expected: f64, tol: f64) -> bool {
  a.sum_axis(Axis(1)).iter().all(|s| (s - expected).abs() < tol)
}

/// Matrix exponential by scaling and squaring of a truncated Taylor series.
///
/// Accurate to machine precision for the small, well-conditioned generator matrices used here. Serves as the
/// reference for transition probabilities in tests.
#[cfg(test)]
pub fn expm(a: &Array2<f64>) -> Result<Array2<f64>, Report> {
  let (nrows, ncols) = a.dim();
  if nrows != ncols {
    return make_error!("When computing matrix exponential: matrix must be square, but found shape {nrows}x{ncols}");
  }

  let norm = norm_inf(a);
  if !norm.is_finite() {
    return make_error!("When computing matrix exponential: matrix contains non-finite values");
  }

  // scale so that the norm is below 1/2, where 20 Taylor terms are far below machine epsilon
  let mut squarings = 0_i32;
  while norm / 2.0_f64.powi(squarings) > 0.5 {
    squarings += 1;
  }
  let scaled = a / 2.0_f64.powi(squarings);

  let mut result = Array2::<f64>::eye(nrows);
  let mut term = Array2::<f64>::eye(nrows);
  for k in 1..=20_i32 {
    term = term.dot(&scaled) / f64::from(k);
    result += &term;
  }

  for _ in 0..squarings {
    result = result.dot(&result);
  }

  Ok(result)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pretty_assert_abs_diff_eq;
  use ndarray::array;
  use rstest::rstest;

  #[rstest]
  fn computes_expm_of_zero() -> Result<(), Report> {
    let zero = Array2::<f64>::zeros((3, 3));
    pretty_assert_abs_diff_eq!(expm(&zero)?, Array2::<f64>::eye(3), epsilon = 1e-15);
    Ok(())
  }

  #[rstest]
  fn computes_expm_of_two_state_generator() -> Result<(), Report> {
    // exp(Qt) for Q = [[-1, 1], [1, -1]] has closed form 0.5 * (1 +- exp(-2t))
    let t = 0.7_f64;
    let q = array![[-1.0, 1.0], [1.0, -1.0]] * t;
    let same = 0.5 * (1.0 + (-2.0 * t).exp());
    let diff = 0.5 * (1.0 - (-2.0 * t).exp());
    pretty_assert_abs_diff_eq!(expm(&q)?, array![[same, diff], [diff, same]], epsilon = 1e-13);
    Ok(())
  }

  #[rstest]
  fn computes_expm_of_large_generator() -> Result<(), Report> {
    let q = array![[-1.0, 1.0], [1.0, -1.0]] * 50.0;
    pretty_assert_abs_diff_eq!(expm(&q)?, array![[0.5, 0.5], [0.5, 0.5]], epsilon = 1e-10);
    Ok(())
  }

  #[rstest]
  fn rejects_non_square_matrix() {
    assert!(expm(&Array2::<f64>::zeros((2, 3))).is_err());
  }

  #[rstest]
  fn checks_row_sums() {
    let a = array![[0.25, 0.75], [0.5, 0.5]];
    assert!(rows_sum_to(&a, 1.0, 1e-12));
    assert!(!rows_sum_to(&a, 0.0, 1e-12));
    assert_eq!(norm_inf(&array![[-3.0, 1.0], [0.5, 0.5]]), 4.0);
  }
}
