use crate::constants::TRIM_THRESHOLD;
use crate::distribution::prob_vector::ProbVector;
use crate::make_error;
use eyre::{Report, WrapErr};
use ndarray::{s, Array1, Array2, Axis};
use std::iter::zip;

/// Discrete joint probability mass function over a pair of substitution counts `(x, y)`, e.g. counts in the left and
/// in the right part of a tree. Both axes are trimmed independently.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbMatrix {
  data: Array2<f64>,
}

impl ProbMatrix {
  pub fn zeros(nx: usize, ny: usize) -> Self {
    Self {
      data: Array2::zeros((nx, ny)),
    }
  }

  /// All mass at `(0, 0)`
  pub fn point_mass() -> Self {
    Self {
      data: Array2::from_elem((1, 1), 1.0),
    }
  }

  pub fn from_array(data: Array2<f64>) -> Result<Self, Report> {
    if data.is_empty() {
      return make_error!("Probability matrix must not be empty");
    }
    if let Some(((x, y), p)) = data.indexed_iter().find(|(_, p)| !p.is_finite() || **p < 0.0) {
      return make_error!("Probabilities must be finite and non-negative, but found p[{x},{y}] = {p}");
    }
    Ok(Self { data })
  }

  #[inline]
  pub fn dim(&self) -> (usize, usize) {
    self.data.dim()
  }

  /// Mass at `(x, y)`; zero outside of the support
  #[inline]
  pub fn get(&self, x: usize, y: usize) -> f64 {
    self.data.get((x, y)).copied().unwrap_or(0.0)
  }

  #[inline]
  pub const fn as_array(&self) -> &Array2<f64> {
    &self.data
  }

  #[inline]
  pub(crate) fn as_array_mut(&mut self) -> &mut Array2<f64> {
    &mut self.data
  }

  pub fn to_rows(&self) -> Vec<Vec<f64>> {
    self.data.rows().into_iter().map(|row| row.to_vec()).collect()
  }

  pub fn sum(&self) -> f64 {
    self.data.sum()
  }

  pub fn scale(&mut self, factor: f64) {
    self.data *= factor;
  }

  /// Rescale so that all entries together sum to one
  pub fn normalize(&mut self) -> Result<(), Report> {
    let sum = self.sum();
    if !(sum > 0.0) || !sum.is_finite() {
      return make_error!("Unable to normalize probability matrix with total mass {sum}");
    }
    self.scale(1.0 / sum);
    Ok(())
  }

  /// Drop trailing rows, and then trailing columns, in which every entry is below `threshold`. Keeps at least one
  /// row and one column. Does not renormalize.
  pub fn trim(&mut self, threshold: f64) {
    let (nx, ny) = self.dim();
    let nx_new = (0..nx)
      .rev()
      .find(|&x| self.data.row(x).iter().any(|&p| p >= threshold))
      .map_or(1, |x| x + 1);
    let ny_new = (0..ny)
      .rev()
      .find(|&y| self.data.slice(s![..nx_new, y]).iter().any(|&p| p >= threshold))
      .map_or(1, |y| y + 1);
    if (nx_new, ny_new) != (nx, ny) {
      self.data = self.data.slice(s![..nx_new.min(nx), ..ny_new.min(ny)]).to_owned();
    }
  }

  /// Marginal distribution of `x`
  pub fn marginal_x(&self) -> ProbVector {
    to_prob_vector(self.data.sum_axis(Axis(1)))
  }

  /// Marginal distribution of `y`
  pub fn marginal_y(&self) -> ProbVector {
    to_prob_vector(self.data.sum_axis(Axis(0)))
  }

  /// Distribution of `x + y`
  pub fn marginal_total(&self) -> ProbVector {
    let (nx, ny) = self.dim();
    let mut total = Array1::zeros(nx + ny - 1);
    for ((x, y), &p) in self.data.indexed_iter() {
      total[x + y] += p;
    }
    to_prob_vector(total)
  }

  /// Joint distribution of the component-wise sum of two independent pairs
  pub fn convolve(&self, other: &ProbMatrix) -> ProbMatrix {
    let (nx1, ny1) = self.dim();
    let (nx2, ny2) = other.dim();
    let mut data = Array2::zeros((nx1 + nx2 - 1, ny1 + ny2 - 1));
    for ((x, y), &p) in self.data.indexed_iter() {
      if p == 0.0 {
        continue;
      }
      let mut out = data.slice_mut(s![x..x + nx2, y..y + ny2]);
      out.scaled_add(p, &other.data);
    }
    ProbMatrix { data }
  }

  /// Joint distribution of the sum of `n` independent copies, by repeated pairwise convolution with trimming
  pub fn convolve_n(&self, n: usize) -> Result<ProbMatrix, Report> {
    Self::convolve_many(std::slice::from_ref(self), &[n])
  }

  /// Joint distribution of the sum of independent pairs, where `ps[i]` is repeated `counts[i]` times
  pub fn convolve_many(ps: &[ProbMatrix], counts: &[usize]) -> Result<ProbMatrix, Report> {
    if ps.len() != counts.len() {
      return make_error!(
        "When convolving joint distributions: got {} distributions but {} counts",
        ps.len(),
        counts.len()
      );
    }
    let mut result = ProbMatrix::point_mass();
    for (p, &count) in zip(ps, counts) {
      for _ in 0..count {
        result = result.convolve(p);
        result.trim(TRIM_THRESHOLD);
      }
    }
    result.normalize().wrap_err("When convolving joint distributions")?;
    Ok(result)
  }
}

fn to_prob_vector(data: Array1<f64>) -> ProbVector {
  let mut p = ProbVector::zeros(data.len());
  p.as_array_mut().assign(&data);
  p
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pretty_assert_abs_diff_eq;
  use approx::assert_abs_diff_eq;
  use ndarray::array;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  fn pm(data: Array2<f64>) -> ProbMatrix {
    ProbMatrix::from_array(data).unwrap()
  }

  #[rstest]
  fn computes_marginals() {
    let p = pm(array![[0.1, 0.2, 0.0], [0.3, 0.0, 0.4]]);
    pretty_assert_abs_diff_eq!(p.marginal_x().as_array(), &array![0.3, 0.7], epsilon = 1e-15);
    pretty_assert_abs_diff_eq!(p.marginal_y().as_array(), &array![0.4, 0.2, 0.4], epsilon = 1e-15);
    pretty_assert_abs_diff_eq!(p.marginal_total().as_array(), &array![0.1, 0.5, 0.0, 0.4], epsilon = 1e-15);
  }

  #[rstest]
  fn trims_axes_independently() {
    let mut p = pm(array![
      [0.5, 0.2, 1e-12, 0.0],
      [0.3, 1e-11, 0.0, 0.0],
      [1e-12, 0.0, 0.0, 1e-13],
    ]);
    p.trim(TRIM_THRESHOLD);
    assert_eq!(p.dim(), (2, 2));
    pretty_assert_abs_diff_eq!(p.as_array(), &array![[0.5, 0.2], [0.3, 1e-11]], epsilon = 1e-20);
  }

  #[rstest]
  fn convolution_marginals_are_convolutions_of_marginals() -> Result<(), Report> {
    let p = pm(array![[0.2, 0.3], [0.4, 0.1]]);
    let q = pm(array![[0.6, 0.0, 0.1], [0.1, 0.1, 0.1]]);
    let pq = p.convolve(&q);
    assert_abs_diff_eq!(pq.sum(), 1.0, epsilon = 1e-15);
    pretty_assert_abs_diff_eq!(
      pq.marginal_x().as_array(),
      p.marginal_x().convolve(&q.marginal_x()).as_array(),
      epsilon = 1e-15
    );
    pretty_assert_abs_diff_eq!(
      pq.marginal_total().as_array(),
      p.marginal_total().convolve(&q.marginal_total()).as_array(),
      epsilon = 1e-15
    );
    Ok(())
  }

  #[rstest]
  fn convolves_many() -> Result<(), Report> {
    let p = pm(array![[0.5, 0.5]]);
    let q = pm(array![[0.5], [0.5]]);
    let r = ProbMatrix::convolve_many(&[p, q], &[2, 1])?;
    pretty_assert_abs_diff_eq!(
      r.as_array(),
      &array![[0.125, 0.25, 0.125], [0.125, 0.25, 0.125]],
      epsilon = 1e-15
    );
    Ok(())
  }
}
