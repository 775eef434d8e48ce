use crate::constants::TRIM_THRESHOLD;
use crate::make_error;
use eyre::{Report, WrapErr};
use itertools::Itertools;
use ndarray::{s, Array1};
use std::iter::zip;

/// Discrete probability mass function over substitution counts `0..len()`.
///
/// The logical size is the length of the underlying array. It shrinks when trailing mass is trimmed and grows on
/// convolution.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbVector {
  data: Array1<f64>,
}

impl ProbVector {
  pub fn zeros(len: usize) -> Self {
    Self {
      data: Array1::zeros(len),
    }
  }

  /// All mass at zero substitutions
  pub fn point_mass() -> Self {
    Self {
      data: Array1::from_elem(1, 1.0),
    }
  }

  pub fn from_vec(data: Vec<f64>) -> Result<Self, Report> {
    Self::from_array(Array1::from_vec(data))
  }

  pub fn from_array(data: Array1<f64>) -> Result<Self, Report> {
    if data.is_empty() {
      return make_error!("Probability vector must not be empty");
    }
    if let Some((i, p)) = data.iter().find_position(|p| !p.is_finite() || **p < 0.0) {
      return make_error!("Probabilities must be finite and non-negative, but found p[{i}] = {p}");
    }
    Ok(Self { data })
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.data.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// Mass at `n` substitutions; zero outside of the support
  #[inline]
  pub fn get(&self, n: usize) -> f64 {
    self.data.get(n).copied().unwrap_or(0.0)
  }

  #[inline]
  pub const fn as_array(&self) -> &Array1<f64> {
    &self.data
  }

  #[inline]
  pub(crate) fn as_array_mut(&mut self) -> &mut Array1<f64> {
    &mut self.data
  }

  pub fn to_vec(&self) -> Vec<f64> {
    self.data.to_vec()
  }

  pub fn sum(&self) -> f64 {
    self.data.sum()
  }

  pub fn scale(&mut self, factor: f64) {
    self.data *= factor;
  }

  /// Rescale so that entries sum to one
  pub fn normalize(&mut self) -> Result<(), Report> {
    let sum = self.sum();
    if !(sum > 0.0) || !sum.is_finite() {
      return make_error!("Unable to normalize probability vector with total mass {sum}");
    }
    self.scale(1.0 / sum);
    Ok(())
  }

  /// Drop trailing entries below `threshold`, keeping at least one entry. Does not renormalize.
  pub fn trim(&mut self, threshold: f64) {
    let len = self
      .data
      .iter()
      .rposition(|&p| p >= threshold)
      .map_or(1, |last| last + 1)
      .min(self.len());
    if len < self.len() {
      self.data = self.data.slice(s![..len]).to_owned();
    }
  }

  pub fn mean(&self) -> f64 {
    self.stats().0
  }

  pub fn variance(&self) -> f64 {
    self.stats().1
  }

  /// Mean and variance of the number of substitutions, assuming the vector is normalized
  pub fn stats(&self) -> (f64, f64) {
    let (mean, sq) = self
      .data
      .iter()
      .enumerate()
      .fold((0.0, 0.0), |(mean, sq), (n, &p)| {
        let n = n as f64;
        (mean + n * p, sq + n * n * p)
      });
    (mean, sq - mean * mean)
  }

  /// Distribution of the sum of two independent counts
  pub fn convolve(&self, other: &ProbVector) -> ProbVector {
    let mut data = Array1::zeros(self.len() + other.len() - 1);
    for (i, &p) in self.data.iter().enumerate() {
      if p == 0.0 {
        continue;
      }
      let mut out = data.slice_mut(s![i..i + other.len()]);
      out.scaled_add(p, &other.data);
    }
    ProbVector { data }
  }

  /// Distribution of the sum of `n` independent copies, by repeated pairwise convolution with trimming
  pub fn convolve_n(&self, n: usize) -> Result<ProbVector, Report> {
    Self::convolve_many(std::slice::from_ref(self), &[n])
  }

  /// Distribution of the sum of independent counts, where distribution `ps[i]` is repeated `counts[i]` times
  pub fn convolve_many(ps: &[ProbVector], counts: &[usize]) -> Result<ProbVector, Report> {
    if ps.len() != counts.len() {
      return make_error!(
        "When convolving distributions: got {} distributions but {} counts",
        ps.len(),
        counts.len()
      );
    }
    let mut result = ProbVector::point_mass();
    for (p, &count) in zip(ps, counts) {
      for _ in 0..count {
        result = result.convolve(p);
        result.trim(TRIM_THRESHOLD);
      }
    }
    result.normalize().wrap_err("When convolving distributions")?;
    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pretty_assert_abs_diff_eq;
  use approx::assert_abs_diff_eq;
  use ndarray::array;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  fn pv(data: &[f64]) -> ProbVector {
    ProbVector::from_vec(data.to_vec()).unwrap()
  }

  #[rstest]
  fn rejects_invalid_entries() {
    assert!(ProbVector::from_vec(vec![]).is_err());
    assert!(ProbVector::from_vec(vec![0.5, -0.1]).is_err());
    assert!(ProbVector::from_vec(vec![f64::NAN]).is_err());
  }

  #[rstest]
  fn normalizes() -> Result<(), Report> {
    let mut p = pv(&[1.0, 3.0]);
    p.normalize()?;
    pretty_assert_abs_diff_eq!(p.as_array(), &array![0.25, 0.75], epsilon = 1e-15);
    assert!(ProbVector::zeros(3).normalize().is_err());
    Ok(())
  }

  #[rstest]
  #[case::nothing_to_trim(&[0.5, 0.5], 2)]
  #[case::trailing(&[0.5, 0.5, 1e-11, 1e-12], 2)]
  #[case::keeps_inner_zeros(&[0.5, 0.0, 0.5, 0.0], 3)]
  #[case::keeps_one(&[1e-11, 1e-12], 1)]
  fn trims_trailing_mass(#[case] data: &[f64], #[case] expected_len: usize) {
    let mut p = pv(data);
    p.trim(TRIM_THRESHOLD);
    assert_eq!(p.len(), expected_len);
  }

  #[rstest]
  fn computes_stats() {
    let (mean, var) = pv(&[0.25, 0.5, 0.25]).stats();
    assert_abs_diff_eq!(mean, 1.0, epsilon = 1e-15);
    assert_abs_diff_eq!(var, 0.5, epsilon = 1e-15);
  }

  #[rstest]
  fn convolves() {
    let p = pv(&[0.5, 0.5]);
    let q = pv(&[0.25, 0.75]);
    pretty_assert_abs_diff_eq!(p.convolve(&q).as_array(), &array![0.125, 0.5, 0.375], epsilon = 1e-15);
  }

  #[rstest]
  fn convolves_n_times_as_binomial() -> Result<(), Report> {
    let coin = pv(&[0.5, 0.5]);
    let p = coin.convolve_n(4)?;
    pretty_assert_abs_diff_eq!(
      p.as_array(),
      &array![1.0, 4.0, 6.0, 4.0, 1.0].mapv(|x| x / 16.0),
      epsilon = 1e-15
    );
    assert_eq!(coin.convolve_n(0)?, ProbVector::point_mass());
    Ok(())
  }

  #[rstest]
  fn convolves_many_with_additive_moments() -> Result<(), Report> {
    let ps = vec![pv(&[0.9, 0.1]), pv(&[0.5, 0.3, 0.2]), pv(&[0.2, 0.2, 0.2, 0.4])];
    let counts = vec![5, 3, 2];
    let total = ProbVector::convolve_many(&ps, &counts)?;

    let (mean, var) = zip(&ps, &counts).fold((0.0, 0.0), |(m, v), (p, &c)| {
      let (p_mean, p_var) = p.stats();
      (m + p_mean * c as f64, v + p_var * c as f64)
    });
    let (total_mean, total_var) = total.stats();
    assert_abs_diff_eq!(total.sum(), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(total_mean, mean, epsilon = 1e-8);
    assert_abs_diff_eq!(total_var, var, epsilon = 1e-8);
    Ok(())
  }

  #[rstest]
  fn rejects_mismatched_counts() {
    assert!(ProbVector::convolve_many(&[pv(&[1.0])], &[1, 2]).is_err());
  }
}
