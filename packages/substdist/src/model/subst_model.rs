#![allow(non_snake_case)]

use crate::alphabet::alphabet::Alphabet;
use crate::make_error;
use eyre::{Report, WrapErr};
use itertools::Itertools;
use ndarray::prelude::*;
use std::fmt::Display;
use std::io::Write;
use std::iter::zip;

/// Tolerance for checking that rows of a rate matrix sum to zero
const ROW_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug)]
pub struct GtrParams {
  pub alphabet: Alphabet,
  pub mu: f64,
  pub W: Array2<f64>,
  pub pi: Array1<f64>,
}

/// Continuous-time Markov model of single-site character substitution.
///
/// `Q[[i, j]]` is the instantaneous rate of change from state `i` to state `j`; rows sum to zero.
/// `pi` are the background (equilibrium) frequencies, which also serve as the root distribution.
#[derive(Clone, Debug)]
pub struct SubstitutionModel {
  pub alphabet: Alphabet,
  pub Q: Array2<f64>,
  pub pi: Array1<f64>,

  /// Context order of the model. Only order-0 (site-independent) models are supported by the jump process.
  pub order: usize,

  /// Number of rate categories. Rate variation across sites is not supported by the jump process.
  pub nratecats: usize,
}

impl SubstitutionModel {
  pub fn new(alphabet: Alphabet, Q: Array2<f64>, pi: Array1<f64>) -> Result<Self, Report> {
    Self::validate(&alphabet, &Q, &pi).wrap_err("When creating substitution model")?;
    let pi = &pi / pi.sum();
    Ok(Self {
      alphabet,
      Q,
      pi,
      order: 0,
      nratecats: 1,
    })
  }

  /// Build a general time-reversible model from symmetric exchangeabilities `W` and equilibrium frequencies `pi`.
  ///
  /// The rate matrix is `Q_ij = W_ij * pi_j`, rescaled so that the expected number of substitutions per unit time
  /// at equilibrium equals `mu`.
  pub fn from_gtr(GtrParams { alphabet, mu, W, pi }: GtrParams) -> Result<Self, Report> {
    let n = alphabet.len();
    if W.dim() != (n, n) {
      return make_error!(
        "When creating GTR model: dimensions of exchangeability matrix (`W`) {:?} don't match the alphabet size {n}",
        W.dim()
      );
    }
    if pi.len() != n {
      return make_error!(
        "When creating GTR model: length of equilibrium frequency vector (`pi`) {} does not match the alphabet size {n}",
        pi.len()
      );
    }
    if !(mu > 0.0) {
      return make_error!("When creating GTR model: substitution rate `mu` must be positive, but found {mu}");
    }

    let W = {
      let mut W = 0.5 * (&W.view() + &W.t());
      W.diag_mut().fill(0.0);
      W
    };

    let pi = {
      let pi_sum = pi.sum();
      pi / pi_sum
    };

    let mut Q = &W * &pi;
    let diag = -Q.sum_axis(Axis(1));
    Q.diag_mut().assign(&diag);

    let rate = expected_rate(&Q, &pi);
    if !(rate > 0.0) {
      return make_error!("When creating GTR model: all substitution rates are zero");
    }
    let Q = Q * (mu / rate);

    Self::new(alphabet, Q, pi)
  }

  fn validate(alphabet: &Alphabet, Q: &Array2<f64>, pi: &Array1<f64>) -> Result<(), Report> {
    let n = alphabet.len();
    if Q.dim() != (n, n) {
      return make_error!(
        "Dimensions of rate matrix (`Q`) {:?} don't match the alphabet size {n}",
        Q.dim()
      );
    }
    if pi.len() != n {
      return make_error!(
        "Length of background frequency vector (`pi`) {} does not match the alphabet size {n}",
        pi.len()
      );
    }
    if Q.iter().any(|q| !q.is_finite()) {
      return make_error!("Rate matrix (`Q`) contains non-finite values");
    }
    for ((i, j), &q) in Q.indexed_iter() {
      if i != j && q < 0.0 {
        return make_error!("Off-diagonal rates must be non-negative, but found Q[{i},{j}] = {q}");
      }
    }
    for (i, row) in Q.rows().into_iter().enumerate() {
      let sum = row.sum();
      if sum.abs() > ROW_SUM_TOLERANCE {
        return make_error!("Rows of the rate matrix must sum to zero, but row {i} sums to {sum}");
      }
    }
    if pi.iter().any(|&p| !p.is_finite() || p < 0.0) {
      return make_error!("Background frequencies must be non-negative, but found: {pi}");
    }
    if !(pi.sum() > 0.0) {
      return make_error!("Background frequencies must not all be zero");
    }
    Ok(())
  }

  #[inline]
  pub const fn alphabet(&self) -> &Alphabet {
    &self.alphabet
  }

  #[inline]
  pub fn nstates(&self) -> usize {
    self.pi.len()
  }

  /// Expected number of substitutions per unit time when the process is at equilibrium
  pub fn expected_rate(&self) -> f64 {
    expected_rate(&self.Q, &self.pi)
  }

  /// Transition probability matrix `P(t) = exp(Qt)`, such that `P[[a, b]]` is the probability of state `b` at
  /// time `t` given state `a` at time 0.
  #[cfg(test)]
  pub fn exp_qt(&self, t: f64) -> Result<Array2<f64>, Report> {
    use crate::utils::ndarray::{clamp_min, expm};
    let Pt = expm(&(&self.Q * t)).wrap_err_with(|| format!("When computing exp(Qt) for t = {t}"))?;
    Ok(clamp_min(&Pt, 0.0))
  }

  /// Whether the model satisfies detailed balance `pi_i Q_ij = pi_j Q_ji`
  pub fn is_reversible(&self) -> bool {
    let flux = &self.Q * &self.pi.view().insert_axis(Axis(1));
    flux
      .indexed_iter()
      .all(|((i, j), &f)| (f - flux[[j, i]]).abs() < 1e-10)
  }

  pub fn print<W: Write>(&self, w: &mut W) -> Result<(), Report> {
    writeln!(w, "Expected substitution rate: {:.6}", self.expected_rate())?;
    writeln!(w, "\nBackground frequencies (pi_i):")?;
    for (a, p) in zip(self.alphabet.canonical(), &self.pi) {
      writeln!(w, "{a}:\t{p:.4}")?;
    }

    writeln!(w, "\nRates from i->j (Q_ij):")?;
    writeln!(w, "\t{}", self.alphabet.canonical().join("\t"))?;
    for (a, Qi) in zip(self.alphabet.canonical(), self.Q.rows()) {
      writeln!(w, "{a}\t{}", Qi.iter().map(|Qij| format!("{Qij:.4}")).join("\t"))?;
    }
    writeln!(w)?;
    Ok(())
  }
}

impl Display for SubstitutionModel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut buf = vec![];
    self.print(&mut buf).map_err(|_| std::fmt::Error)?;
    write!(f, "{}", String::from_utf8_lossy(&buf))
  }
}

fn expected_rate(Q: &Array2<f64>, pi: &Array1<f64>) -> f64 {
  -(pi * &Q.diag()).sum()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::alphabet::alphabet::AlphabetName;
  use crate::pretty_assert_abs_diff_eq;
  use approx::assert_ulps_eq;
  use ndarray::array;
  use rstest::rstest;

  fn binary() -> Alphabet {
    Alphabet::new(AlphabetName::Binary).unwrap()
  }

  #[rstest]
  fn creates_gtr_with_normalized_rate() -> Result<(), Report> {
    let pi = array![0.1, 0.2, 0.3, 0.4];
    let W = array![
      [0.0, 1.0, 2.0, 1.0],
      [1.0, 0.0, 1.0, 2.0],
      [2.0, 1.0, 0.0, 1.0],
      [1.0, 2.0, 1.0, 0.0],
    ];
    let model = SubstitutionModel::from_gtr(GtrParams {
      alphabet: Alphabet::new(AlphabetName::Nuc)?,
      mu: 2.0,
      W,
      pi: pi.clone(),
    })?;

    assert_ulps_eq!(model.expected_rate(), 2.0, epsilon = 1e-12);
    pretty_assert_abs_diff_eq!(model.Q.sum_axis(Axis(1)), Array1::<f64>::zeros(4), epsilon = 1e-12);
    pretty_assert_abs_diff_eq!(model.pi, pi, epsilon = 1e-15);
    assert!(model.is_reversible());
    Ok(())
  }

  #[rstest]
  fn symmetrizes_exchangeabilities() -> Result<(), Report> {
    let W = array![[0.0, 2.0], [0.0, 0.0]];
    let model = SubstitutionModel::from_gtr(GtrParams {
      alphabet: binary(),
      mu: 1.0,
      W,
      pi: array![1.0, 1.0],
    })?;
    pretty_assert_abs_diff_eq!(model.Q, array![[-1.0, 1.0], [1.0, -1.0]], epsilon = 1e-15);
    Ok(())
  }

  #[rstest]
  fn normalizes_background_frequencies() -> Result<(), Report> {
    let model = SubstitutionModel::new(binary(), array![[-1.0, 1.0], [3.0, -3.0]], array![3.0, 1.0])?;
    pretty_assert_abs_diff_eq!(model.pi, array![0.75, 0.25], epsilon = 1e-15);
    assert!(model.is_reversible());
    assert_ulps_eq!(model.expected_rate(), 1.5);
    Ok(())
  }

  #[rstest]
  fn detects_non_reversible_model() -> Result<(), Report> {
    let model = SubstitutionModel::new(
      Alphabet::with_config(&crate::alphabet::alphabet::AlphabetConfig {
        canonical: vec!['A', 'B', 'C'],
        missing: vec![],
        gap: '-',
      })?,
      array![[-1.0, 1.0, 0.0], [0.0, -1.0, 1.0], [1.0, 0.0, -1.0]],
      array![1.0, 1.0, 1.0],
    )?;
    assert!(!model.is_reversible());
    Ok(())
  }

  #[rstest]
  #[case::rows_do_not_sum_to_zero(array![[-1.0, 0.5], [1.0, -1.0]], array![0.5, 0.5])]
  #[case::negative_rate(array![[1.0, -1.0], [1.0, -1.0]], array![0.5, 0.5])]
  #[case::negative_frequency(array![[-1.0, 1.0], [1.0, -1.0]], array![1.5, -0.5])]
  #[case::wrong_shape(array![[-1.0, 1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 0.0, 0.0]], array![0.5, 0.5])]
  fn rejects_invalid_model(#[case] Q: Array2<f64>, #[case] pi: Array1<f64>) {
    assert!(SubstitutionModel::new(binary(), Q, pi).is_err());
  }

  #[rstest]
  fn computes_exp_qt() -> Result<(), Report> {
    let model = SubstitutionModel::new(binary(), array![[-1.0, 1.0], [1.0, -1.0]], array![0.5, 0.5])?;
    let t = 0.1_f64;
    let same = 0.5 * (1.0 + (-2.0 * t).exp());
    let diff = 0.5 * (1.0 - (-2.0 * t).exp());
    pretty_assert_abs_diff_eq!(model.exp_qt(t)?, array![[same, diff], [diff, same]], epsilon = 1e-14);
    pretty_assert_abs_diff_eq!(model.exp_qt(0.0)?, Array2::<f64>::eye(2), epsilon = 1e-15);
    Ok(())
  }

  #[rstest]
  fn prints_model() -> Result<(), Report> {
    let model = SubstitutionModel::new(binary(), array![[-1.0, 1.0], [1.0, -1.0]], array![0.5, 0.5])?;
    let printed = model.to_string();
    assert!(printed.contains("Expected substitution rate: 1.000000"));
    assert!(printed.contains("0\t-1.0000\t1.0000"));
    Ok(())
  }
}
