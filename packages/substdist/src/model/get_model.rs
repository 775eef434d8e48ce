#![allow(non_snake_case)]

use crate::alphabet::alphabet::{Alphabet, AlphabetName};
use crate::model::subst_model::{GtrParams, SubstitutionModel};
use crate::{make_error, make_report};
use clap::ValueEnum;
use eyre::{Report, WrapErr};
use ndarray::{array, Array1, Array2};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use strum_macros::Display;

#[derive(
  Copy, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, SmartDefault, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ModelName {
  #[default]
  JC69,
  K80,
  F81,
  HKY85,
  T92,
  Binary,
}

/// Create one of the preset models with default parameters, except for the overall substitution rate `mu`
pub fn get_model(name: ModelName, mu: f64) -> Result<SubstitutionModel, Report> {
  match name {
    ModelName::JC69 => jc69(JC69Params { mu, ..JC69Params::default() }),
    ModelName::K80 => k80(K80Params { mu, ..K80Params::default() }),
    ModelName::F81 => f81(F81Params { mu, ..F81Params::default() }),
    ModelName::HKY85 => hky85(HKY85Params { mu, ..HKY85Params::default() }),
    ModelName::T92 => t92(T92Params { mu, ..T92Params::default() }),
    ModelName::Binary => binary(BinaryParams { mu }),
  }
  .wrap_err_with(|| make_report!("When creating model '{name}'"))
}

#[derive(Copy, Clone, Debug, SmartDefault)]
pub struct JC69Params {
  /// Substitution rate
  #[default = 1.0]
  pub mu: f64,

  #[default(AlphabetName::Nuc)]
  pub alphabet: AlphabetName,
}

/// Jukes-Cantor 1969 model.
///
/// Equal equilibrium frequencies and equal rates between all pairs of states.
///
/// See: Jukes and Cantor (1969). Evolution of Protein Molecules. New York: Academic Press. pp. 21–132
pub fn jc69(JC69Params { mu, alphabet }: JC69Params) -> Result<SubstitutionModel, Report> {
  let alphabet = Alphabet::new(alphabet)?;
  let n = alphabet.len();
  let W = Array2::<f64>::ones((n, n));
  let pi = Array1::<f64>::ones(n);
  SubstitutionModel::from_gtr(GtrParams { alphabet, mu, W, pi })
}

#[derive(Copy, Clone, Debug, SmartDefault)]
pub struct K80Params {
  /// Substitution rate
  #[default = 1.0]
  pub mu: f64,

  /// Ratio of transition/transversion rates
  #[default = 2.0]
  pub kappa: f64,
}

/// Kimura 1980 model.
///
/// Equal equilibrium frequencies, with transitions (A<->G, C<->T) happening `kappa` times as often as transversions.
///
/// See: Kimura (1980),  J. Mol. Evol. 16 (2): 111–120. doi:10.1007/BF01731581.
pub fn k80(K80Params { mu, kappa }: K80Params) -> Result<SubstitutionModel, Report> {
  let alphabet = Alphabet::new(AlphabetName::Nuc)?;
  let W = create_transition_transversion_W(kappa)?;
  let pi = Array1::<f64>::ones(alphabet.len());
  SubstitutionModel::from_gtr(GtrParams { alphabet, mu, W, pi })
}

#[derive(Clone, Debug, SmartDefault)]
pub struct F81Params {
  /// Substitution rate
  #[default = 1.0]
  pub mu: f64,

  /// Equilibrium frequencies of A, C, G, T
  #[default(array![0.25, 0.25, 0.25, 0.25])]
  pub pi: Array1<f64>,
}

/// Felsenstein 1981 model.
///
/// Arbitrary equilibrium frequencies, equal exchangeabilities between all states.
///
/// See: Felsenstein (1981), J. Mol. Evol. 17  (6): 368–376. doi:10.1007/BF01734359
pub fn f81(F81Params { mu, pi }: F81Params) -> Result<SubstitutionModel, Report> {
  let alphabet = Alphabet::new(AlphabetName::Nuc)?;
  let n = alphabet.len();
  let W = Array2::<f64>::ones((n, n));
  SubstitutionModel::from_gtr(GtrParams { alphabet, mu, W, pi })
}

#[derive(Clone, Debug, SmartDefault)]
pub struct HKY85Params {
  /// Substitution rate
  #[default = 1.0]
  pub mu: f64,

  /// Ratio of transition/transversion rates
  #[default = 2.0]
  pub kappa: f64,

  /// Equilibrium frequencies of A, C, G, T
  #[default(array![0.25, 0.25, 0.25, 0.25])]
  pub pi: Array1<f64>,
}

/// Hasegawa, Kishino and Yano 1985 model.
///
/// Arbitrary equilibrium frequencies (as in F81) and distinct transition/transversion rates (as in K80).
///
/// See: Hasegawa, Kishino, Yano (1985), J. Mol. Evol. 22 (2): 160–174. doi:10.1007/BF02101694
pub fn hky85(HKY85Params { mu, kappa, pi }: HKY85Params) -> Result<SubstitutionModel, Report> {
  let alphabet = Alphabet::new(AlphabetName::Nuc)?;
  let W = create_transition_transversion_W(kappa)?;
  SubstitutionModel::from_gtr(GtrParams { alphabet, mu, W, pi })
}

#[derive(Copy, Clone, Debug, SmartDefault)]
pub struct T92Params {
  /// Substitution rate
  #[default = 1.0]
  pub mu: f64,

  /// Ratio of transition/transversion rates
  #[default = 2.0]
  pub kappa: f64,

  /// Relative GC content
  #[default = 0.5]
  pub pi_GC: f64,
}

/// Tamura 1992 model.
///
/// Extends Kimura (1980) to the case where a G+C content bias exists.
///
/// See: Tamura K (1992),  Mol.  Biol. Evol. 9 (4): 678–687.  DOI: 10.1093/oxfordjournals.molbev.a040752
pub fn t92(T92Params { mu, kappa, pi_GC }: T92Params) -> Result<SubstitutionModel, Report> {
  if !(0.0..=1.0).contains(&pi_GC) {
    return make_error!("The relative GC should be between 0 and 1, but found pi_GC={pi_GC}");
  }
  let alphabet = Alphabet::new(AlphabetName::Nuc)?;
  let W = create_transition_transversion_W(kappa)?;
  let pi = array![(1.0 - pi_GC) * 0.5, pi_GC * 0.5, pi_GC * 0.5, (1.0 - pi_GC) * 0.5];
  SubstitutionModel::from_gtr(GtrParams { alphabet, mu, W, pi })
}

#[derive(Copy, Clone, Debug, SmartDefault)]
pub struct BinaryParams {
  /// Substitution rate
  #[default = 1.0]
  pub mu: f64,
}

/// Symmetric two-state model. With `mu = 1` both off-diagonal rates are 1.
pub fn binary(BinaryParams { mu }: BinaryParams) -> Result<SubstitutionModel, Report> {
  let alphabet = Alphabet::new(AlphabetName::Binary)?;
  let W = Array2::<f64>::ones((2, 2));
  let pi = Array1::<f64>::ones(2);
  SubstitutionModel::from_gtr(GtrParams { alphabet, mu, W, pi })
}

/// Exchangeabilities for nucleotides in order A, C, G, T, with transitions A<->G and C<->T weighted by `kappa`
fn create_transition_transversion_W(kappa: f64) -> Result<Array2<f64>, Report> {
  if !(kappa > 0.0) {
    return make_error!("Transition/transversion ratio must be positive, but found kappa={kappa}");
  }
  let mut W = Array2::<f64>::ones((4, 4));
  W[[0, 2]] = kappa;
  W[[1, 3]] = kappa;
  W[[2, 0]] = kappa;
  W[[3, 1]] = kappa;
  Ok(W)
}
