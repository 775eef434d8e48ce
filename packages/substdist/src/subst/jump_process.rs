#![allow(non_snake_case)]

use crate::constants::MASS_TOLERANCE;
use crate::distribution::poisson::poisson;
use crate::model::subst_model::SubstitutionModel;
use crate::tree::tree::Tree;
use crate::utils::ndarray::{clamp_min, rows_sum_to};
use crate::{make_error, make_internal_error};
use eyre::{Report, WrapErr};
use getset::{CopyGetters, Getters};
use log::{debug, warn};
use ndarray::{Array1, Array2};
use smart_default::SmartDefault;

#[derive(Clone, Debug, SmartDefault)]
pub struct JumpProcessParams {
  /// Number of jump counts (`0..njumps_max`) tabulated by the process. When not set, it is chosen from the longest
  /// branch of the tree, so that every branch of that tree can be queried.
  #[default(None)]
  pub njumps_max: Option<usize>,
}

/// Uniformized ("jump process") representation of a substitution model.
///
/// Substitutions are modeled as a Poisson number of jumps at rate `lambda`, each jump moving the state according to
/// the stochastic matrix `R`. A jump from a state to itself is not a substitution.
///
/// Tables (indexed by `[[n, j]]`, `n` substitutions given `j` jumps, `n <= j`):
///  - `A(b)`: probability of ending in `b` with `n` substitutions, for a start state drawn from `pi`
///  - `B(a, b)`: probability of ending in `b` with `n` substitutions, starting in `a`
#[derive(Clone, Debug, CopyGetters, Getters)]
pub struct JumpProcess {
  /// Uniformization rate, the largest total rate of leaving a state
  #[getset(get_copy = "pub")]
  lambda: f64,

  #[getset(get = "pub")]
  R: Array2<f64>,

  #[getset(get = "pub")]
  pi: Array1<f64>,

  #[getset(get_copy = "pub")]
  njumps_max: usize,

  A: Vec<Array2<f64>>,
  B: Vec<Vec<Array2<f64>>>,
}

impl JumpProcess {
  pub fn new(model: &SubstitutionModel, njumps_max: usize) -> Result<Self, Report> {
    if model.nratecats > 1 {
      return make_error!("Rate variation is not supported, but the model has {} rate categories", model.nratecats);
    }
    if model.order > 0 {
      return make_error!(
        "Only single nucleotide (order-0) models are supported, but the model has order {}",
        model.order
      );
    }
    if njumps_max == 0 {
      return make_error!("Maximum number of jumps must be positive");
    }
    if !model.is_reversible() {
      warn!("Substitution model is not reversible. Results that depend on rerooting the tree may be inaccurate.");
    }

    let lambda = model.Q.diag().iter().fold(0.0_f64, |acc, &q| acc.max(-q));
    if !(lambda > 0.0) {
      return make_error!("Substitution model has no substitutions: all rates are zero");
    }

    let R = {
      let mut R = &model.Q / lambda;
      R.diag_mut().mapv_inplace(|r| 1.0 + r);
      // the fastest state has a zero self-jump probability, up to rounding
      clamp_min(&R, 0.0)
    };
    if !rows_sum_to(&R, 1.0, MASS_TOLERANCE) {
      return make_internal_error!("Uniformized jump matrix is not stochastic:\n{R}");
    }

    let nstates = model.nstates();
    debug!(
      "Building jump process: lambda = {lambda}, states = {nstates}, maximum jumps = {njumps_max}, table size = {nstates}x{nstates}x{njumps_max}x{njumps_max}"
    );

    let A = substs_given_jumps(&R, &model.pi, njumps_max);
    let B = (0..nstates)
      .map(|a| {
        let mut start = Array1::zeros(nstates);
        start[a] = 1.0;
        substs_given_jumps(&R, &start, njumps_max)
      })
      .collect();

    Ok(Self {
      lambda,
      R,
      pi: model.pi.clone(),
      njumps_max,
      A,
      B,
    })
  }

  /// Build a jump process large enough for every branch of the given tree
  pub fn for_tree(model: &SubstitutionModel, tree: &Tree) -> Result<Self, Report> {
    let njumps_max = njumps_max_for_tree(model, tree)?;
    Self::new(model, njumps_max)
  }

  pub fn with_params(model: &SubstitutionModel, tree: &Tree, params: &JumpProcessParams) -> Result<Self, Report> {
    match params.njumps_max {
      Some(njumps_max) => Self::new(model, njumps_max),
      None => Self::for_tree(model, tree),
    }
  }

  #[inline]
  pub fn nstates(&self) -> usize {
    self.pi.len()
  }

  #[inline]
  pub fn A(&self, b: usize) -> &Array2<f64> {
    &self.A[b]
  }

  #[inline]
  pub fn B(&self, a: usize, b: usize) -> &Array2<f64> {
    &self.B[a][b]
  }
}

/// Smallest maximum jump count that covers the Poisson truncation of the longest branch of the tree
pub fn njumps_max_for_tree(model: &SubstitutionModel, tree: &Tree) -> Result<usize, Report> {
  let lambda = model.Q.diag().iter().fold(0.0_f64, |acc, &q| acc.max(-q));
  let t_max = tree.max_branch_length();
  let pois = poisson(lambda * t_max).wrap_err("When choosing maximum number of jumps for the tree")?;
  Ok(pois.len() + 1)
}

/// Tabulate `T[b][[n, j]]`: probability of ending in state `b` after `j` jumps of which `n` changed the state, given
/// start distribution `start`.
fn substs_given_jumps(R: &Array2<f64>, start: &Array1<f64>, njumps_max: usize) -> Vec<Array2<f64>> {
  let nstates = start.len();
  let mut T = vec![Array2::<f64>::zeros((njumps_max, njumps_max)); nstates];
  for (i, Ti) in T.iter_mut().enumerate() {
    Ti[[0, 0]] = start[i];
  }

  for j in 1..njumps_max {
    for n in 0..=j {
      for i in 0..nstates {
        // self-jump keeps the substitution count
        let mut p = T[i][[n, j - 1]] * R[[i, i]];
        // jump from any other state adds one substitution
        if n > 0 {
          p += (0..nstates)
            .filter(|&k| k != i)
            .map(|k| T[k][[n - 1, j - 1]] * R[[k, i]])
            .sum::<f64>();
        }
        T[i][[n, j]] = p;
      }
    }
  }
  T
}
