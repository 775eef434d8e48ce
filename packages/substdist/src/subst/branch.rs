#![allow(non_snake_case)]

use crate::distribution::poisson::poisson;
use crate::distribution::prob_vector::ProbVector;
use crate::make_error;
use crate::subst::jump_process::JumpProcess;
use crate::tree::tree::{NodeId, Tree};
use eyre::{Report, WrapErr};
use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

/// Jump-count distribution for a branch of length `t`, checked against the size of the jump tables
fn jump_distrib(jp: &JumpProcess, t: f64) -> Result<ProbVector, Report> {
  let pois = poisson(jp.lambda() * t)?;
  if jp.njumps_max() <= pois.len() {
    return make_error!(
      "Maximum number of jumps ({}) is too small for branch length {t}: it must exceed {}",
      jp.njumps_max(),
      pois.len()
    );
  }
  Ok(pois)
}

/// Distribution of the number of substitutions on a branch of length `t`, with the start state drawn from the
/// background frequencies.
pub fn branch_marginal(jp: &JumpProcess, t: f64) -> Result<ProbVector, Report> {
  let pois = jump_distrib(jp, t).wrap_err("When computing substitution distribution for a branch")?;
  let width = pois.len();

  // M[n][j] = P(n substitutions | j jumps)
  let mut M = Array2::<f64>::zeros((width, width));
  for b in 0..jp.nstates() {
    let A = jp.A(b);
    for j in 0..width {
      for n in 0..=j {
        M[[n, j]] += A[[n, j]];
      }
    }
  }

  let mut distrib = ProbVector::zeros(width);
  let data = distrib.as_array_mut();
  for n in 0..width {
    data[n] = (n..width).map(|j| M[[n, j]] * pois.get(j)).sum();
  }
  distrib.normalize()?;
  Ok(distrib)
}

/// Joint distribution of the end state and the number of substitutions on a branch, for every start state.
///
/// `get(a, b, n)` is the probability of ending in `b` after `n` substitutions, given start state `a`.
#[derive(Clone, Debug)]
pub struct BranchConditional {
  /// `D[a][[b, n]]`
  D: Vec<Array2<f64>>,
  width: usize,
}

impl BranchConditional {
  /// Number of substitution counts with non-zero mass: `0..width()`
  #[inline]
  pub const fn width(&self) -> usize {
    self.width
  }

  #[inline]
  pub fn get(&self, a: usize, b: usize, n: usize) -> f64 {
    self.D[a][[b, n]]
  }

  /// Table indexed by `[[b, n]]` for start state `a`
  #[inline]
  pub fn start(&self, a: usize) -> ArrayView2<f64> {
    self.D[a].view()
  }
}

pub fn branch_conditional(jp: &JumpProcess, t: f64) -> Result<BranchConditional, Report> {
  let pois = jump_distrib(jp, t).wrap_err("When computing conditional substitution distribution for a branch")?;
  let width = pois.len();
  let nstates = jp.nstates();

  let D = (0..nstates)
    .map(|a| {
      let mut Da = Array2::<f64>::zeros((nstates, width));
      for b in 0..nstates {
        let B = jp.B(a, b);
        for n in 0..width {
          Da[[b, n]] = (n..width).map(|j| B[[n, j]] * pois.get(j)).sum();
        }
      }
      let sum = Da.sum();
      if !(sum > 0.0) {
        return make_error!("Conditional branch distribution for start state {a} has zero mass");
      }
      Da /= sum;
      Ok(Da)
    })
    .collect::<Result<Vec<_>, Report>>()?;

  Ok(BranchConditional { D, width })
}

/// Conditional branch distributions for every branch of a tree, computed once and shared by all per-site
/// computations on that tree.
#[derive(Clone, Debug)]
pub struct BranchDistribs {
  branches: Vec<BranchConditional>,
}

impl BranchDistribs {
  pub fn new(jp: &JumpProcess, tree: &Tree) -> Result<Self, Report> {
    let branches = tree
      .nodes()
      .par_iter()
      .map(|node| {
        branch_conditional(jp, node.branch_length)
          .wrap_err_with(|| format!("When processing branch above node '{}'", node.display_name()))
      })
      .collect::<Result<Vec<_>, Report>>()?;
    Ok(Self { branches })
  }

  /// Distribution for the branch leading to `node`
  #[inline]
  pub fn get(&self, node: NodeId) -> &BranchConditional {
    &self.branches[node.0]
  }
}
