use crate::alignment::seq_index::AlignedTree;
use crate::distribution::prob_matrix::ProbMatrix;
use crate::distribution::prob_vector::ProbVector;
use crate::make_error;
use crate::subst::branch::BranchDistribs;
use crate::subst::jump_process::JumpProcess;
use crate::subst::tree_dp::{
  posterior_distrib_site_with, posterior_joint_distrib_site_with, prior_distrib_site, prior_joint_distrib_site_with,
};
use crate::tree::tree::Tree;
use eyre::{Report, WrapErr};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::iter::zip;
use std::ops::AddAssign;

/// Mean and variance of a number of substitutions
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubstStats {
  pub mean: f64,
  pub variance: f64,
}

impl SubstStats {
  pub fn of(p: &ProbVector) -> Self {
    let (mean, variance) = p.stats();
    Self { mean, variance }
  }

  /// Moments of the sum of `count` independent copies
  pub fn times(self, count: usize) -> Self {
    let count = count as f64;
    Self {
      mean: self.mean * count,
      variance: self.variance * count,
    }
  }
}

impl AddAssign for SubstStats {
  fn add_assign(&mut self, rhs: Self) {
    self.mean += rhs.mean;
    self.variance += rhs.variance;
  }
}

/// Moments of substitution counts in the left subtree, the right subtree and the whole tree
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JointSubstStats {
  pub total: SubstStats,
  pub left: SubstStats,
  pub right: SubstStats,
}

impl JointSubstStats {
  pub fn of(p: &ProbMatrix) -> Self {
    Self {
      total: SubstStats::of(&p.marginal_total()),
      left: SubstStats::of(&p.marginal_x()),
      right: SubstStats::of(&p.marginal_y()),
    }
  }

  pub fn times(self, count: usize) -> Self {
    Self {
      total: self.total.times(count),
      left: self.left.times(count),
      right: self.right.times(count),
    }
  }
}

impl AddAssign for JointSubstStats {
  fn add_assign(&mut self, rhs: Self) {
    self.total += rhs.total;
    self.left += rhs.left;
    self.right += rhs.right;
  }
}

/// Distribution of the total number of substitutions over independent sites, where site distribution `ps[i]`
/// occurs `counts[i]` times
pub fn alignment_distribution(ps: &[ProbVector], counts: &[usize]) -> Result<ProbVector, Report> {
  ProbVector::convolve_many(ps, counts)
}

/// Mean and variance of the total number of substitutions over independent sites, without convolving
pub fn alignment_moments(ps: &[ProbVector], counts: &[usize]) -> Result<SubstStats, Report> {
  if ps.len() != counts.len() {
    return make_error!(
      "When computing alignment moments: got {} distributions but {} counts",
      ps.len(),
      counts.len()
    );
  }
  Ok(zip(ps, counts).fold(SubstStats::default(), |mut acc, (p, &count)| {
    acc += SubstStats::of(p).times(count);
    acc
  }))
}

/// Joint analogue of `alignment_moments`: moments for the left subtree, the right subtree and in total
pub fn joint_alignment_moments(ps: &[ProbMatrix], counts: &[usize]) -> Result<JointSubstStats, Report> {
  if ps.len() != counts.len() {
    return make_error!(
      "When computing joint alignment moments: got {} distributions but {} counts",
      ps.len(),
      counts.len()
    );
  }
  Ok(zip(ps, counts).fold(JointSubstStats::default(), |mut acc, (p, &count)| {
    acc += JointSubstStats::of(p).times(count);
    acc
  }))
}

/// Prior distribution of the number of substitutions over `nsites` sites
pub fn prior_distrib_alignment(jp: &JumpProcess, tree: &Tree, nsites: usize) -> Result<ProbVector, Report> {
  let site = prior_distrib_site(jp, tree)?;
  debug!("Convolving prior site distribution of width {} over {nsites} sites", site.len());
  site
    .convolve_n(nsites)
    .wrap_err_with(|| format!("When computing prior distribution for {nsites} sites"))
}

/// Posterior distributions for every distinct column pattern of the alignment, in pattern order
pub fn posterior_distrib_sites(jp: &JumpProcess, aligned: &AlignedTree) -> Result<Vec<ProbVector>, Report> {
  let branches = BranchDistribs::new(jp, aligned.tree())?;
  info!(
    "Computing posterior distributions for {} distinct column patterns ({} sites)",
    aligned.ntuples(),
    aligned.stats().nsites()
  );
  (0..aligned.ntuples())
    .into_par_iter()
    .map(|tuple| posterior_distrib_site_with(jp, aligned, &branches, tuple))
    .collect()
}

/// Posterior distribution of the number of substitutions over the whole alignment
pub fn posterior_distrib_alignment(jp: &JumpProcess, aligned: &AlignedTree) -> Result<ProbVector, Report> {
  let ps = posterior_distrib_sites(jp, aligned)?;
  alignment_distribution(&ps, aligned.stats().counts()).wrap_err("When computing posterior distribution for alignment")
}

/// Posterior mean and variance of the number of substitutions over the whole alignment
pub fn posterior_stats_alignment(jp: &JumpProcess, aligned: &AlignedTree) -> Result<SubstStats, Report> {
  let ps = posterior_distrib_sites(jp, aligned)?;
  alignment_moments(&ps, aligned.stats().counts())
}

/// Prior joint distribution of substitutions in the left and in the right subtree of the root, over `nsites` sites
pub fn prior_joint_distrib_alignment(jp: &JumpProcess, tree: &Tree, nsites: usize) -> Result<ProbMatrix, Report> {
  let branches = BranchDistribs::new(jp, tree)?;
  let site = prior_joint_distrib_site_with(jp, tree, &branches)?;
  debug!(
    "Convolving prior joint site distribution of size {:?} over {nsites} sites",
    site.dim()
  );
  site
    .convolve_n(nsites)
    .wrap_err_with(|| format!("When computing prior joint distribution for {nsites} sites"))
}

/// Posterior joint distributions for every distinct column pattern of the alignment, in pattern order
pub fn posterior_joint_distrib_sites(jp: &JumpProcess, aligned: &AlignedTree) -> Result<Vec<ProbMatrix>, Report> {
  let branches = BranchDistribs::new(jp, aligned.tree())?;
  info!(
    "Computing posterior joint distributions for {} distinct column patterns ({} sites)",
    aligned.ntuples(),
    aligned.stats().nsites()
  );
  (0..aligned.ntuples())
    .into_par_iter()
    .map(|tuple| posterior_joint_distrib_site_with(jp, aligned, &branches, tuple))
    .collect()
}

/// Posterior joint distribution of substitutions in the left and in the right subtree of the root, over the whole
/// alignment
pub fn posterior_joint_distrib_alignment(jp: &JumpProcess, aligned: &AlignedTree) -> Result<ProbMatrix, Report> {
  let ps = posterior_joint_distrib_sites(jp, aligned)?;
  ProbMatrix::convolve_many(&ps, aligned.stats().counts())
    .wrap_err("When computing posterior joint distribution for alignment")
}

/// Posterior means and variances of substitutions in the left subtree, the right subtree and in total, over the
/// whole alignment
pub fn posterior_joint_stats_alignment(jp: &JumpProcess, aligned: &AlignedTree) -> Result<JointSubstStats, Report> {
  let ps = posterior_joint_distrib_sites(jp, aligned)?;
  joint_alignment_moments(&ps, aligned.stats().counts())
}
