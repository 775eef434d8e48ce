#![allow(non_snake_case)]

use crate::alignment::seq_index::AlignedTree;
use crate::alphabet::alphabet::Character;
use crate::constants::TRIM_THRESHOLD;
use crate::distribution::prob_matrix::ProbMatrix;
use crate::distribution::prob_vector::ProbVector;
use crate::subst::branch::{BranchConditional, BranchDistribs};
use crate::subst::jump_process::JumpProcess;
use crate::tree::tree::{NodeId, Tree};
use crate::{make_error, make_internal_report};
use eyre::{Report, WrapErr};
use ndarray::{Array1, Array2, Axis};

/// Per-node table of the tree recursion.
///
/// `L[[a, n]]` is the joint probability of `n` substitutions beneath the node and of the data beneath the node,
/// given that the node is in state `a`. Columns run over `n = 0..=maxsubst`.
struct NodeTable {
  L: Array2<f64>,
}

impl NodeTable {
  #[inline]
  fn maxsubst(&self) -> usize {
    self.L.ncols() - 1
  }

  fn leaf(nstates: usize, state: Character) -> Result<Self, Report> {
    let mut L = Array2::zeros((nstates, 1));
    match state {
      Character::Missing => L.fill(1.0),
      Character::Base(b) if b < nstates => L[[b, 0]] = 1.0,
      Character::Base(b) => return make_error!("Observed state index {b} is out of range for {nstates} states"),
    }
    Ok(Self { L })
  }

  /// Propagate the table up through the branch above the node: `T[[a, j]]` is the probability of `j` substitutions
  /// beneath the top of the branch (the branch included) and of the data beneath, given state `a` at the top.
  ///
  /// Only `i <= maxsubst` and `j - i < width` contribute, so the result has `maxsubst + width` columns.
  fn transmit(&self, d: &BranchConditional) -> Array2<f64> {
    let nstates = self.L.nrows();
    let maxsubst = self.maxsubst();
    let width = d.width();
    let len = maxsubst + width;
    let mut T = Array2::<f64>::zeros((nstates, len));
    for a in 0..nstates {
      let Da = d.start(a);
      for j in 0..len {
        let min_i = (j + 1).saturating_sub(width);
        let max_i = j.min(maxsubst);
        let mut p = 0.0;
        for b in 0..nstates {
          for i in min_i..=max_i {
            p += self.L[[b, i]] * Da[[b, j - i]];
          }
        }
        T[[a, j]] = p;
      }
    }
    T
  }

  /// Combine the transmitted tables of the two children.
  ///
  /// The support of the result is bounded by the larger of the two transmitted supports, and mass beyond that bound
  /// is dropped.
  fn internal(Tl: &Array2<f64>, Tr: &Array2<f64>) -> Self {
    let nstates = Tl.nrows();
    let (len_l, len_r) = (Tl.ncols(), Tr.ncols());
    let maxsubst = len_l.max(len_r) - 1;
    let mut L = Array2::<f64>::zeros((nstates, maxsubst + 1));
    for n in 0..=maxsubst {
      // j substitutions on the left, n - j on the right
      let min_j = (n + 1).saturating_sub(len_r);
      let max_j = n.min(len_l - 1);
      for a in 0..nstates {
        L[[a, n]] = (min_j..=max_j).map(|j| Tl[[a, j]] * Tr[[a, n - j]]).sum();
      }
    }
    Self { L }
  }
}

/// Run the recursion over the subtree rooted at `top`, returning the table at `top`.
///
/// Tables of children are dropped as soon as their parent has been computed.
fn subtree_table<F>(
  tree: &Tree,
  branches: &BranchDistribs,
  nstates: usize,
  top: NodeId,
  observe: &F,
) -> Result<NodeTable, Report>
where
  F: Fn(NodeId) -> Character,
{
  let mut tables: Vec<Option<NodeTable>> = (0..tree.len()).map(|_| None).collect();
  for id in tree.postorder_from(top) {
    let table = match tree.children(id) {
      None => NodeTable::leaf(nstates, observe(id))?,
      Some((left, right)) => {
        let Tl = take_table(&mut tables, left)?.transmit(branches.get(left));
        let Tr = take_table(&mut tables, right)?.transmit(branches.get(right));
        NodeTable::internal(&Tl, &Tr)
      }
    };
    tables[id.0] = Some(table);
  }
  take_table(&mut tables, top)
}

fn take_table(tables: &mut [Option<NodeTable>], id: NodeId) -> Result<NodeTable, Report> {
  tables[id.0]
    .take()
    .ok_or_else(|| make_internal_report!("Table of node {id} is not available"))
}

fn check_tree(jp: &JumpProcess, branches: &BranchDistribs, tree: &Tree) -> Result<(), Report> {
  let width = branches.get(tree.root()).start(0).nrows();
  if width != jp.nstates() {
    return make_error!(
      "Branch distributions have {width} states, but the jump process has {}",
      jp.nstates()
    );
  }
  Ok(())
}

/// Marginalize the root table over the root state, then trim and normalize
fn finalize_site(L: &Array2<f64>, pi: &Array1<f64>) -> Result<ProbVector, Report> {
  let mut distrib = ProbVector::zeros(L.ncols());
  distrib.as_array_mut().assign(&pi.dot(L));
  distrib.normalize()?;
  distrib.trim(TRIM_THRESHOLD);
  distrib.normalize()?;
  Ok(distrib)
}

fn distrib_site<F>(jp: &JumpProcess, tree: &Tree, branches: &BranchDistribs, observe: F) -> Result<ProbVector, Report>
where
  F: Fn(NodeId) -> Character,
{
  check_tree(jp, branches, tree)?;
  let root = subtree_table(tree, branches, jp.nstates(), tree.root(), &observe)?;
  finalize_site(&root.L, jp.pi())
}

fn joint_site<F>(jp: &JumpProcess, tree: &Tree, branches: &BranchDistribs, observe: F) -> Result<ProbMatrix, Report>
where
  F: Fn(NodeId) -> Character,
{
  check_tree(jp, branches, tree)?;
  let Some((left, right)) = tree.children(tree.root()) else {
    return make_error!("Joint distribution requires the root to have two children, but the tree is a single leaf");
  };

  let Tl = subtree_table(tree, branches, jp.nstates(), left, &observe)?.transmit(branches.get(left));
  let Tr = subtree_table(tree, branches, jp.nstates(), right, &observe)?.transmit(branches.get(right));

  // J[[n1, n2]] = sum_a pi_a Tl[[a, n1]] Tr[[a, n2]]
  let weighted_left = &Tl * &jp.pi().view().insert_axis(Axis(1));
  let mut joint = ProbMatrix::zeros(Tl.ncols(), Tr.ncols());
  joint.as_array_mut().assign(&weighted_left.t().dot(&Tr));

  joint.normalize()?;
  joint.trim(TRIM_THRESHOLD);
  joint.normalize()?;
  Ok(joint)
}

/// Prior distribution of the number of substitutions at a single site: the tree recursion with every leaf
/// unobserved.
pub fn prior_distrib_site(jp: &JumpProcess, tree: &Tree) -> Result<ProbVector, Report> {
  let branches = BranchDistribs::new(jp, tree)?;
  prior_distrib_site_with(jp, tree, &branches)
}

pub fn prior_distrib_site_with(
  jp: &JumpProcess,
  tree: &Tree,
  branches: &BranchDistribs,
) -> Result<ProbVector, Report> {
  distrib_site(jp, tree, branches, |_| Character::Missing).wrap_err("When computing prior substitution distribution")
}

/// Posterior distribution of the number of substitutions at a single site, given the observed column pattern
/// `tuple` at the leaves.
pub fn posterior_distrib_site(jp: &JumpProcess, aligned: &AlignedTree, tuple: usize) -> Result<ProbVector, Report> {
  let branches = BranchDistribs::new(jp, aligned.tree())?;
  posterior_distrib_site_with(jp, aligned, &branches, tuple)
}

pub fn posterior_distrib_site_with(
  jp: &JumpProcess,
  aligned: &AlignedTree,
  branches: &BranchDistribs,
  tuple: usize,
) -> Result<ProbVector, Report> {
  check_tuple(aligned, tuple)?;
  distrib_site(jp, aligned.tree(), branches, |node| aligned.leaf_state(tuple, node))
    .wrap_err_with(|| format!("When computing posterior substitution distribution for column pattern {tuple}"))
}

/// Joint distribution of the number of substitutions in the left and in the right subtree of the root, each
/// including the branch above it. Element `[[n1, n2]]` is the probability of `n1` substitutions on the left and
/// `n2` on the right.
///
/// Re-root the tree beforehand to obtain the joint for an arbitrary split. When `data` is `None` the prior is
/// computed, otherwise the posterior given the column pattern.
pub fn joint_distrib_site(
  jp: &JumpProcess,
  tree: &Tree,
  data: Option<(&AlignedTree, usize)>,
) -> Result<ProbMatrix, Report> {
  match data {
    None => {
      let branches = BranchDistribs::new(jp, tree)?;
      prior_joint_distrib_site_with(jp, tree, &branches)
    }
    Some((aligned, tuple)) => {
      let branches = BranchDistribs::new(jp, aligned.tree())?;
      posterior_joint_distrib_site_with(jp, aligned, &branches, tuple)
    }
  }
}

pub fn prior_joint_distrib_site_with(
  jp: &JumpProcess,
  tree: &Tree,
  branches: &BranchDistribs,
) -> Result<ProbMatrix, Report> {
  joint_site(jp, tree, branches, |_| Character::Missing)
    .wrap_err("When computing prior joint substitution distribution")
}

pub fn posterior_joint_distrib_site_with(
  jp: &JumpProcess,
  aligned: &AlignedTree,
  branches: &BranchDistribs,
  tuple: usize,
) -> Result<ProbMatrix, Report> {
  check_tuple(aligned, tuple)?;
  joint_site(jp, aligned.tree(), branches, |node| aligned.leaf_state(tuple, node)).wrap_err_with(|| {
    format!("When computing posterior joint substitution distribution for column pattern {tuple}")
  })
}

fn check_tuple(aligned: &AlignedTree, tuple: usize) -> Result<(), Report> {
  if tuple >= aligned.ntuples() {
    return make_error!(
      "Column pattern {tuple} is out of range: the alignment has {} distinct patterns",
      aligned.ntuples()
    );
  }
  Ok(())
}
