use crate::make_error;
use crate::tree::reroot::reroot;
use crate::tree::tree::Tree;
use clap::Parser;
use eyre::{Report, WrapErr};
use log::info;

#[derive(Parser, Debug, Clone, Default)]
pub struct SplitArgs {
  /// Name of the node at which to split the tree for joint distributions.
  ///
  /// The tree is rerooted on the branch above this node before the computation. The left part of the
  /// joint distribution then counts substitutions in the subtree of this node, and the right part
  /// counts substitutions in the rest of the tree. If not set, the tree is split at its root. Requires `--joint`.
  #[clap(long, requires = "joint")]
  pub split: Option<String>,

  /// Attribute the branch above the split node to the left part instead of the right part. Requires `--joint`.
  #[clap(long, requires = "joint")]
  pub include_branch: bool,
}

/// Reroot the tree such that the split requested by the arguments becomes the root split
pub fn split_tree(tree: Tree, args: &SplitArgs) -> Result<Tree, Report> {
  let SplitArgs { split, include_branch } = args;
  let Some(name) = split else {
    return Ok(tree);
  };

  let Some(node) = tree.find_by_name(name) else {
    return make_error!("Node '{name}' requested for the split is not found in the tree");
  };

  if tree.node(node).is_root() {
    return make_error!("Node '{name}' is the root of the tree. Choose a non-root node to split the tree at");
  }

  info!("Splitting the tree at node '{name}'");
  reroot(&tree, node, *include_branch).wrap_err_with(|| format!("When splitting the tree at node '{name}'"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tree::tree::tests::example_spec;
  use approx::assert_abs_diff_eq;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn keeps_tree_without_split() -> Result<(), Report> {
    let tree = Tree::from_spec(&example_spec())?;
    let actual = split_tree(tree.clone(), &SplitArgs::default())?;
    assert_eq!(actual, tree);
    Ok(())
  }

  #[rstest]
  fn splits_at_named_node() -> Result<(), Report> {
    let tree = Tree::from_spec(&example_spec())?;
    let total = tree.total_length();
    let args = SplitArgs {
      split: Some("A".to_owned()),
      include_branch: false,
    };
    let actual = split_tree(tree, &args)?;
    let (left, _) = actual.children(actual.root()).ok_or_else(|| eyre::eyre!("root is a leaf"))?;
    assert_eq!(actual.node(left).name.as_deref(), Some("A"));
    assert_abs_diff_eq!(actual.total_length(), total, epsilon = 1e-12);
    Ok(())
  }

  #[rstest]
  fn rejects_unknown_node() -> Result<(), Report> {
    let tree = Tree::from_spec(&example_spec())?;
    let args = SplitArgs {
      split: Some("Z".to_owned()),
      include_branch: false,
    };
    assert!(split_tree(tree, &args).is_err());
    Ok(())
  }
}
