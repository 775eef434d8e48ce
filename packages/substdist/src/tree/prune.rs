use crate::make_error;
use crate::tree::tree::{Tree, TreeNode, TreeSpec};
use eyre::{Report, WrapErr};

/// Remove leaves for which `keep` returns false.
///
/// Internal nodes left with a single child are suppressed and their branch is merged into the child's. Returns the
/// pruned tree together with the display names of the removed leaves.
pub fn prune<F>(tree: &Tree, keep: F) -> Result<(Tree, Vec<String>), Report>
where
  F: Fn(&TreeNode) -> bool,
{
  let mut removed = vec![];
  let mut specs: Vec<Option<TreeSpec>> = vec![None; tree.len()];

  for id in tree.postorder() {
    let node = tree.node(id);
    let spec = if node.is_leaf() {
      if keep(node) {
        Some(TreeSpec {
          name: node.name.clone(),
          branch_length: node.branch_length,
          children: vec![],
        })
      } else {
        removed.push(node.display_name());
        None
      }
    } else {
      let mut children: Vec<TreeSpec> = node.children.iter().filter_map(|child| specs[child.0].take()).collect();
      match children.len() {
        0 => None,
        1 => children.pop().map(|mut child| {
          child.branch_length += node.branch_length;
          child
        }),
        _ => Some(TreeSpec {
          name: node.name.clone(),
          branch_length: node.branch_length,
          children,
        }),
      }
    };
    specs[id.0] = spec;
  }

  let Some(spec) = specs[tree.root().0].take() else {
    return make_error!("When pruning tree: all {} leaves were removed", removed.len());
  };

  let pruned = Tree::from_spec(&spec).wrap_err("When pruning tree")?;
  Ok((pruned, removed))
}
