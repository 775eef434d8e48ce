use crate::make_error;
use crate::tree::tree::{NodeId, Tree, TreeNode};
use eyre::Report;

/// Re-root the tree on the branch above `node`.
///
/// The new root's left child is the subtree at `node` and its right child is the rest of the tree. When
/// `include_branch` is set, the branch above `node` is kept on the left side and the right side gets a zero-length
/// branch. Otherwise the left side gets a zero-length branch and the branch length goes to the right side. If the old
/// root ends up with only two neighbours, it is suppressed and its two branches are merged.
///
/// Node ids of the returned tree are reassigned in preorder; node names are preserved.
pub fn reroot(tree: &Tree, node: NodeId, include_branch: bool) -> Result<Tree, Report> {
  let n = tree.len();
  if node.0 >= n {
    return make_error!("When rerooting: node {node} does not exist in a tree of {n} nodes");
  }
  let Some(parent) = tree.node(node).parent else {
    return make_error!("When rerooting: node '{}' is already the root", tree.node(node).display_name());
  };

  // Undirected representation, with one extra slot for the new root
  let mut adjacency: Vec<Vec<(usize, f64)>> = vec![vec![]; n + 1];
  for child in tree.nodes() {
    if let Some(p) = child.parent {
      adjacency[p.0].push((child.id.0, child.branch_length));
      adjacency[child.id.0].push((p.0, child.branch_length));
    }
  }

  let (v, p) = (node.0, parent.0);
  let bl = tree.branch_length(node);
  let (left_length, right_length) = if include_branch { (bl, 0.0) } else { (0.0, bl) };

  let new_root = n;
  replace_neighbour(&mut adjacency[v], p, new_root, left_length);
  replace_neighbour(&mut adjacency[p], v, new_root, right_length);
  adjacency[new_root] = vec![(v, left_length), (p, right_length)];

  let old_root = tree.root().0;
  if adjacency[old_root].len() == 2 {
    let [(x, lx), (y, ly)] = [adjacency[old_root][0], adjacency[old_root][1]];
    replace_neighbour(&mut adjacency[x], old_root, y, lx + ly);
    replace_neighbour(&mut adjacency[y], old_root, x, lx + ly);
    adjacency[old_root].clear();
  }

  // Orient edges away from the new root
  let mut nodes: Vec<TreeNode> = Vec::with_capacity(n);
  let mut stack: Vec<(usize, Option<(NodeId, usize)>, f64)> = vec![(new_root, None, 0.0)];
  while let Some((old_id, parent, branch_length)) = stack.pop() {
    let id = NodeId(nodes.len());
    let name = if old_id == new_root {
      None
    } else {
      tree.node(NodeId(old_id)).name.clone()
    };
    nodes.push(TreeNode {
      id,
      name,
      parent: parent.map(|(new_parent, _)| new_parent),
      children: vec![],
      branch_length,
    });
    if let Some((new_parent, _)) = parent {
      nodes[new_parent.0].children.push(id);
    }
    let old_parent = parent.map(|(_, old_parent)| old_parent);
    for &(neighbour, length) in adjacency[old_id].iter().rev() {
      if Some(neighbour) != old_parent {
        stack.push((neighbour, Some((id, old_id)), length));
      }
    }
  }

  Tree::from_nodes(nodes, NodeId(0))
}

fn replace_neighbour(neighbours: &mut [(usize, f64)], from: usize, to: usize, length: f64) {
  if let Some(entry) = neighbours.iter_mut().find(|(neighbour, _)| *neighbour == from) {
    *entry = (to, length);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tree::tree::tests::example_spec;
  use crate::tree::tree::TreeSpec;
  use approx::assert_ulps_eq;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  fn name_of(tree: &Tree, id: NodeId) -> String {
    tree.node(id).display_name()
  }

  #[rstest]
  fn reroots_above_leaf() -> Result<(), Report> {
    let tree = Tree::from_spec(&example_spec())?;
    let a = tree.find_by_name("A").unwrap();

    let rerooted = reroot(&tree, a, true)?;
    let (left, right) = rerooted.children(rerooted.root()).unwrap();
    assert_eq!(name_of(&rerooted, left), "A");
    assert_ulps_eq!(rerooted.branch_length(left), 0.1);
    assert_eq!(name_of(&rerooted, right), "AB");
    assert_ulps_eq!(rerooted.branch_length(right), 0.0);

    // Old root is suppressed, so AB now has B and C as children, with merged branch to C
    let b = rerooted.find_by_name("B").unwrap();
    let c = rerooted.find_by_name("C").unwrap();
    assert_eq!(rerooted.node(b).parent, Some(right));
    assert_eq!(rerooted.node(c).parent, Some(right));
    assert_ulps_eq!(rerooted.branch_length(c), 0.7);

    assert_eq!(rerooted.len(), tree.len());
    assert_ulps_eq!(rerooted.total_length(), tree.total_length());
    Ok(())
  }

  #[rstest]
  fn moves_branch_to_right_side() -> Result<(), Report> {
    let tree = Tree::from_spec(&example_spec())?;
    let a = tree.find_by_name("A").unwrap();
    let rerooted = reroot(&tree, a, false)?;
    let (left, right) = rerooted.children(rerooted.root()).unwrap();
    assert_ulps_eq!(rerooted.branch_length(left), 0.0);
    assert_ulps_eq!(rerooted.branch_length(right), 0.1);
    Ok(())
  }

  #[rstest]
  fn reroots_on_child_of_root() -> Result<(), Report> {
    let tree = Tree::from_spec(&example_spec())?;
    let ab = tree.find_by_name("AB").unwrap();
    let rerooted = reroot(&tree, ab, true)?;
    let (left, right) = rerooted.children(rerooted.root()).unwrap();
    assert_eq!(name_of(&rerooted, left), "AB");
    assert_ulps_eq!(rerooted.branch_length(left), 0.3);
    assert_eq!(name_of(&rerooted, right), "C");
    assert_ulps_eq!(rerooted.branch_length(right), 0.4);
    assert_eq!(rerooted.len(), tree.len());
    Ok(())
  }

  #[rstest]
  fn rejects_rerooting_on_root() -> Result<(), Report> {
    let tree = Tree::from_spec(&example_spec())?;
    assert!(reroot(&tree, tree.root(), true).is_err());
    Ok(())
  }

  #[rstest]
  fn keeps_all_leaves_in_deeper_tree() -> Result<(), Report> {
    let spec = TreeSpec::internal(
      None,
      0.0,
      TreeSpec::internal(None, 0.1, TreeSpec::leaf("A", 0.1), TreeSpec::leaf("B", 0.2)),
      TreeSpec::internal(None, 0.2, TreeSpec::leaf("C", 0.3), TreeSpec::leaf("D", 0.4)),
    );
    let tree = Tree::from_spec(&spec)?;
    let c = tree.find_by_name("C").unwrap();
    let rerooted = reroot(&tree, c, true)?;

    let mut leaves: Vec<String> = rerooted.leaves().into_iter().map(|id| name_of(&rerooted, id)).collect();
    leaves.sort();
    assert_eq!(leaves, vec!["A", "B", "C", "D"]);
    assert_ulps_eq!(rerooted.total_length(), tree.total_length());
    Ok(())
  }
}
