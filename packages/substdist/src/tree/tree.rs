use crate::make_error;
use eyre::{Report, WrapErr};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Stable identifier of a node in the tree arena. Equals the node's index in `Tree::nodes()`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl Display for NodeId {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "#{}", self.0)
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
  pub id: NodeId,
  pub name: Option<String>,
  pub parent: Option<NodeId>,
  pub children: Vec<NodeId>,

  /// Length of the branch leading to this node from its parent. Zero for the root.
  pub branch_length: f64,
}

impl TreeNode {
  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }

  #[inline]
  pub fn is_root(&self) -> bool {
    self.parent.is_none()
  }

  /// Name for messages: the node name if present, otherwise the node id
  pub fn display_name(&self) -> String {
    self.name.clone().unwrap_or_else(|| self.id.to_string())
  }
}

/// Nested, serializable description of a rooted tree
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeSpec {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,

  #[serde(default)]
  pub branch_length: f64,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub children: Vec<TreeSpec>,
}

impl TreeSpec {
  pub fn leaf(name: impl AsRef<str>, branch_length: f64) -> Self {
    Self {
      name: Some(name.as_ref().to_owned()),
      branch_length,
      children: vec![],
    }
  }

  pub fn internal(name: Option<&str>, branch_length: f64, left: TreeSpec, right: TreeSpec) -> Self {
    Self {
      name: name.map(ToOwned::to_owned),
      branch_length,
      children: vec![left, right],
    }
  }
}

/// Rooted binary tree stored as an arena of nodes addressed by `NodeId`.
///
/// Every internal node has exactly two children, the first being the "left" child.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
  nodes: Vec<TreeNode>,
  root: NodeId,
}

impl Tree {
  /// Build a tree from a node arena, checking that links are consistent and that the tree is binary
  pub fn from_nodes(nodes: Vec<TreeNode>, root: NodeId) -> Result<Self, Report> {
    let tree = Self { nodes, root };
    tree.validate().wrap_err("When validating tree")?;
    Ok(tree)
  }

  /// Build a tree from its nested description. Node ids are assigned in preorder, so the root is `NodeId(0)`.
  /// The branch length given for the root is ignored.
  pub fn from_spec(spec: &TreeSpec) -> Result<Self, Report> {
    let mut nodes: Vec<TreeNode> = vec![];
    let mut stack: Vec<(&TreeSpec, Option<NodeId>)> = vec![(spec, None)];
    while let Some((spec, parent)) = stack.pop() {
      let id = NodeId(nodes.len());
      let branch_length = if parent.is_some() { spec.branch_length } else { 0.0 };
      nodes.push(TreeNode {
        id,
        name: spec.name.clone(),
        parent,
        children: vec![],
        branch_length,
      });
      if let Some(parent) = parent {
        nodes[parent.0].children.push(id);
      }
      // Reversed so that children are popped, and numbered, left to right
      for child in spec.children.iter().rev() {
        stack.push((child, Some(id)));
      }
    }
    Self::from_nodes(nodes, NodeId(0))
  }

  pub fn to_spec(&self) -> TreeSpec {
    let mut specs: Vec<Option<TreeSpec>> = vec![None; self.nodes.len()];
    for id in self.postorder() {
      let node = self.node(id);
      let children = node
        .children
        .iter()
        .filter_map(|child| specs[child.0].take())
        .collect();
      specs[id.0] = Some(TreeSpec {
        name: node.name.clone(),
        branch_length: node.branch_length,
        children,
      });
    }
    specs[self.root.0].take().unwrap_or_default()
  }

  fn validate(&self) -> Result<(), Report> {
    if self.nodes.is_empty() {
      return make_error!("Tree has no nodes");
    }
    if self.root.0 >= self.nodes.len() {
      return make_error!("Root {} is out of range of the node arena of size {}", self.root, self.nodes.len());
    }
    if self.nodes[self.root.0].parent.is_some() {
      return make_error!("Root {} has a parent", self.root);
    }

    for (index, node) in self.nodes.iter().enumerate() {
      if node.id.0 != index {
        return make_error!("Node at position {index} has mismatched id {}", node.id);
      }
      if !node.is_leaf() && node.children.len() != 2 {
        return make_error!(
          "Only binary trees are supported, but node '{}' has {} children",
          node.display_name(),
          node.children.len()
        );
      }
      if !node.branch_length.is_finite() || node.branch_length < 0.0 {
        return make_error!(
          "Branch lengths must be finite and non-negative, but node '{}' has branch length {}",
          node.display_name(),
          node.branch_length
        );
      }
      for child in &node.children {
        match self.nodes.get(child.0) {
          Some(c) if c.parent == Some(node.id) => {}
          _ => {
            return make_error!(
              "Inconsistent parent/child links between node '{}' and child {child}",
              node.display_name()
            )
          }
        }
      }
      if node.id != self.root && node.parent.is_none() {
        return make_error!("Node '{}' is disconnected from the root", node.display_name());
      }
    }

    let n_reachable = self.postorder().len();
    if n_reachable != self.nodes.len() {
      return make_error!(
        "Only {n_reachable} out of {} nodes are reachable from the root",
        self.nodes.len()
      );
    }

    Ok(())
  }

  #[inline]
  pub const fn root(&self) -> NodeId {
    self.root
  }

  #[inline]
  pub fn node(&self, id: NodeId) -> &TreeNode {
    &self.nodes[id.0]
  }

  #[inline]
  pub fn nodes(&self) -> &[TreeNode] {
    &self.nodes
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  #[inline]
  pub fn is_leaf(&self, id: NodeId) -> bool {
    self.node(id).is_leaf()
  }

  #[inline]
  pub fn branch_length(&self, id: NodeId) -> f64 {
    self.node(id).branch_length
  }

  /// Left and right children of an internal node, `None` for a leaf
  pub fn children(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
    match self.node(id).children.as_slice() {
      [left, right] => Some((*left, *right)),
      _ => None,
    }
  }

  pub fn left(&self, id: NodeId) -> Option<NodeId> {
    self.children(id).map(|(left, _)| left)
  }

  pub fn right(&self, id: NodeId) -> Option<NodeId> {
    self.children(id).map(|(_, right)| right)
  }

  /// Node ids in postorder: children before their parent, left subtree before right, root last
  pub fn postorder(&self) -> Vec<NodeId> {
    self.postorder_from(self.root)
  }

  /// Postorder of the subtree rooted at `start`
  pub fn postorder_from(&self, start: NodeId) -> Vec<NodeId> {
    let mut order = Vec::with_capacity(self.nodes.len());
    let mut stack = vec![(start, false)];
    while let Some((id, expanded)) = stack.pop() {
      if expanded || self.nodes[id.0].is_leaf() {
        order.push(id);
      } else {
        stack.push((id, true));
        for child in self.nodes[id.0].children.iter().rev() {
          stack.push((*child, false));
        }
      }
    }
    order
  }

  pub fn leaves(&self) -> Vec<NodeId> {
    self.postorder().into_iter().filter(|id| self.is_leaf(*id)).collect()
  }

  /// Sum of all branch lengths
  pub fn total_length(&self) -> f64 {
    self.nodes.iter().map(|node| node.branch_length).sum()
  }

  pub fn max_branch_length(&self) -> f64 {
    self.nodes.iter().map(|node| node.branch_length).fold(0.0, f64::max)
  }

  pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
    self
      .nodes
      .iter()
      .find(|node| node.name.as_deref() == Some(name))
      .map(|node| node.id)
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use approx::assert_ulps_eq;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  /// ((A:0.1,B:0.2)AB:0.3,C:0.4)root;
  pub fn example_spec() -> TreeSpec {
    TreeSpec::internal(
      Some("root"),
      0.0,
      TreeSpec::internal(Some("AB"), 0.3, TreeSpec::leaf("A", 0.1), TreeSpec::leaf("B", 0.2)),
      TreeSpec::leaf("C", 0.4),
    )
  }

  fn names(tree: &Tree, ids: &[NodeId]) -> Vec<String> {
    ids.iter().map(|id| tree.node(*id).display_name()).collect()
  }

  #[rstest]
  fn builds_tree_from_spec() -> Result<(), Report> {
    let tree = Tree::from_spec(&example_spec())?;
    assert_eq!(tree.len(), 5);
    assert_eq!(tree.root(), NodeId(0));
    assert_eq!(names(&tree, &tree.postorder()), vec!["A", "B", "AB", "C", "root"]);
    assert_eq!(names(&tree, &tree.leaves()), vec!["A", "B", "C"]);
    assert_ulps_eq!(tree.total_length(), 1.0);
    assert_ulps_eq!(tree.max_branch_length(), 0.4);

    let ab = tree.find_by_name("AB").unwrap();
    let (a, b) = tree.children(ab).unwrap();
    assert_eq!(names(&tree, &[a, b]), vec!["A", "B"]);
    assert_eq!(tree.node(a).parent, Some(ab));
    assert_eq!(tree.children(a), None);
    Ok(())
  }

  #[rstest]
  fn ignores_root_branch_length() -> Result<(), Report> {
    let mut spec = example_spec();
    spec.branch_length = 5.0;
    let tree = Tree::from_spec(&spec)?;
    assert_ulps_eq!(tree.branch_length(tree.root()), 0.0);
    Ok(())
  }

  #[rstest]
  fn converts_back_to_spec() -> Result<(), Report> {
    let spec = example_spec();
    let tree = Tree::from_spec(&spec)?;
    assert_eq!(tree.to_spec(), spec);
    Ok(())
  }

  #[rstest]
  fn reads_spec_from_json() -> Result<(), Report> {
    let json = r#"{
      "name": "root",
      "children": [
        { "name": "AB", "branch_length": 0.3, "children": [
          { "name": "A", "branch_length": 0.1 },
          { "name": "B", "branch_length": 0.2 }
        ]},
        { "name": "C", "branch_length": 0.4 }
      ]
    }"#;
    let spec: TreeSpec = crate::io::json::json_read_str(json)?;
    assert_eq!(spec, example_spec());
    Ok(())
  }

  #[rstest]
  fn accepts_single_leaf() -> Result<(), Report> {
    let tree = Tree::from_spec(&TreeSpec::leaf("A", 0.0))?;
    assert_eq!(tree.postorder(), vec![NodeId(0)]);
    assert_eq!(tree.leaves(), vec![NodeId(0)]);
    Ok(())
  }

  #[rstest]
  fn rejects_non_binary_tree() {
    let spec = TreeSpec {
      name: None,
      branch_length: 0.0,
      children: vec![TreeSpec::leaf("A", 0.1), TreeSpec::leaf("B", 0.1), TreeSpec::leaf("C", 0.1)],
    };
    assert!(Tree::from_spec(&spec).is_err());
  }

  #[rstest]
  fn rejects_negative_branch_length() {
    let spec = TreeSpec::internal(None, 0.0, TreeSpec::leaf("A", -0.1), TreeSpec::leaf("B", 0.1));
    assert!(Tree::from_spec(&spec).is_err());
  }
}
