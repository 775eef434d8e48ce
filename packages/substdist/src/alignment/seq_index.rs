use crate::alignment::sufficient_stats::SufficientStats;
use crate::alphabet::alphabet::{Alphabet, Character};
use crate::make_error;
use crate::tree::prune::prune;
use crate::tree::tree::{NodeId, Tree};
use eyre::{Report, WrapErr};
use itertools::Itertools;
use log::warn;

/// A tree together with an alignment whose sequences are matched to the tree's leaves by name.
///
/// The leaf to sequence mapping and the classification of every observed character are established once, so that
/// per-tuple queries are plain lookups.
#[derive(Clone, Debug)]
pub struct AlignedTree {
  tree: Tree,
  stats: SufficientStats,
  alphabet: Alphabet,

  /// Sequence index for every node id; `None` for internal nodes
  seq_of_node: Vec<Option<usize>>,

  /// Classified character for every (tuple, sequence)
  states: Vec<Vec<Character>>,
}

impl AlignedTree {
  pub fn new(tree: Tree, stats: SufficientStats, alphabet: Alphabet) -> Result<Self, Report> {
    let mut seq_of_node = vec![None; tree.len()];
    for leaf in tree.leaves() {
      let node = tree.node(leaf);
      let Some(seq) = node.name.as_deref().and_then(|name| stats.seq_index(name)) else {
        return make_error!(
          "When matching tree leaves to the alignment: no sequence found for leaf '{}'",
          node.display_name()
        );
      };
      seq_of_node[leaf.0] = Some(seq);
    }

    let states = (0..stats.ntuples())
      .map(|tuple| {
        (0..stats.nseqs())
          .map(|seq| alphabet.classify(stats.char_at(tuple, seq)))
          .collect::<Result<Vec<Character>, Report>>()
      })
      .collect::<Result<Vec<_>, Report>>()
      .wrap_err("When reading alignment characters")?;

    Ok(Self {
      tree,
      stats,
      alphabet,
      seq_of_node,
      states,
    })
  }

  #[inline]
  pub const fn tree(&self) -> &Tree {
    &self.tree
  }

  #[inline]
  pub const fn stats(&self) -> &SufficientStats {
    &self.stats
  }

  #[inline]
  pub const fn alphabet(&self) -> &Alphabet {
    &self.alphabet
  }

  #[inline]
  pub fn ntuples(&self) -> usize {
    self.stats.ntuples()
  }

  /// Observed state at a leaf in the given column pattern. Internal nodes are unobserved.
  pub fn leaf_state(&self, tuple: usize, node: NodeId) -> Character {
    match self.seq_of_node[node.0] {
      Some(seq) => self.states[tuple][seq],
      None => Character::Missing,
    }
  }
}

/// Remove tree leaves which have no sequence in the alignment, warning about each of them.
/// Fails if no leaf matches.
pub fn prune_to_alignment(tree: &Tree, stats: &SufficientStats) -> Result<Tree, Report> {
  let has_sequence = |name: Option<&str>| name.and_then(|name| stats.seq_index(name)).is_some();
  if !tree.leaves().iter().any(|leaf| has_sequence(tree.node(*leaf).name.as_deref())) {
    return make_error!("No match for leaves of tree in alignment (leaf names must match alignment names)");
  }

  let (pruned, removed) = prune(tree, |node| has_sequence(node.name.as_deref()))?;
  if !removed.is_empty() {
    warn!(
      "Pruned away leaves of tree with no match in alignment ({})",
      removed.iter().join(", ")
    );
  }
  Ok(pruned)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::alphabet::alphabet::AlphabetName;
  use crate::tree::tree::tests::example_spec;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn maps_leaves_to_sequences() -> Result<(), Report> {
    let tree = Tree::from_spec(&example_spec())?;
    let stats = SufficientStats::from_sequences(&["C", "A", "B"], &["AC", "gN", "T-"])?;
    let aligned = AlignedTree::new(tree, stats, Alphabet::new(AlphabetName::Nuc)?)?;
    let tree = aligned.tree();
    let a = tree.find_by_name("A").unwrap();
    let b = tree.find_by_name("B").unwrap();
    let c = tree.find_by_name("C").unwrap();

    assert_eq!(aligned.leaf_state(0, a), Character::Base(2));
    assert_eq!(aligned.leaf_state(0, b), Character::Base(3));
    assert_eq!(aligned.leaf_state(0, c), Character::Base(0));
    assert_eq!(aligned.leaf_state(1, a), Character::Missing);
    assert_eq!(aligned.leaf_state(1, b), Character::Missing);
    assert_eq!(aligned.leaf_state(1, tree.root()), Character::Missing);
    Ok(())
  }

  #[rstest]
  fn fails_on_unmatched_leaf() -> Result<(), Report> {
    let tree = Tree::from_spec(&example_spec())?;
    let stats = SufficientStats::from_sequences(&["A", "B"], &["A", "C"])?;
    assert!(AlignedTree::new(tree, stats, Alphabet::new(AlphabetName::Nuc)?).is_err());
    Ok(())
  }

  #[rstest]
  fn fails_on_invalid_character() -> Result<(), Report> {
    let tree = Tree::from_spec(&example_spec())?;
    let stats = SufficientStats::from_sequences(&["A", "B", "C"], &["A", "C", "Z"])?;
    assert!(AlignedTree::new(tree, stats, Alphabet::new(AlphabetName::Nuc)?).is_err());
    Ok(())
  }

  #[rstest]
  fn prunes_leaves_without_sequences() -> Result<(), Report> {
    let tree = Tree::from_spec(&example_spec())?;
    let stats = SufficientStats::from_sequences(&["A", "C", "X"], &["A", "C", "G"])?;
    let pruned = prune_to_alignment(&tree, &stats)?;
    assert_eq!(pruned.len(), 3);
    assert_eq!(pruned.find_by_name("B"), None);
    Ok(())
  }

  #[rstest]
  fn fails_when_no_leaf_matches() -> Result<(), Report> {
    let tree = Tree::from_spec(&example_spec())?;
    let stats = SufficientStats::from_sequences(&["X"], &["A"])?;
    assert!(prune_to_alignment(&tree, &stats).is_err());
    Ok(())
  }
}
