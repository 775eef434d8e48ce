use crate::make_error;
use eyre::Report;
use indexmap::{IndexMap, IndexSet};

/// Alignment reduced to its distinct column patterns ("tuples") with their multiplicities.
///
/// Tuples are kept in order of first occurrence. Characters are stored as they appear in the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SufficientStats {
  names: IndexSet<String>,
  tuples: Vec<Vec<char>>,
  counts: Vec<usize>,
}

impl SufficientStats {
  pub fn from_sequences<N, S>(names: &[N], sequences: &[S]) -> Result<Self, Report>
  where
    N: AsRef<str>,
    S: AsRef<str>,
  {
    if names.len() != sequences.len() {
      return make_error!(
        "When collecting alignment statistics: got {} names but {} sequences",
        names.len(),
        sequences.len()
      );
    }
    if names.is_empty() {
      return make_error!("When collecting alignment statistics: alignment contains no sequences");
    }

    let mut unique_names = IndexSet::with_capacity(names.len());
    for name in names {
      let name = name.as_ref();
      if !unique_names.insert(name.to_owned()) {
        return make_error!("When collecting alignment statistics: duplicate sequence name '{name}'");
      }
    }

    let rows: Vec<Vec<char>> = sequences.iter().map(|seq| seq.as_ref().chars().collect()).collect();
    let nsites = rows[0].len();
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != nsites) {
      return make_error!(
        "When collecting alignment statistics: sequences must have equal lengths, but sequence '{}' has length {} while '{}' has length {nsites}",
        names[i].as_ref(),
        row.len(),
        names[0].as_ref()
      );
    }

    let mut patterns: IndexMap<Vec<char>, usize> = IndexMap::new();
    for site in 0..nsites {
      let column: Vec<char> = rows.iter().map(|row| row[site]).collect();
      *patterns.entry(column).or_insert(0) += 1;
    }
    let (tuples, counts) = patterns.into_iter().unzip();

    Ok(Self {
      names: unique_names,
      tuples,
      counts,
    })
  }

  pub fn from_map(sequences: &IndexMap<String, String>) -> Result<Self, Report> {
    let names: Vec<&String> = sequences.keys().collect();
    let seqs: Vec<&String> = sequences.values().collect();
    Self::from_sequences(&names, &seqs)
  }

  #[inline]
  pub fn ntuples(&self) -> usize {
    self.tuples.len()
  }

  #[inline]
  pub fn nseqs(&self) -> usize {
    self.names.len()
  }

  /// Number of alignment columns
  pub fn nsites(&self) -> usize {
    self.counts.iter().sum()
  }

  #[inline]
  pub fn count(&self, tuple: usize) -> usize {
    self.counts[tuple]
  }

  #[inline]
  pub fn counts(&self) -> &[usize] {
    &self.counts
  }

  /// Character of sequence `seq` in the column pattern `tuple`
  #[inline]
  pub fn char_at(&self, tuple: usize, seq: usize) -> char {
    self.tuples[tuple][seq]
  }

  pub fn seq_index(&self, name: &str) -> Option<usize> {
    self.names.get_index_of(name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
    self.names.iter().map(String::as_str)
  }
}
