use crate::make_error;
use clap::ValueEnum;
use eyre::Report;
use indexmap::IndexSet;
use itertools::{chain, Itertools};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use strum_macros::Display;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, SmartDefault, Display)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlphabetName {
  #[default]
  Nuc,
  Binary,
}

/// Observed character at a leaf, resolved against an alphabet
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Character {
  /// Canonical state with its index in the alphabet
  Base(usize),
  /// Gap, unknown or ambiguous character. Carries no information about the state.
  Missing,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlphabetConfig {
  pub canonical: Vec<char>,
  pub missing: Vec<char>,
  pub gap: char,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alphabet {
  canonical: IndexSet<char>,
  missing: IndexSet<char>,
  gap: char,
}

impl Default for Alphabet {
  fn default() -> Self {
    Self::new(AlphabetName::Nuc).expect("Failed to create default alphabet")
  }
}

impl Alphabet {
  /// Create one of the pre-defined alphabets
  pub fn new(name: AlphabetName) -> Result<Self, Report> {
    match name {
      AlphabetName::Nuc => Self::with_config(&AlphabetConfig {
        canonical: vec!['A', 'C', 'G', 'T'],
        // unknown and IUPAC ambiguity codes are not resolved: they carry no information for order-0 models
        missing: vec![
          'N', '?', '*', '.', 'R', 'Y', 'S', 'W', 'K', 'M', 'D', 'H', 'B', 'V',
        ],
        gap: '-',
      }),
      AlphabetName::Binary => Self::with_config(&AlphabetConfig {
        canonical: vec!['0', '1'],
        missing: vec!['N', '?', '*', '.'],
        gap: '-',
      }),
    }
  }

  /// Create custom alphabet from a given config
  pub fn with_config(cfg: &AlphabetConfig) -> Result<Self, Report> {
    let AlphabetConfig { canonical, missing, gap } = cfg;

    let canonical: IndexSet<char> = canonical.iter().map(char::to_ascii_uppercase).collect();
    if canonical.is_empty() {
      return make_error!("When creating alphabet: canonical set of characters is empty. This is not allowed.");
    }
    if canonical.len() != cfg.canonical.len() {
      return make_error!(
        "When creating alphabet: canonical characters must be unique (case-insensitive), but found: {}",
        cfg.canonical.iter().join(", ")
      );
    }

    let missing: IndexSet<char> = missing.iter().map(char::to_ascii_uppercase).collect();
    let gap = gap.to_ascii_uppercase();

    if let Some(c) = chain!(missing.iter(), [&gap]).find(|c| canonical.contains(*c)) {
      return make_error!("When creating alphabet: character '{c}' is declared both canonical and missing");
    }

    Ok(Self { canonical, missing, gap })
  }

  /// Number of canonical states
  #[inline]
  pub fn len(&self) -> usize {
    self.canonical.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.canonical.is_empty()
  }

  pub fn canonical(&self) -> impl Iterator<Item = char> + '_ {
    self.canonical.iter().copied()
  }

  #[inline]
  pub const fn gap(&self) -> char {
    self.gap
  }

  /// Index of a canonical character, if it is one
  pub fn index(&self, c: char) -> Option<usize> {
    self.canonical.get_index_of(&c.to_ascii_uppercase())
  }

  /// Canonical character at a given index
  pub fn char(&self, index: usize) -> Option<char> {
    self.canonical.get_index(index).copied()
  }

  pub fn is_gap(&self, c: char) -> bool {
    c.to_ascii_uppercase() == self.gap
  }

  pub fn is_missing(&self, c: char) -> bool {
    self.missing.contains(&c.to_ascii_uppercase())
  }

  /// Resolve an observed character into a state index or missing data
  pub fn classify(&self, c: char) -> Result<Character, Report> {
    if self.is_gap(c) || self.is_missing(c) {
      Ok(Character::Missing)
    } else if let Some(index) = self.index(c) {
      Ok(Character::Base(index))
    } else {
      make_error!(
        "Unknown character: '{c}'. Known characters: {}",
        chain!(self.canonical.iter(), self.missing.iter(), [&self.gap]).join(", ")
      )
    }
  }
}
