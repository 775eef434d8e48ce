use crate::commands::split::SplitArgs;
use clap::{Parser, ValueHint};
use std::fmt::Debug;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct SubstdistPriorArgs {
  /// Path to the JSON input document with the substitution model and the tree. Alignment, if present, is ignored.
  ///
  /// Use "-" to read from standard input.
  #[clap(long, short = 'i', default_value = "-")]
  #[clap(value_hint = ValueHint::FilePath)]
  pub input: PathBuf,

  /// Number of independent sites
  #[clap(long, short = 'n', default_value_t = 1)]
  pub nsites: usize,

  /// Compute the joint distribution of substitutions on the two sides of the root split
  #[clap(long)]
  pub joint: bool,

  #[clap(flatten)]
  pub split: SplitArgs,

  /// Maximum number of jumps per branch. Computed from the longest branch if not set.
  #[clap(long)]
  pub njumps_max: Option<usize>,

  /// Path to the output JSON file. Use "-" to write to standard output.
  #[clap(long, short = 'o', default_value = "-")]
  #[clap(value_hint = ValueHint::AnyPath)]
  pub output: PathBuf,
}
