#![allow(clippy::large_enum_variant)]

use crate::cli::jobs::Jobs;
use crate::cli::verbosity::Verbosity;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use eyre::Report;
use std::fmt::Debug;
use std::io;
use substdist::commands::posterior::posterior_args::SubstdistPosteriorArgs;
use substdist::commands::prior::prior_args::SubstdistPriorArgs;
use substdist::utils::global_init::setup_logger;

#[derive(Parser, Debug)]
#[clap(name = "substdist")]
#[clap(author, version)]
#[clap(verbatim_doc_comment)]
/// Prior and posterior distributions of the number of substitutions on a phylogeny
///
/// Substitution counts are computed exactly, by uniformization of the substitution process along
/// every branch and dynamic programming over the tree.
pub struct SubstdistArgs {
  #[clap(subcommand)]
  pub command: SubstdistCommands,

  #[clap(flatten)]
  pub verbosity: Verbosity,

  #[clap(flatten)]
  pub jobs: Jobs,
}

#[derive(Subcommand, Debug)]
#[clap(verbatim_doc_comment)]
pub enum SubstdistCommands {
  /// Generate shell completions.
  ///
  /// This will print the completions file contents to the console. Refer to your shell's documentation on how to install the completions.
  ///
  /// Example for Ubuntu Linux:
  ///
  ///    substdist completions bash > ~/.local/share/bash-completion/substdist
  ///
  Completions {
    /// Name of the shell to generate appropriate completions
    #[clap(value_name = "SHELL", default_value_t = Shell::Bash)]
    shell: Shell,
  },

  /// Computes the prior distribution of the number of substitutions on the tree, before observing any sequence data, for a given number of independent sites.
  Prior(SubstdistPriorArgs),

  /// Computes the posterior distribution of the number of substitutions on the tree, given the aligned sequences at the leaves.
  Posterior(SubstdistPosteriorArgs),
}

pub fn generate_shell_completions(shell: Shell) -> Result<(), Report> {
  let mut command = SubstdistArgs::command();
  let bin_name = command.get_name().to_owned();
  generate(shell, &mut command, bin_name, &mut io::stdout());
  Ok(())
}

pub fn substdist_parse_cli_args() -> Result<SubstdistArgs, Report> {
  let args = SubstdistArgs::parse();
  setup_logger(args.verbosity.get_filter_level());
  Ok(args)
}
