use crate::alignment::seq_index::{prune_to_alignment, AlignedTree};
use crate::alignment::sufficient_stats::SufficientStats;
use crate::commands::input::SubstdistInput;
use crate::commands::output::{write_output, JointSubstDistribOutput, SubstDistribOutput};
use crate::commands::posterior::posterior_args::SubstdistPosteriorArgs;
use crate::commands::split::split_tree;
use crate::distribution::prob_matrix::ProbMatrix;
use crate::subst::alignment_distrib::{
  alignment_distribution, alignment_moments, joint_alignment_moments, posterior_distrib_sites,
  posterior_joint_distrib_sites,
};
use crate::subst::jump_process::{JumpProcess, JumpProcessParams};
use crate::tree::tree::Tree;
use crate::make_error;
use eyre::Report;
use log::{debug, info};

pub fn run_posterior(posterior_args: &SubstdistPosteriorArgs) -> Result<(), Report> {
  let SubstdistPosteriorArgs {
    input,
    joint,
    split,
    stats_only,
    njumps_max,
    output,
  } = posterior_args;

  let SubstdistInput { model, tree, alignment } = SubstdistInput::read(input)?;
  let Some(alignment) = alignment else {
    return make_error!("Posterior distribution requires an alignment, but the input document has none");
  };

  let model = model.build()?;
  debug!("Substitution model:\n{model}");

  let stats = SufficientStats::from_map(&alignment)?;
  info!(
    "Alignment has {} sequences, {} sites and {} distinct column patterns",
    stats.nseqs(),
    stats.nsites(),
    stats.ntuples()
  );
  let nsites = stats.nsites();

  let tree = Tree::from_spec(&tree)?;
  let tree = prune_to_alignment(&tree, &stats)?;
  let tree = if *joint { split_tree(tree, split)? } else { tree };

  let params = JumpProcessParams {
    njumps_max: *njumps_max,
  };
  let jp = JumpProcess::with_params(&model, &tree, &params)?;
  let aligned = AlignedTree::new(tree, stats, model.alphabet().clone())?;
  let counts = aligned.stats().counts();

  if *joint {
    let sites = posterior_joint_distrib_sites(&jp, &aligned)?;
    let stats = joint_alignment_moments(&sites, counts)?;
    let distribution = if *stats_only {
      None
    } else {
      Some(ProbMatrix::convolve_many(&sites, counts)?.to_rows())
    };
    write_output(
      output,
      &JointSubstDistribOutput {
        nsites,
        split: split.split.clone(),
        include_branch: split.include_branch,
        stats,
        distribution,
      },
    )
  } else {
    let sites = posterior_distrib_sites(&jp, &aligned)?;
    let stats = alignment_moments(&sites, counts)?;
    let distribution = if *stats_only {
      None
    } else {
      Some(alignment_distribution(&sites, counts)?.to_vec())
    };
    write_output(
      output,
      &SubstDistribOutput {
        nsites,
        stats,
        distribution,
      },
    )
  }
}
