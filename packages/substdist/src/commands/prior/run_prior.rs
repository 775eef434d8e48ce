use crate::commands::input::SubstdistInput;
use crate::commands::output::{write_output, JointSubstDistribOutput, SubstDistribOutput};
use crate::commands::prior::prior_args::SubstdistPriorArgs;
use crate::commands::split::split_tree;
use crate::subst::alignment_distrib::{
  prior_distrib_alignment, prior_joint_distrib_alignment, JointSubstStats, SubstStats,
};
use crate::subst::jump_process::{JumpProcess, JumpProcessParams};
use crate::tree::tree::Tree;
use crate::make_error;
use eyre::Report;
use log::{debug, info};

pub fn run_prior(prior_args: &SubstdistPriorArgs) -> Result<(), Report> {
  let SubstdistPriorArgs {
    input,
    nsites,
    joint,
    split,
    njumps_max,
    output,
  } = prior_args;

  if *nsites == 0 {
    return make_error!("Number of sites must be positive");
  }

  let SubstdistInput { model, tree, .. } = SubstdistInput::read(input)?;
  let model = model.build()?;
  debug!("Substitution model:\n{model}");

  let tree = Tree::from_spec(&tree)?;
  let tree = if *joint { split_tree(tree, split)? } else { tree };
  info!("Tree has {} nodes and total branch length {}", tree.len(), tree.total_length());

  let params = JumpProcessParams {
    njumps_max: *njumps_max,
  };
  let jp = JumpProcess::with_params(&model, &tree, &params)?;

  if *joint {
    let distribution = prior_joint_distrib_alignment(&jp, &tree, *nsites)?;
    let stats = JointSubstStats::of(&distribution);
    write_output(
      output,
      &JointSubstDistribOutput {
        nsites: *nsites,
        split: split.split.clone(),
        include_branch: split.include_branch,
        stats,
        distribution: Some(distribution.to_rows()),
      },
    )
  } else {
    let distribution = prior_distrib_alignment(&jp, &tree, *nsites)?;
    let stats = SubstStats::of(&distribution);
    write_output(
      output,
      &SubstDistribOutput {
        nsites: *nsites,
        stats,
        distribution: Some(distribution.to_vec()),
      },
    )
  }
}
