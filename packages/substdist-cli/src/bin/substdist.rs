use ctor::ctor;
use eyre::Report;
use log::info;
use substdist::commands::posterior::run_posterior::run_posterior;
use substdist::commands::prior::run_prior::run_prior;
use substdist::utils::global_init::global_init;
use substdist_cli::cli::substdist_cli::{generate_shell_completions, substdist_parse_cli_args, SubstdistCommands};

#[ctor]
fn init() {
  global_init();
}

fn main() -> Result<(), Report> {
  let args = substdist_parse_cli_args()?;

  info!("{:#?}", &args);

  args.jobs.init_thread_pool()?;

  match args.command {
    SubstdistCommands::Prior(prior_args) => {
      run_prior(&prior_args)?;
    }
    SubstdistCommands::Posterior(posterior_args) => {
      run_posterior(&posterior_args)?;
    }
    SubstdistCommands::Completions { shell } => {
      generate_shell_completions(shell)?;
    }
  }

  Ok(())
}
