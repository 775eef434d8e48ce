pub mod prior_args;
pub mod run_prior;
