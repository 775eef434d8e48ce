pub mod posterior_args;
pub mod run_posterior;
