pub mod jobs;
pub mod substdist_cli;
pub mod verbosity;
