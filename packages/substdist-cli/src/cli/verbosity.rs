//! Console verbosity flags, in the manner of clap-verbosity-flag
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{ArgAction, Args};
use log::LevelFilter;

const LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Args, Debug, Clone)]
pub struct Verbosity {
  /// Set verbosity level of console output
  #[clap(long, global = true, value_parser = PossibleValuesParser::new(LEVELS).try_map(|s| s.parse::<LevelFilter>()))]
  #[clap(conflicts_with = "quiet", conflicts_with = "verbose", conflicts_with = "silent")]
  #[clap(default_value = "warn")]
  #[clap(display_order = 95)]
  pub verbosity: LevelFilter,

  /// Disable all console output. Same as `--verbosity=off`
  #[clap(long, global = true)]
  #[clap(conflicts_with = "quiet", conflicts_with = "verbose", conflicts_with = "verbosity")]
  #[clap(display_order = 96)]
  pub silent: bool,

  /// Make console output more verbose. Add multiple occurrences to increase verbosity further.
  #[clap(long, short = 'v', action = ArgAction::Count, global = true)]
  #[clap(conflicts_with = "quiet", conflicts_with = "verbosity", conflicts_with = "silent")]
  #[clap(display_order = 97)]
  pub verbose: u8,

  /// Make console output more quiet. Add multiple occurrences to make output even more quiet.
  #[clap(long, short = 'q', action = ArgAction::Count, global = true)]
  #[clap(conflicts_with = "verbose", conflicts_with = "verbosity")]
  #[clap(display_order = 98)]
  pub quiet: u8,
}

impl Verbosity {
  pub const fn get_filter_level(&self) -> LevelFilter {
    if self.silent {
      // --verbosity=<level> and --silent take priority over -v and -q
      LevelFilter::Off
    } else {
      let ilevel = level_to_int(self.verbosity);
      let ilevel = ilevel.saturating_add(self.verbose);
      let ilevel = ilevel.saturating_sub(self.quiet);
      level_from_int(ilevel)
    }
  }
}

const fn level_to_int(level: LevelFilter) -> u8 {
  match level {
    LevelFilter::Off => 0,
    LevelFilter::Error => 1,
    LevelFilter::Warn => 2,
    LevelFilter::Info => 3,
    LevelFilter::Debug => 4,
    LevelFilter::Trace => 5,
  }
}

const fn level_from_int(verbosity: u8) -> LevelFilter {
  match verbosity {
    0 => LevelFilter::Off,
    1 => LevelFilter::Error,
    2 => LevelFilter::Warn,
    3 => LevelFilter::Info,
    4 => LevelFilter::Debug,
    5.. => LevelFilter::Trace,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::Parser;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[derive(Parser, Debug)]
  struct TestArgs {
    #[clap(flatten)]
    verbosity: Verbosity,
  }

  #[rstest]
  #[case(&[], LevelFilter::Warn)]
  #[case(&["-v"], LevelFilter::Info)]
  #[case(&["-vvv"], LevelFilter::Trace)]
  #[case(&["-vvvvvv"], LevelFilter::Trace)]
  #[case(&["-qq"], LevelFilter::Off)]
  #[case(&["--verbosity", "debug"], LevelFilter::Debug)]
  #[case(&["--silent"], LevelFilter::Off)]
  fn computes_filter_level(#[case] flags: &[&str], #[case] expected: LevelFilter) {
    let args = TestArgs::parse_from(std::iter::once("test").chain(flags.iter().copied()));
    assert_eq!(args.verbosity.get_filter_level(), expected);
  }
}
