#![allow(clippy::pub_use)]

use eyre::Report;

pub fn report_to_string(report: &Report) -> String {
  let strings: Vec<String> = report.chain().map(std::string::ToString::to_string).collect();
  strings.join(": ")
}

#[macro_export(local_inner_macros)]
macro_rules! make_error {
  ($($arg:tt)*) => {
    {
      Err(eyre::eyre!(std::format!($($arg)*)))
    }
  };
}

pub use make_error;

#[macro_export(local_inner_macros)]
macro_rules! make_report {
  ($($arg:tt)*) => {
    {
      eyre::eyre!($($arg)*)
    }
  };
}

pub use make_report;

#[macro_export(local_inner_macros)]
macro_rules! make_internal_error {
  ($($arg:tt)*) => {
    {
      let msg_external = std::format!($($arg)*);
      let msg = std::format!("{msg_external}. This is an internal error. Please report it to developers.");
      Err(eyre::eyre!(msg))
    }
  };
}

pub use make_internal_error;

#[macro_export(local_inner_macros)]
macro_rules! make_internal_report {
  ($($arg:tt)*) => {
    {
      let msg_external = std::format!($($arg)*);
      let msg = std::format!("{msg_external}. This is an internal error. Please report it to developers.");
      eyre::eyre!(msg)
    }
  };
}

pub use make_internal_report;

#[cfg(test)]
mod tests {
  use super::*;
  use eyre::WrapErr;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  fn joins_report_chain() {
    let report: Result<(), Report> = make_error!("Jump bound is {}", 3);
    let report = report.wrap_err("When computing branch distribution").unwrap_err();
    assert_eq!(
      report_to_string(&report),
      "When computing branch distribution: Jump bound is 3"
    );
  }

  #[rstest]
  fn internal_error_mentions_developers() {
    let report: Result<(), Report> = make_internal_error!("Table is missing for node {}", 7);
    let msg = report_to_string(&report.unwrap_err());
    assert!(msg.starts_with("Table is missing for node 7."));
    assert!(msg.ends_with("Please report it to developers."));
  }
}
