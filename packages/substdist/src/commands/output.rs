use crate::io::json::{json_write_file, JsonPretty};
use crate::subst::alignment_distrib::{JointSubstStats, SubstStats};
use eyre::Report;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Distribution of the total number of substitutions, as written by the commands
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubstDistribOutput {
  pub nsites: usize,

  pub stats: SubstStats,

  /// Probability of `n` substitutions at index `n`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub distribution: Option<Vec<f64>>,
}

/// Joint distribution of the numbers of substitutions on the two sides of a split
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JointSubstDistribOutput {
  pub nsites: usize,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub split: Option<String>,

  pub include_branch: bool,

  pub stats: JointSubstStats,

  /// Probability of `m` substitutions on the left and `n` on the right at index `[m][n]`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub distribution: Option<Vec<Vec<f64>>>,
}

/// Write pretty JSON to a file, or to standard output if the path is `-`
pub fn write_output<T: Serialize>(filepath: impl AsRef<Path>, output: &T) -> Result<(), Report> {
  json_write_file(filepath, output, JsonPretty(true))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::io::json::json_write_str;
  use pretty_assertions::assert_eq;
  use rstest::rstest;
  use serde_json::{json, Value};

  #[rstest]
  fn omits_distribution_when_stats_only() -> Result<(), Report> {
    let output = SubstDistribOutput {
      nsites: 3,
      stats: SubstStats {
        mean: 0.5,
        variance: 0.25,
      },
      distribution: None,
    };
    let actual: Value = serde_json::from_str(&json_write_str(&output, JsonPretty(false))?)?;
    assert_eq!(actual, json!({ "nsites": 3, "stats": { "mean": 0.5, "variance": 0.25 } }));
    Ok(())
  }

  #[rstest]
  fn writes_joint_distribution_rows() -> Result<(), Report> {
    let output = JointSubstDistribOutput {
      nsites: 1,
      split: Some("AB".to_owned()),
      include_branch: true,
      stats: JointSubstStats::default(),
      distribution: Some(vec![vec![0.5, 0.25], vec![0.25, 0.0]]),
    };
    let actual: Value = serde_json::from_str(&json_write_str(&output, JsonPretty(true))?)?;
    assert_eq!(actual["split"], json!("AB"));
    assert_eq!(actual["include_branch"], json!(true));
    assert_eq!(actual["distribution"], json!([[0.5, 0.25], [0.25, 0.0]]));
    assert_eq!(actual["stats"]["left"], json!({ "mean": 0.0, "variance": 0.0 }));
    Ok(())
  }
}
