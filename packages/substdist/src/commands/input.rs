use crate::alphabet::alphabet::{Alphabet, AlphabetName};
use crate::io::json::json_read_file;
use crate::model::get_model::{
  binary, f81, hky85, jc69, k80, t92, BinaryParams, F81Params, HKY85Params, JC69Params, K80Params, ModelName,
  T92Params,
};
use crate::model::subst_model::SubstitutionModel;
use crate::tree::tree::TreeSpec;
use crate::make_error;
use eyre::{Report, WrapErr};
use indexmap::IndexMap;
use log::warn;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Input document of the commands
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubstdistInput {
  pub model: ModelConfig,

  pub tree: TreeSpec,

  /// Aligned sequences by name. Required for posterior computations.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub alignment: Option<IndexMap<String, String>>,
}

impl SubstdistInput {
  /// Read the input document from a JSON file, or from standard input if the path is `-`
  pub fn read(filepath: impl AsRef<Path>) -> Result<Self, Report> {
    json_read_file(filepath).wrap_err("When reading input document")
  }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
  #[serde(flatten)]
  pub kind: ModelKind,

  /// Context order of the model. Only 0 is supported.
  #[serde(default)]
  pub order: usize,

  /// Number of rate categories. Only 1 is supported.
  #[serde(default = "default_nratecats")]
  pub nratecats: usize,
}

const fn default_nratecats() -> usize {
  1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ModelKind {
  Preset(PresetModel),
  Custom(CustomModel),
}

/// One of the named models, with optional parameters. Parameters that the model does not have are ignored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PresetModel {
  pub name: ModelName,

  #[serde(default = "default_mu")]
  pub mu: f64,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub kappa: Option<f64>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pi: Option<Vec<f64>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pi_gc: Option<f64>,
}

const fn default_mu() -> f64 {
  1.0
}

/// Explicit rate matrix and background frequencies
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomModel {
  #[serde(default)]
  pub alphabet: AlphabetName,

  pub rate_matrix: Vec<Vec<f64>>,

  pub background_freqs: Vec<f64>,
}

impl ModelConfig {
  pub fn build(&self) -> Result<SubstitutionModel, Report> {
    let mut model = match &self.kind {
      ModelKind::Preset(preset) => preset.build(),
      ModelKind::Custom(custom) => custom.build(),
    }?;
    model.order = self.order;
    model.nratecats = self.nratecats;
    Ok(model)
  }
}

impl PresetModel {
  fn build(&self) -> Result<SubstitutionModel, Report> {
    let Self {
      name,
      mu,
      kappa,
      pi,
      pi_gc,
    } = self;
    let mu = *mu;

    let unused = |param: &str, is_set: bool| {
      if is_set {
        warn!("Parameter '{param}' is not used by model '{name}' and will be ignored");
      }
    };

    match name {
      ModelName::JC69 => {
        unused("kappa", kappa.is_some());
        unused("pi", pi.is_some());
        unused("pi_gc", pi_gc.is_some());
        jc69(JC69Params { mu, ..JC69Params::default() })
      }
      ModelName::K80 => {
        unused("pi", pi.is_some());
        unused("pi_gc", pi_gc.is_some());
        let defaults = K80Params::default();
        k80(K80Params {
          mu,
          kappa: kappa.unwrap_or(defaults.kappa),
        })
      }
      ModelName::F81 => {
        unused("kappa", kappa.is_some());
        unused("pi_gc", pi_gc.is_some());
        let defaults = F81Params::default();
        f81(F81Params {
          mu,
          pi: pi.clone().map_or(defaults.pi, Array1::from_vec),
        })
      }
      ModelName::HKY85 => {
        unused("pi_gc", pi_gc.is_some());
        let defaults = HKY85Params::default();
        hky85(HKY85Params {
          mu,
          kappa: kappa.unwrap_or(defaults.kappa),
          pi: pi.clone().map_or(defaults.pi, Array1::from_vec),
        })
      }
      ModelName::T92 => {
        unused("pi", pi.is_some());
        let defaults = T92Params::default();
        t92(T92Params {
          mu,
          kappa: kappa.unwrap_or(defaults.kappa),
          pi_GC: pi_gc.unwrap_or(defaults.pi_GC),
        })
      }
      ModelName::Binary => {
        unused("kappa", kappa.is_some());
        unused("pi", pi.is_some());
        unused("pi_gc", pi_gc.is_some());
        binary(BinaryParams { mu })
      }
    }
  }
}

impl CustomModel {
  fn build(&self) -> Result<SubstitutionModel, Report> {
    let alphabet = Alphabet::new(self.alphabet)?;
    let n = self.rate_matrix.len();
    if let Some((i, row)) = self.rate_matrix.iter().enumerate().find(|(_, row)| row.len() != n) {
      return make_error!("Rate matrix must be square, but row {i} has {} entries instead of {n}", row.len());
    }
    let Q = Array2::from_shape_fn((n, n), |(i, j)| self.rate_matrix[i][j]);
    let pi = Array1::from_vec(self.background_freqs.clone());
    SubstitutionModel::new(alphabet, Q, pi)
  }
}
