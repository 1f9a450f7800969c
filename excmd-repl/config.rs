use std::{
  fs,
  path::Path,
};

use excmd::history::DEFAULT_HISTORY_LIMIT;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// Printed before each input line.
  pub prompt:        String,
  /// How many command lines the history keeps.
  pub history_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigRaw {
  prompt:        Option<String>,
  history_limit: Option<usize>,
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
  #[error("failed to read config: {0}")]
  Io(#[from] std::io::Error),
  #[error("failed to parse config: {0}")]
  BadConfig(#[from] toml::de::Error),
}

impl Config {
  pub fn load(text: &str) -> Result<Self, ConfigLoadError> {
    let raw: ConfigRaw = toml::from_str(text)?;
    let default = Config::default();
    Ok(Self {
      prompt:        raw.prompt.unwrap_or(default.prompt),
      history_limit: raw.history_limit.unwrap_or(default.history_limit),
    })
  }

  pub fn load_file(path: &Path) -> Result<Self, ConfigLoadError> {
    Self::load(&fs::read_to_string(path)?)
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      prompt:        ":".to_owned(),
      history_limit: DEFAULT_HISTORY_LIMIT,
    }
  }
}
