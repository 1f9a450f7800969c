use std::path::PathBuf;

use anyhow::{
  Result,
  bail,
};
use clap::{
  ArgAction,
  Parser,
};

#[derive(Clone, Debug)]
pub struct CliOptions {
  pub verbosity:   u8,
  pub log_file:    Option<PathBuf>,
  pub config_file: Option<PathBuf>,
  pub read_only:   bool,
  pub file:        Option<PathBuf>,
  pub start_line:  Option<usize>,
}

impl CliOptions {
  pub fn parse() -> Result<Self> {
    let raw = RawCli::parse();
    raw.try_into()
  }
}

#[derive(Parser, Debug)]
#[command(
  name = "excmd-repl",
  about = "Line-oriented host for the excmd command line",
  version
)]
struct RawCli {
  /// Increase logging verbosity (repeat for more detail)
  #[arg(short = 'v', action = ArgAction::Count)]
  verbosity: u8,

  /// Save logs to a specific file
  #[arg(long = "log", value_name = "FILE")]
  log_file: Option<PathBuf>,

  /// Load configuration from a specific file
  #[arg(short = 'c', long = "config", value_name = "FILE")]
  config_file: Option<PathBuf>,

  /// Open the buffer read-only
  #[arg(short = 'R', long = "read-only")]
  read_only: bool,

  /// File to load (optionally preceded by +line)
  #[arg(value_name = "files", trailing_var_arg = true)]
  inputs: Vec<String>,
}

impl TryFrom<RawCli> for CliOptions {
  type Error = anyhow::Error;

  fn try_from(raw: RawCli) -> Result<Self> {
    let mut file = None;
    let mut start_line = None;

    for input in raw.inputs {
      if let Some(line) = parse_line_override(&input) {
        start_line = Some(line);
        continue;
      }
      if file.is_some() {
        bail!("expected at most one file argument");
      }
      file = Some(PathBuf::from(input));
    }

    Ok(Self {
      verbosity: raw.verbosity,
      log_file: raw.log_file,
      config_file: raw.config_file,
      read_only: raw.read_only,
      file,
      start_line,
    })
  }
}

fn parse_line_override(value: &str) -> Option<usize> {
  let stripped = value.strip_prefix('+')?;
  if stripped.is_empty() {
    return None;
  }

  stripped.parse::<usize>().ok()
}
