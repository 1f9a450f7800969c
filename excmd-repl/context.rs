//! Application context (state).

use std::{
  collections::HashMap,
  fs,
  path::Path,
};

use anyhow::{
  Context as _,
  Result,
};
use excmd::{
  EditingContext,
  SessionId,
};

/// The in-memory buffer the repl edits.
///
/// Lines are 1-based to match command-line addressing. The buffer always
/// holds at least one line, like vi's empty buffer.
pub struct ReplContext {
  pub lines:       Vec<String>,
  pub current:     usize,
  pub marks:       HashMap<char, usize>,
  pub read_only:   bool,
  pub modified:    bool,
  pub should_quit: bool,
}

impl ReplContext {
  /// A small built-in buffer so the repl is usable without a file.
  pub fn sample(read_only: bool) -> Self {
    let lines = [
      "The quick brown fox",
      "jumps over the lazy dog",
      "while the cat watches",
    ];
    Self::with_lines(lines.iter().map(|line| line.to_string()).collect(), read_only)
  }

  pub fn from_file(path: &Path, read_only: bool) -> Result<Self> {
    let text = fs::read_to_string(path)
      .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Self::with_lines(
      text.lines().map(str::to_owned).collect(),
      read_only,
    ))
  }

  fn with_lines(mut lines: Vec<String>, read_only: bool) -> Self {
    if lines.is_empty() {
      lines.push(String::new());
    }
    Self {
      lines,
      current: 1,
      marks: HashMap::new(),
      read_only,
      modified: false,
      should_quit: false,
    }
  }

  pub fn set_start_line(&mut self, line: usize) {
    self.current = line.clamp(1, self.lines.len());
  }
}

impl EditingContext for ReplContext {
  fn session(&self) -> SessionId {
    // One buffer, one session.
    SessionId(1)
  }

  fn is_read_only(&self) -> bool {
    self.read_only
  }

  fn line_count(&self) -> usize {
    self.lines.len()
  }

  fn current_line(&self) -> usize {
    self.current
  }

  fn mark_line(&self, mark: char) -> Option<usize> {
    self.marks.get(&mark).copied()
  }
}
