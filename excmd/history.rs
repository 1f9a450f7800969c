use std::collections::VecDeque;

use serde::{
  Deserialize,
  Serialize,
};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// One recorded command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
  /// Monotone 1-based index. Indices are never reused, so entries keep
  /// their numbers as older ones are evicted.
  pub index: u64,
  pub line:  String,
}

/// Bounded history of submitted command lines, oldest first.
///
/// The dispatcher records every non-blank line it is handed, before parsing,
/// so the history also remembers lines that later failed - the way a command
/// line remembers what was typed, not what worked.
#[derive(Debug, Clone)]
pub struct History {
  entries:    VecDeque<HistoryEntry>,
  next_index: u64,
  limit:      usize,
}

impl Default for History {
  fn default() -> Self {
    Self::with_limit(DEFAULT_HISTORY_LIMIT)
  }
}

impl History {
  pub fn with_limit(limit: usize) -> Self {
    Self {
      entries:    VecDeque::new(),
      next_index: 1,
      limit:      limit.max(1),
    }
  }

  /// Records one submitted line.
  ///
  /// Blank lines are not recorded. A line already present in the history is
  /// moved to the newest position under a fresh index instead of appearing
  /// twice.
  pub fn record(&mut self, line: &str) {
    let line = line.trim();
    if line.is_empty() {
      return;
    }

    self.entries.retain(|entry| entry.line != line);
    self.entries.push_back(HistoryEntry {
      index: self.next_index,
      line:  line.to_owned(),
    });
    self.next_index = self.next_index.saturating_add(1);

    while self.entries.len() > self.limit {
      self.entries.pop_front();
    }
  }

  /// Entries oldest first.
  pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
    self.entries.iter()
  }

  pub fn newest(&self) -> Option<&HistoryEntry> {
    self.entries.back()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
