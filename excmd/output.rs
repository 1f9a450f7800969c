use std::collections::{
  HashMap,
  VecDeque,
};

use serde::{
  Deserialize,
  Serialize,
};

use crate::context::SessionId;

pub const DEFAULT_EVENT_LIMIT: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputEventKind {
  Appended { text: String },
  Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEvent {
  pub seq:  u64,
  #[serde(flatten)]
  pub kind: OutputEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSnapshot {
  pub text:       String,
  pub oldest_seq: u64,
  pub latest_seq: u64,
}

/// Accumulated output text of one session.
///
/// Commands append chunks with [`OutputSink::output`]; a display surface
/// shows the concatenation and polls [`OutputSink::events_since`] with the
/// last sequence number it has seen to learn that new content is available.
/// The chunk list itself is unbounded - only the event log is trimmed.
#[derive(Debug, Clone)]
pub struct OutputSink {
  chunks:         Vec<String>,
  events:         VecDeque<OutputEvent>,
  next_event_seq: u64,
  event_limit:    usize,
}

impl Default for OutputSink {
  fn default() -> Self {
    Self::with_event_limit(DEFAULT_EVENT_LIMIT)
  }
}

impl OutputSink {
  pub fn with_event_limit(event_limit: usize) -> Self {
    Self {
      chunks:         Vec::new(),
      events:         VecDeque::new(),
      next_event_seq: 1,
      event_limit:    event_limit.max(1),
    }
  }

  /// Appends one chunk of display text.
  ///
  /// The text is stored exactly as given - callers bring their own line
  /// terminators.
  pub fn output(&mut self, text: impl Into<String>) {
    let text = text.into();
    self.chunks.push(text.clone());
    self.push_event(OutputEventKind::Appended { text });
  }

  pub fn clear(&mut self) {
    if self.chunks.is_empty() {
      return;
    }
    self.chunks.clear();
    self.push_event(OutputEventKind::Cleared);
  }

  /// The accumulated text, in append order.
  pub fn text(&self) -> String {
    self.chunks.concat()
  }

  pub fn is_empty(&self) -> bool {
    self.chunks.is_empty()
  }

  pub fn chunks(&self) -> impl Iterator<Item = &str> {
    self.chunks.iter().map(String::as_str)
  }

  pub fn latest_seq(&self) -> u64 {
    self.next_event_seq.saturating_sub(1)
  }

  pub fn oldest_seq(&self) -> u64 {
    self
      .events
      .front()
      .map(|event| event.seq)
      .unwrap_or(self.next_event_seq)
  }

  pub fn events_since(&self, seq: u64) -> Vec<OutputEvent> {
    self
      .events
      .iter()
      .filter(|event| event.seq > seq)
      .cloned()
      .collect()
  }

  pub fn snapshot(&self) -> OutputSnapshot {
    OutputSnapshot {
      text:       self.text(),
      oldest_seq: self.oldest_seq(),
      latest_seq: self.latest_seq(),
    }
  }

  fn push_event(&mut self, kind: OutputEventKind) {
    let event = OutputEvent {
      seq: self.next_event_seq,
      kind,
    };
    self.next_event_seq = self.next_event_seq.saturating_add(1);
    self.events.push_back(event);
    while self.events.len() > self.event_limit {
      self.events.pop_front();
    }
  }
}

/// Session-keyed store of output sinks.
///
/// Sinks are created lazily on first use and removed explicitly when their
/// session ends. Nothing here is process-global: hosts own one `Outputs`
/// (usually inside a registry) and manage its lifetime like any other value.
#[derive(Debug, Clone, Default)]
pub struct Outputs {
  sinks: HashMap<SessionId, OutputSink>,
}

impl Outputs {
  pub fn new() -> Self {
    Self::default()
  }

  /// The sink bound to `session`, created on first use.
  pub fn get_or_create(&mut self, session: SessionId) -> &mut OutputSink {
    self.sinks.entry(session).or_default()
  }

  pub fn get(&self, session: SessionId) -> Option<&OutputSink> {
    self.sinks.get(&session)
  }

  /// Tears down the sink of a finished session.
  pub fn remove(&mut self, session: SessionId) -> Option<OutputSink> {
    self.sinks.remove(&session)
  }

  pub fn sessions(&self) -> impl Iterator<Item = SessionId> {
    self.sinks.keys().copied()
  }

  pub fn len(&self) -> usize {
    self.sinks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sinks.is_empty()
  }
}
