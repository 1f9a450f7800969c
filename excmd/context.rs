//! Host-side context traits.
//!
//! The dispatcher never talks to an editor directly: everything it needs from
//! the host arrives through [`EditingContext`]. The buffer, caret, and mark
//! models stay on the host side; this trait exposes just enough of them to
//! resolve range addresses and enforce access policies.

use std::fmt;

/// Identifies one editing session for the lifetime of the process.
///
/// Output sinks are keyed by session: every session gets its own sink and the
/// sink is torn down with the session (see [`crate::output::Outputs`]). Hosts
/// decide what a session is - typically one open editor or window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "session#{}", self.0)
  }
}

/// What the dispatcher and handlers may ask of the host editor.
///
/// Line numbers are 1-based throughout, matching how ranges are written on
/// the command line. Implementations are expected to report at least one
/// line even for an empty buffer, the way buffers behave in line editors.
pub trait EditingContext {
  /// The session this context belongs to.
  fn session(&self) -> SessionId;

  /// Whether the underlying buffer rejects modification.
  ///
  /// Checked before executing any command whose signature declares write
  /// access.
  fn is_read_only(&self) -> bool;

  /// Number of lines in the buffer (`$` in a range).
  fn line_count(&self) -> usize;

  /// 1-based line the caret is on (`.` in a range).
  fn current_line(&self) -> usize;

  /// 1-based line of a mark (`'x` in a range), or `None` when the mark is
  /// not set.
  fn mark_line(&self, mark: char) -> Option<usize>;
}
