//! The command handler contract.

use std::fmt;

use thiserror::Error;

use crate::{
  command_line::LineRange,
  context::EditingContext,
  flags::Signature,
  history::History,
  node::CommandNode,
  output::{
    OutputSink,
    Outputs,
  },
};

/// Failure produced by a handler at execution time.
///
/// Distinct from validation failure: by the time a handler runs, the
/// invocation already satisfied its signature. This error means the command
/// itself could not do its work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandError {
  pub message: String,
}

impl CommandError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

impl From<String> for CommandError {
  fn from(message: String) -> Self {
    Self { message }
  }
}

impl From<&str> for CommandError {
  fn from(message: &str) -> Self {
    Self {
      message: message.to_owned(),
    }
  }
}

/// A command name with its minimum abbreviation, written `ec[ho]`.
///
/// The part before the brackets is mandatory, the rest optional: `ec[ho]`
/// accepts `ec`, `ech` and `echo`. A pattern without brackets must be typed
/// in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandName {
  required: String,
  full:     String,
}

/// A name pattern that does not scan as `req[tail]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed command name pattern '{pattern}'")]
pub struct InvalidNamePattern {
  pub pattern: String,
}

impl CommandName {
  pub fn parse(pattern: &str) -> Result<Self, InvalidNamePattern> {
    let malformed = || {
      InvalidNamePattern {
        pattern: pattern.to_owned(),
      }
    };

    let (required, optional) = match pattern.split_once('[') {
      Some((required, rest)) => {
        let optional = rest.strip_suffix(']').ok_or_else(malformed)?;
        if optional.is_empty() {
          return Err(malformed());
        }
        (required, optional)
      },
      None => (pattern, ""),
    };

    let is_name_part = |part: &str| part.bytes().all(|b| b.is_ascii_alphabetic());
    if required.is_empty() || !is_name_part(required) || !is_name_part(optional) {
      return Err(malformed());
    }

    Ok(Self {
      required: required.to_owned(),
      full:     format!("{required}{optional}"),
    })
  }

  /// The full, unabbreviated name.
  pub fn full(&self) -> &str {
    &self.full
  }

  /// The shortest accepted spelling.
  pub fn required(&self) -> &str {
    &self.required
  }

  /// Whether a typed name is this name or an accepted abbreviation of it.
  pub fn matches(&self, typed: &str) -> bool {
    typed.len() >= self.required.len() && self.full.starts_with(typed)
  }
}

impl fmt::Display for CommandName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.full.len() == self.required.len() {
      write!(f, "{}", self.full)
    } else {
      write!(f, "{}[{}]", self.required, &self.full[self.required.len()..])
    }
  }
}

/// Per-invocation data the dispatcher hands to a handler.
pub struct InvocationContext<'a> {
  /// The resolved range, when one was written.
  pub range:   Option<LineRange>,
  /// Whether the command name carried a `!` suffix.
  pub bang:    bool,
  /// The sink store of the dispatching registry; reach the right sink
  /// through [`InvocationContext::sink`].
  pub outputs: &'a mut Outputs,
  /// Read view of the command-line history.
  pub history: &'a History,
}

impl InvocationContext<'_> {
  /// The output sink bound to the context's session.
  pub fn sink(&mut self, ctx: &impl EditingContext) -> &mut OutputSink {
    self.outputs.get_or_create(ctx.session())
  }

  /// The written range, or the caret line when none was written - the
  /// default address of most range-taking commands.
  pub fn range_or_current(&self, ctx: &impl EditingContext) -> LineRange {
    self.range.unwrap_or_else(|| {
      let line = ctx.current_line();
      LineRange {
        start: line,
        end:   line,
      }
    })
  }
}

/// One ex command implementation.
///
/// A handler declares how it may be invoked and does the work. The
/// dispatcher owns the rest: resolving names, building nodes, checking the
/// signature, and routing the result.
///
/// `execute` has a three-way contract:
///
/// - `Ok(true)` - the node was this handler's kind and the command ran.
/// - `Ok(false)` - the node was some other kind. This is a routing signal,
///   not a failure; the handler must leave every observable state (sink,
///   context, history) untouched when it returns `false`.
/// - `Err(_)` - the command ran and failed.
///
/// Handlers always run single-shot on the host thread: no retries, no
/// queueing, and any partial output written before an `Err` stays in the
/// sink.
pub trait CommandHandler<Ctx: EditingContext> {
  /// Name patterns this handler registers under, in `req[tail]` form.
  fn names(&self) -> &'static [&'static str];

  /// The structural constraints checked before every invocation.
  fn signature(&self) -> Signature;

  fn execute(
    &self,
    ctx: &mut Ctx,
    invocation: &mut InvocationContext<'_>,
    node: &CommandNode,
  ) -> Result<bool, CommandError>;
}
