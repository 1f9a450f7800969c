//! The command registry and dispatch pipeline.
//!
//! A [`CommandRegistry`] owns everything one command-line surface needs:
//! the registered handlers, the node parser, the per-session output sinks,
//! and the command-line history. Dispatch is one synchronous pass:
//!
//! 1. record the raw line into history
//! 2. scan the line into an [`Invocation`](command_line::Invocation)
//! 3. resolve the (possibly abbreviated) name to a handler
//! 4. build the [`CommandNode`](crate::node::CommandNode) via the [`NodeParser`]
//! 5. check the handler's [`Signature`](crate::flags::Signature) against the invocation
//! 6. resolve the range against the [`EditingContext`]
//! 7. run the handler
//!
//! Steps 1-6 have no observable side effects beyond the history entry, so a
//! line that fails anywhere before step 7 leaves sinks and context exactly
//! as they were. Dispatch is single-shot: a handler that declines the node
//! kind produces [`DispatchOutcome::NotHandled`] and nothing else is tried.

use std::sync::Arc;

use thiserror::Error;

use crate::{
  command_line::{
    self,
    ParseError,
    RangeError,
  },
  context::{
    EditingContext,
    SessionId,
  },
  flags::ValidationError,
  handler::{
    CommandError,
    CommandHandler,
    CommandName,
    InvalidNamePattern,
    InvocationContext,
  },
  history::History,
  node::{
    DefaultNodeParser,
    NodeParser,
  },
  output::{
    OutputSink,
    Outputs,
  },
};

/// How a successful dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
  /// A handler accepted the node and ran.
  Completed,
  /// The resolved handler declined the node's kind. Not an error: the line
  /// belongs to some other subsystem and nothing was touched.
  NotHandled,
}

/// Why a dispatch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
  #[error(transparent)]
  Parse(#[from] ParseError),
  #[error("E492: Not an editor command: {name}")]
  UnknownCommand { name: String },
  #[error(transparent)]
  Validation(#[from] ValidationError),
  #[error(transparent)]
  Range(#[from] RangeError),
  #[error(transparent)]
  Command(#[from] CommandError),
}

/// Why a handler could not be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
  #[error(transparent)]
  InvalidNamePattern(#[from] InvalidNamePattern),
  #[error("handler declares no names")]
  NoNames,
  #[error("command name '{name}' is already registered")]
  DuplicateName { name: String },
}

struct RegisteredCommand<Ctx: EditingContext> {
  names:   Vec<CommandName>,
  handler: Arc<dyn CommandHandler<Ctx>>,
}

/// Maps command names to handlers and drives dispatch.
pub struct CommandRegistry<Ctx: EditingContext> {
  /// Registration order doubles as abbreviation precedence.
  commands: Vec<RegisteredCommand<Ctx>>,
  parser:   Box<dyn NodeParser>,
  outputs:  Outputs,
  history:  History,
}

impl<Ctx: EditingContext> Default for CommandRegistry<Ctx> {
  fn default() -> Self {
    Self::new()
  }
}

impl<Ctx: EditingContext> CommandRegistry<Ctx> {
  pub fn new() -> Self {
    Self::with_parser(DefaultNodeParser)
  }

  /// A registry using a host-provided node parser.
  pub fn with_parser(parser: impl NodeParser + 'static) -> Self {
    Self {
      commands: Vec::new(),
      parser:   Box::new(parser),
      outputs:  Outputs::new(),
      history:  History::default(),
    }
  }

  /// Registers a handler under every name pattern it declares.
  ///
  /// Full names must be unique across the registry; overlapping
  /// *abbreviations* are fine and resolve by registration order.
  pub fn register(
    &mut self,
    handler: impl CommandHandler<Ctx> + 'static,
  ) -> Result<(), RegistryError> {
    let patterns = handler.names();
    if patterns.is_empty() {
      return Err(RegistryError::NoNames);
    }

    let mut names = Vec::with_capacity(patterns.len());
    for pattern in patterns {
      let name = CommandName::parse(pattern)?;
      let taken = names
        .iter()
        .chain(self.commands.iter().flat_map(|command| command.names.iter()))
        .any(|existing: &CommandName| existing.full() == name.full());
      if taken {
        return Err(RegistryError::DuplicateName {
          name: name.full().to_owned(),
        });
      }
      names.push(name);
    }

    log::debug!("registered command {}", names[0]);
    self.commands.push(RegisteredCommand {
      names,
      handler: Arc::new(handler),
    });
    Ok(())
  }

  /// Resolves a typed name to its full registered spelling.
  pub fn resolve_name(&self, typed: &str) -> Option<&str> {
    self
      .resolve(typed)
      .map(|(command_idx, name_idx)| self.commands[command_idx].names[name_idx].full())
  }

  /// The output sink of a session, if that session has produced output.
  pub fn sink(&self, session: SessionId) -> Option<&OutputSink> {
    self.outputs.get(session)
  }

  pub fn outputs(&self) -> &Outputs {
    &self.outputs
  }

  pub fn outputs_mut(&mut self) -> &mut Outputs {
    &mut self.outputs
  }

  pub fn history(&self) -> &History {
    &self.history
  }

  /// Mutable history access, for hosts that cap or clear it.
  pub fn history_mut(&mut self) -> &mut History {
    &mut self.history
  }

  /// Dispatches one raw command line.
  ///
  /// The full pipeline runs inside this call on the caller's thread; by the
  /// time it returns, the command has either run to completion or failed
  /// with no handler involvement.
  pub fn execute(&mut self, ctx: &mut Ctx, line: &str) -> Result<DispatchOutcome, DispatchError> {
    // What was typed is remembered whether or not it works out.
    self.history.record(line);

    let invocation = command_line::parse(line)?;
    let (command_idx, name_idx) = self.resolve(invocation.name).ok_or_else(|| {
      DispatchError::UnknownCommand {
        name: invocation.name.to_owned(),
      }
    })?;

    let full_name = self.commands[command_idx].names[name_idx].full();
    log::debug!(
      "{} dispatching {:?} as {full_name}",
      ctx.session(),
      invocation.name
    );

    let node = self.parser.parse(full_name, &invocation)?;

    let signature = self.commands[command_idx].handler.signature();
    signature.check(
      invocation.has_range(),
      invocation.has_argument(),
      ctx.is_read_only(),
    )?;

    let range = match &invocation.range {
      Some(spec) => Some(spec.resolve(ctx)?),
      None => None,
    };

    let mut invocation_ctx = InvocationContext {
      range,
      bang: invocation.bang,
      outputs: &mut self.outputs,
      history: &self.history,
    };

    let handler = &self.commands[command_idx].handler;
    match handler.execute(ctx, &mut invocation_ctx, &node) {
      Ok(true) => Ok(DispatchOutcome::Completed),
      Ok(false) => {
        log::debug!("{full_name} declined node kind {:?}", node.kind());
        Ok(DispatchOutcome::NotHandled)
      },
      Err(err) => Err(DispatchError::Command(err)),
    }
  }

  fn resolve(&self, typed: &str) -> Option<(usize, usize)> {
    // An exact full name beats any abbreviation.
    for (command_idx, command) in self.commands.iter().enumerate() {
      if let Some(name_idx) = command.names.iter().position(|name| name.full() == typed) {
        return Some((command_idx, name_idx));
      }
    }
    for (command_idx, command) in self.commands.iter().enumerate() {
      if let Some(name_idx) = command.names.iter().position(|name| name.matches(typed)) {
        return Some((command_idx, name_idx));
      }
    }
    None
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    flags::{
      AccessPolicy,
      ArgumentPolicy,
      RangePolicy,
      Signature,
    },
    node::CommandNode,
  };

  struct TestContext {
    session:   SessionId,
    read_only: bool,
    lines:     usize,
    current:   usize,
  }

  impl Default for TestContext {
    fn default() -> Self {
      Self {
        session:   SessionId(1),
        read_only: false,
        lines:     10,
        current:   4,
      }
    }
  }

  impl EditingContext for TestContext {
    fn session(&self) -> SessionId {
      self.session
    }

    fn is_read_only(&self) -> bool {
      self.read_only
    }

    fn line_count(&self) -> usize {
      self.lines
    }

    fn current_line(&self) -> usize {
      self.current
    }

    fn mark_line(&self, _mark: char) -> Option<usize> {
      None
    }
  }

  /// Writes a marker line to the sink so tests can observe execution.
  struct Probe {
    names:     &'static [&'static str],
    signature: Signature,
  }

  impl Probe {
    fn new(names: &'static [&'static str]) -> Self {
      Self {
        names,
        signature: Signature {
          access: AccessPolicy::ReadOnly,
          ..Signature::DEFAULT
        },
      }
    }

    fn with_signature(names: &'static [&'static str], signature: Signature) -> Self {
      Self { names, signature }
    }
  }

  impl CommandHandler<TestContext> for Probe {
    fn names(&self) -> &'static [&'static str] {
      self.names
    }

    fn signature(&self) -> Signature {
      self.signature
    }

    fn execute(
      &self,
      ctx: &mut TestContext,
      invocation: &mut InvocationContext<'_>,
      node: &CommandNode,
    ) -> Result<bool, CommandError> {
      let simple = match node {
        CommandNode::Simple(simple) => simple,
        _ => return Ok(false),
      };
      let range = invocation
        .range
        .map(|range| format!("{},{}", range.start, range.end))
        .unwrap_or_else(|| "-".to_owned());
      let text = format!("ran {} range={range}\n", simple.name);
      invocation.sink(ctx).output(text);
      Ok(true)
    }
  }

  /// Always declines the node, whatever it is.
  struct Decline;

  impl CommandHandler<TestContext> for Decline {
    fn names(&self) -> &'static [&'static str] {
      &["dec[line]"]
    }

    fn signature(&self) -> Signature {
      Signature {
        access: AccessPolicy::ReadOnly,
        ..Signature::DEFAULT
      }
    }

    fn execute(
      &self,
      _ctx: &mut TestContext,
      _invocation: &mut InvocationContext<'_>,
      _node: &CommandNode,
    ) -> Result<bool, CommandError> {
      Ok(false)
    }
  }

  /// Runs and fails.
  struct Fail;

  impl CommandHandler<TestContext> for Fail {
    fn names(&self) -> &'static [&'static str] {
      &["fail"]
    }

    fn signature(&self) -> Signature {
      Signature {
        access: AccessPolicy::ReadOnly,
        ..Signature::DEFAULT
      }
    }

    fn execute(
      &self,
      _ctx: &mut TestContext,
      _invocation: &mut InvocationContext<'_>,
      _node: &CommandNode,
    ) -> Result<bool, CommandError> {
      Err(CommandError::new("boom"))
    }
  }

  fn sink_text(registry: &CommandRegistry<TestContext>, ctx: &TestContext) -> String {
    registry
      .sink(ctx.session())
      .map(|sink| sink.text())
      .unwrap_or_default()
  }

  #[test]
  fn unknown_commands_are_errors() {
    let mut registry = CommandRegistry::new();
    let mut ctx = TestContext::default();

    let err = registry.execute(&mut ctx, "nope").unwrap_err();
    assert_eq!(
      err,
      DispatchError::UnknownCommand {
        name: "nope".into(),
      }
    );
    assert_eq!(err.to_string(), "E492: Not an editor command: nope");
  }

  #[test]
  fn abbreviations_resolve_to_full_names() {
    let mut registry = CommandRegistry::new();
    registry.register(Probe::new(&["pro[be]"])).unwrap();

    assert_eq!(registry.resolve_name("pro"), Some("probe"));
    assert_eq!(registry.resolve_name("prob"), Some("probe"));
    assert_eq!(registry.resolve_name("probe"), Some("probe"));
    assert_eq!(registry.resolve_name("pr"), None);
    assert_eq!(registry.resolve_name("probes"), None);
  }

  #[test]
  fn exact_name_beats_abbreviation() {
    let mut registry = CommandRegistry::new();
    registry.register(Probe::new(&["ed[it]"])).unwrap();
    registry.register(Probe::new(&["edi"])).unwrap();

    // "edi" abbreviates the first command but spells the second in full.
    assert_eq!(registry.resolve_name("edi"), Some("edi"));
    assert_eq!(registry.resolve_name("ed"), Some("edit"));
    assert_eq!(registry.resolve_name("edit"), Some("edit"));
  }

  #[test]
  fn registration_order_breaks_abbreviation_ties() {
    let mut registry = CommandRegistry::new();
    registry.register(Probe::new(&["s[ave]"])).unwrap();
    registry.register(Probe::new(&["sa[ndbox]"])).unwrap();

    // "sa" abbreviates both; the earlier registration wins.
    assert_eq!(registry.resolve_name("sa"), Some("save"));
    // Longer spellings that fit only one command still resolve to it.
    assert_eq!(registry.resolve_name("san"), Some("sandbox"));
    assert_eq!(registry.resolve_name("sav"), Some("save"));
  }

  #[test]
  fn registration_errors() {
    let mut registry = CommandRegistry::new();
    registry.register(Probe::new(&["dup[licate]"])).unwrap();

    assert!(matches!(
      registry.register(Probe::new(&["duplicate"])),
      Err(RegistryError::DuplicateName { .. })
    ));
    assert!(matches!(
      registry.register(Probe::new(&["bad["])),
      Err(RegistryError::InvalidNamePattern(_))
    ));
    assert!(matches!(
      registry.register(Probe::new(&[])),
      Err(RegistryError::NoNames)
    ));
  }

  #[test]
  fn completed_dispatch_reaches_the_sink() {
    let mut registry = CommandRegistry::new();
    registry.register(Probe::new(&["pro[be]"])).unwrap();
    let mut ctx = TestContext::default();

    let outcome = registry.execute(&mut ctx, "pro").unwrap();
    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(sink_text(&registry, &ctx), "ran probe range=-\n");
  }

  #[test]
  fn resolved_ranges_reach_the_handler() {
    let mut registry = CommandRegistry::new();
    registry.register(Probe::new(&["pro[be]"])).unwrap();
    let mut ctx = TestContext::default();

    registry.execute(&mut ctx, "2,3probe").unwrap();
    assert_eq!(sink_text(&registry, &ctx), "ran probe range=2,3\n");

    // `%` resolves against the context's line count.
    registry.execute(&mut ctx, "%probe").unwrap();
    assert!(sink_text(&registry, &ctx).ends_with("range=1,10\n"));
  }

  #[test]
  fn forbidden_range_is_rejected_before_execution() {
    let mut registry = CommandRegistry::new();
    let signature = Signature {
      range:  RangePolicy::Forbidden,
      access: AccessPolicy::ReadOnly,
      ..Signature::DEFAULT
    };
    registry
      .register(Probe::with_signature(&["pro[be]"], signature))
      .unwrap();
    let mut ctx = TestContext::default();

    let err = registry.execute(&mut ctx, "1,2probe").unwrap_err();
    assert_eq!(err, DispatchError::Validation(ValidationError::RangeForbidden));
    // The handler never ran: no sink was even created.
    assert_eq!(sink_text(&registry, &ctx), "");
  }

  #[test]
  fn required_argument_is_enforced() {
    let mut registry = CommandRegistry::new();
    let signature = Signature {
      argument: ArgumentPolicy::Required,
      access:   AccessPolicy::ReadOnly,
      ..Signature::DEFAULT
    };
    registry
      .register(Probe::with_signature(&["pro[be]"], signature))
      .unwrap();
    let mut ctx = TestContext::default();

    let err = registry.execute(&mut ctx, "probe").unwrap_err();
    assert_eq!(
      err,
      DispatchError::Validation(ValidationError::ArgumentRequired)
    );
    assert!(registry.execute(&mut ctx, "probe arg").is_ok());
  }

  #[test]
  fn write_commands_are_rejected_in_read_only_contexts() {
    let mut registry = CommandRegistry::new();
    registry
      .register(Probe::with_signature(&["wr[ite]"], Signature::DEFAULT))
      .unwrap();
    registry.register(Probe::new(&["lo[ok]"])).unwrap();

    let mut ctx = TestContext {
      read_only: true,
      ..TestContext::default()
    };

    let err = registry.execute(&mut ctx, "write").unwrap_err();
    assert_eq!(err, DispatchError::Validation(ValidationError::ReadOnly));
    assert_eq!(sink_text(&registry, &ctx), "");

    // Read-only commands still run.
    registry.execute(&mut ctx, "look").unwrap();
    assert_eq!(sink_text(&registry, &ctx), "ran look range=-\n");
  }

  #[test]
  fn out_of_bounds_ranges_fail_before_execution() {
    let mut registry = CommandRegistry::new();
    registry.register(Probe::new(&["pro[be]"])).unwrap();
    let mut ctx = TestContext::default();

    let err = registry.execute(&mut ctx, "99probe").unwrap_err();
    assert!(matches!(err, DispatchError::Range(RangeError::OutOfBounds { .. })));
    assert_eq!(sink_text(&registry, &ctx), "");
  }

  #[test]
  fn declined_nodes_are_not_handled_and_nothing_else_is_tried() {
    let mut registry = CommandRegistry::new();
    registry.register(Decline).unwrap();
    // A second command whose abbreviation overlaps; it must not act as a
    // fallback once the first declines.
    registry.register(Probe::new(&["decl[utter]"])).unwrap();
    let mut ctx = TestContext::default();

    let outcome = registry.execute(&mut ctx, "dec").unwrap();
    assert_eq!(outcome, DispatchOutcome::NotHandled);
    assert_eq!(sink_text(&registry, &ctx), "");
  }

  #[test]
  fn handler_failures_surface_as_command_errors() {
    let mut registry = CommandRegistry::new();
    registry.register(Fail).unwrap();
    let mut ctx = TestContext::default();

    let err = registry.execute(&mut ctx, "fail").unwrap_err();
    assert_eq!(err, DispatchError::Command(CommandError::new("boom")));
    assert_eq!(err.to_string(), "boom");
  }

  #[test]
  fn every_submitted_line_is_recorded() {
    let mut registry = CommandRegistry::new();
    registry.register(Probe::new(&["pro[be]"])).unwrap();
    let mut ctx = TestContext::default();

    registry.execute(&mut ctx, "probe").unwrap();
    let _ = registry.execute(&mut ctx, "nope").unwrap_err();
    let _ = registry.execute(&mut ctx, "1,2,").unwrap_err();

    let lines: Vec<_> = registry
      .history()
      .entries()
      .map(|entry| entry.line.as_str())
      .collect();
    assert_eq!(lines, ["probe", "nope", "1,2,"]);
  }

  #[test]
  fn session_sinks_are_torn_down_explicitly() {
    let mut registry = CommandRegistry::new();
    registry.register(Probe::new(&["pro[be]"])).unwrap();
    let mut ctx = TestContext::default();

    registry.execute(&mut ctx, "probe").unwrap();
    assert!(registry.sink(ctx.session()).is_some());

    registry.outputs_mut().remove(ctx.session());
    assert!(registry.sink(ctx.session()).is_none());
  }
}
