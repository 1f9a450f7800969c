//! Host commands working on the repl's buffer.

use excmd::{
  AccessPolicy,
  ArgumentPolicy,
  CommandError,
  CommandHandler,
  CommandNode,
  CommandRegistry,
  InvocationContext,
  RangePolicy,
  RegistryError,
  Signature,
};

use crate::context::ReplContext;

/// `:q[uit]` asks the repl loop to exit; `:q!` does so even with unsaved
/// changes.
pub struct QuitCommand;

impl CommandHandler<ReplContext> for QuitCommand {
  fn names(&self) -> &'static [&'static str] {
    &["q[uit]"]
  }

  fn signature(&self) -> Signature {
    Signature {
      range:    RangePolicy::Forbidden,
      argument: ArgumentPolicy::Forbidden,
      access:   AccessPolicy::ReadOnly,
    }
  }

  fn execute(
    &self,
    ctx: &mut ReplContext,
    invocation: &mut InvocationContext<'_>,
    node: &CommandNode,
  ) -> Result<bool, CommandError> {
    if !matches!(node, CommandNode::Simple(_)) {
      return Ok(false);
    }
    if ctx.modified && !invocation.bang {
      return Err(CommandError::new(
        "E37: No write since last change (add ! to override)",
      ));
    }
    ctx.should_quit = true;
    Ok(true)
  }
}

/// `:[range]p[rint]` prints the addressed lines and moves the caret to the
/// last one.
pub struct PrintCommand;

impl CommandHandler<ReplContext> for PrintCommand {
  fn names(&self) -> &'static [&'static str] {
    &["p[rint]"]
  }

  fn signature(&self) -> Signature {
    Signature {
      range:    RangePolicy::Optional,
      argument: ArgumentPolicy::Forbidden,
      access:   AccessPolicy::ReadOnly,
    }
  }

  fn execute(
    &self,
    ctx: &mut ReplContext,
    invocation: &mut InvocationContext<'_>,
    node: &CommandNode,
  ) -> Result<bool, CommandError> {
    if !matches!(node, CommandNode::Simple(_)) {
      return Ok(false);
    }

    let range = invocation.range_or_current(ctx);
    let mut text = String::new();
    for line_no in range.lines() {
      if let Some(line) = ctx.lines.get(line_no - 1) {
        text.push_str(line);
        text.push('\n');
      }
    }
    ctx.current = range.end;

    invocation.sink(ctx).output(text);
    Ok(true)
  }
}

/// `:[range]d[elete]` removes the addressed lines.
///
/// Marks inside the range are dropped, marks past it shift up, and the
/// caret lands where the deleted text was.
pub struct DeleteCommand;

impl CommandHandler<ReplContext> for DeleteCommand {
  fn names(&self) -> &'static [&'static str] {
    &["d[elete]"]
  }

  fn signature(&self) -> Signature {
    Signature {
      range:    RangePolicy::Optional,
      argument: ArgumentPolicy::Forbidden,
      access:   AccessPolicy::ReadWrite,
    }
  }

  fn execute(
    &self,
    ctx: &mut ReplContext,
    invocation: &mut InvocationContext<'_>,
    node: &CommandNode,
  ) -> Result<bool, CommandError> {
    if !matches!(node, CommandNode::Simple(_)) {
      return Ok(false);
    }

    let range = invocation.range_or_current(ctx);
    let removed = range.line_count();
    ctx.lines.drain(range.start - 1..range.end);
    if ctx.lines.is_empty() {
      ctx.lines.push(String::new());
    }

    ctx.marks.retain(|_, line| !range.contains(*line));
    for line in ctx.marks.values_mut() {
      if *line > range.end {
        *line -= removed;
      }
    }
    ctx.current = range.start.min(ctx.lines.len());
    ctx.modified = true;

    if removed > 2 {
      invocation.sink(ctx).output(format!("{removed} fewer lines\n"));
    }
    Ok(true)
  }
}

/// `:[range]ma[rk] {char}` places a mark on the last addressed line.
pub struct MarkCommand;

impl CommandHandler<ReplContext> for MarkCommand {
  fn names(&self) -> &'static [&'static str] {
    &["ma[rk]"]
  }

  fn signature(&self) -> Signature {
    Signature {
      range:    RangePolicy::Optional,
      argument: ArgumentPolicy::Required,
      access:   AccessPolicy::ReadOnly,
    }
  }

  fn execute(
    &self,
    ctx: &mut ReplContext,
    invocation: &mut InvocationContext<'_>,
    node: &CommandNode,
  ) -> Result<bool, CommandError> {
    let simple = match node {
      CommandNode::Simple(simple) => simple,
      _ => return Ok(false),
    };

    let argument = simple.argument.as_deref().unwrap_or("").trim();
    let mut chars = argument.chars();
    let mark = match (chars.next(), chars.next()) {
      (Some(mark), None) if mark.is_ascii_alphabetic() => mark,
      _ => {
        return Err(CommandError::new(format!(
          "E475: Invalid argument: {argument}"
        )));
      },
    };

    let line = invocation.range_or_current(ctx).end;
    ctx.marks.insert(mark, line);
    Ok(true)
  }
}

pub fn register_host_commands(
  registry: &mut CommandRegistry<ReplContext>,
) -> Result<(), RegistryError> {
  registry.register(QuitCommand)?;
  registry.register(PrintCommand)?;
  registry.register(DeleteCommand)?;
  registry.register(MarkCommand)?;
  Ok(())
}
