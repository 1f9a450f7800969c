//! `:history` lists previously submitted command lines.

use crate::{
  context::EditingContext,
  flags::{
    AccessPolicy,
    RangePolicy,
    Signature,
  },
  handler::{
    CommandError,
    CommandHandler,
    InvocationContext,
  },
  node::CommandNode,
};

/// Prints the command-line history, oldest first, marking the newest entry
/// with `>`. An argument narrows the listing to lines containing it.
///
/// Lines are recorded before dispatch, so the listing always ends with the
/// `:history` invocation that produced it (unless a filter hides it).
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryHandler;

impl<Ctx: EditingContext> CommandHandler<Ctx> for HistoryHandler {
  fn names(&self) -> &'static [&'static str] {
    &["his[tory]"]
  }

  fn signature(&self) -> Signature {
    Signature {
      range:  RangePolicy::Forbidden,
      access: AccessPolicy::ReadOnly,
      ..Signature::DEFAULT
    }
  }

  fn execute(
    &self,
    ctx: &mut Ctx,
    invocation: &mut InvocationContext<'_>,
    node: &CommandNode,
  ) -> Result<bool, CommandError> {
    let listing = match node {
      CommandNode::History(listing) => listing,
      _ => return Ok(false),
    };

    let newest = invocation.history.newest().map(|entry| entry.index);
    let mut text = String::from("      #  cmd history\n");
    for entry in invocation.history.entries() {
      if let Some(filter) = &listing.filter {
        if !entry.line.contains(filter.as_str()) {
          continue;
        }
      }
      let marker = if Some(entry.index) == newest { '>' } else { ' ' };
      text.push_str(&format!("{marker}{:>6}  {}\n", entry.index, entry.line));
    }

    invocation.sink(ctx).output(text);
    Ok(true)
  }
}
