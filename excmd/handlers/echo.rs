//! `:echo` prints its arguments to the session's output sink.

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
  node::{
    CommandNode,
    Expr,
  },
};

/// What non-literal expressions print as. The argument scanner recognizes
/// string literals only; everything else would need an expression evaluator
/// the host does not provide.
const ERROR_TEXT: &str = "ERROR";

/// Prints its arguments separated by single spaces, followed by a newline.
///
/// String literals print their source text exactly as written between the
/// quotes, escapes and all. Any other expression prints as `ERROR`. An
/// argumentless `:echo` prints a bare newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl<Ctx: EditingContext> CommandHandler<Ctx> for EchoHandler {
  fn names(&self) -> &'static [&'static str] {
    &["ec[ho]"]
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
    let echo = match node {
      CommandNode::Echo(echo) => echo,
      _ => return Ok(false),
    };

    let mut text = String::new();
    for (i, expr) in echo.exprs.iter().enumerate() {
      if i > 0 {
        text.push(' ');
      }
      match expr {
        Expr::Literal(source) => text.push_str(source),
        Expr::Computed(_) => text.push_str(ERROR_TEXT),
      }
    }
    text.push('\n');

    // One sink write per invocation, even for an empty argument list.
    invocation.sink(ctx).output(text);
    Ok(true)
  }
}
