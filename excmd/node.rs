//! Command nodes: what a raw line becomes before a handler sees it.
//!
//! The dispatcher never hands raw text to a handler. It asks a
//! [`NodeParser`] for a [`CommandNode`] first, and the handler matches on
//! the node's variant - a handler given a node of the wrong kind simply
//! declines it. [`DefaultNodeParser`] is the stock implementation; hosts
//! with a richer command-line grammar bring their own and nothing else
//! changes.
//!
//! Expressions are scanned, never evaluated. The scanner recognizes just
//! enough structure to find string literals and to keep quoted blanks from
//! splitting a span; everything that is not a lone string literal stays a
//! [`Expr::Computed`] span for an (external) evaluator - or for degradation,
//! in commands like `echo` that can run without one.

use crate::command_line::{
  Invocation,
  ParseError,
  Scanner,
};

/// A parsed command, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandNode {
  Echo(EchoNode),
  History(HistoryNode),
  /// Commands without a dedicated syntax tree; carries the raw argument.
  Simple(SimpleNode),
}

impl CommandNode {
  /// A short kind tag, mostly for log lines.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Echo(_) => "echo",
      Self::History(_) => "history",
      Self::Simple(_) => "simple",
    }
  }
}

/// `:echo` - an ordered expression list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoNode {
  pub exprs: Vec<Expr>,
}

/// `:history` - an optional substring filter over the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryNode {
  pub filter: Option<String>,
}

/// The catch-all node: full command name plus verbatim argument text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleNode {
  pub name:     String,
  pub argument: Option<String>,
}

/// One expression position on a command line.
///
/// Only string literals are readable without an evaluator. The literal text
/// is the source text between the delimiters, kept verbatim: no escape
/// processing, no quote undoubling. Everything else keeps its raw span for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
  /// A lone string literal; the payload is its inner source text.
  Literal(String),
  /// Any other expression, unevaluated.
  Computed(String),
}

impl Expr {
  pub fn is_literal(&self) -> bool {
    matches!(self, Self::Literal(_))
  }

  /// The literal's source text, or `None` for anything an evaluator would
  /// have to compute.
  pub fn literal_text(&self) -> Option<&str> {
    match self {
      Self::Literal(text) => Some(text),
      Self::Computed(_) => None,
    }
  }
}

/// Builds command nodes out of parsed lines.
///
/// This is the seam between the dispatcher and whatever parser the host
/// ships. `name` is always the full registered command name - abbreviations
/// are resolved before the node parser runs.
pub trait NodeParser {
  fn parse(&self, name: &str, invocation: &Invocation<'_>) -> Result<CommandNode, ParseError>;
}

/// The node parser used when the host does not bring its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNodeParser;

impl NodeParser for DefaultNodeParser {
  fn parse(&self, name: &str, invocation: &Invocation<'_>) -> Result<CommandNode, ParseError> {
    match name {
      "echo" => {
        Ok(CommandNode::Echo(EchoNode {
          exprs: scan_exprs(invocation.argument)?,
        }))
      },
      "history" => {
        let filter = invocation.argument.trim_end();
        Ok(CommandNode::History(HistoryNode {
          filter: (!filter.is_empty()).then(|| filter.to_owned()),
        }))
      },
      _ => {
        Ok(CommandNode::Simple(SimpleNode {
          name:     name.to_owned(),
          argument: invocation
            .has_argument()
            .then(|| invocation.argument.to_owned()),
        }))
      },
    }
  }
}

/// Splits argument text into expression spans.
///
/// Spans are separated by blanks outside string literals; a quoted string
/// keeps its blanks. This approximates expression boundaries well enough for
/// scanning - the full expression grammar belongs to the evaluator, which is
/// not this crate.
fn scan_exprs(text: &str) -> Result<Vec<Expr>, ParseError> {
  let mut scanner = Scanner::new(text);
  let mut exprs = Vec::new();

  loop {
    scanner.skip_blanks();
    if scanner.byte().is_none() {
      break;
    }
    exprs.push(scan_expr(&mut scanner)?);
  }

  Ok(exprs)
}

fn scan_expr(scanner: &mut Scanner<'_>) -> Result<Expr, ParseError> {
  let span_start = scanner.pos();

  // A span that is exactly one string literal stays a literal. A quote with
  // anything glued after it is not a lone literal, so the whole span
  // degrades to a computed expression.
  if let Some(quote @ (b'\'' | b'"')) = scanner.byte() {
    let content = scan_string(scanner, quote)?;
    if matches!(scanner.byte(), None | Some(b' ' | b'\t')) {
      return Ok(Expr::Literal(content.to_owned()));
    }
  }

  loop {
    match scanner.byte() {
      None | Some(b' ' | b'\t') => break,
      Some(quote @ (b'\'' | b'"')) => {
        // Consume the quoted extent so its blanks stay inside the span.
        scan_string(scanner, quote)?;
      },
      Some(_) => scanner.advance(),
    }
  }

  Ok(Expr::Computed(scanner.slice_from(span_start).to_owned()))
}

/// Scans one string literal and returns its inner source text verbatim.
///
/// The scanner must be positioned on the opening quote. Double quotes use
/// backslash escaping, single quotes escape by doubling; both forms only
/// matter here for finding the closing quote - the content is not rewritten.
fn scan_string<'a>(scanner: &mut Scanner<'a>, quote: u8) -> Result<&'a str, ParseError> {
  let start = scanner.pos();
  scanner.advance();
  let content_start = scanner.pos();

  loop {
    match scanner.byte() {
      None => {
        return Err(ParseError::UnterminatedString {
          text: scanner.slice_from(start).to_owned(),
        });
      },
      Some(b'\\') if quote == b'"' => {
        scanner.advance();
        if scanner.byte().is_some() {
          scanner.advance();
        }
      },
      Some(b) if b == quote => {
        if quote == b'\'' && scanner.peek_byte() == Some(b'\'') {
          // A doubled quote is a literal quote, not the end.
          scanner.advance();
          scanner.advance();
          continue;
        }
        let content = scanner.slice_from(content_start);
        scanner.advance();
        return Ok(content);
      },
      Some(_) => scanner.advance(),
    }
  }
}
