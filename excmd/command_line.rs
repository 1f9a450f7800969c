//! Scanning of raw ex command lines.
//!
//! An ex line has the shape `[range]name[!] [argument]`. This module splits a
//! raw line into that shape ([`parse`] producing an [`Invocation`]) and
//! resolves range specs against a live [`EditingContext`]
//! ([`RangeSpec::resolve`] producing a [`LineRange`]). It is deliberately
//! command-agnostic: what the argument text *means* is decided later, by the
//! node parser of the command the name resolves to.
//!
//! # Range Grammar
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `%` | every line in the buffer |
//! | `5` | absolute line 5 |
//! | `.` | the line the caret is on |
//! | `$` | the last line |
//! | `'a` | the line of mark `a` |
//! | `+2`, `-1`, `++` | offsets, chainable, default step 1 |
//! | `,` | address separator |
//! | `;` | separator that makes the left address the new current line |
//!
//! An omitted address defaults to the current line, so `,5`, `5,` and a bare
//! `+2` are all accepted. When more than two addresses are given the last two
//! win. Search-pattern addresses (`/pat/`, `?pat?`) are rejected: they need
//! the host's search engine, which stays on the host side of the
//! [`EditingContext`] seam.
//!
//! Resolution is the only part that touches the context, and it runs after
//! the command's signature has been checked - a command that forbids ranges
//! never causes mark lookups or bounds checks.

use std::ops;

use smallvec::{
  SmallVec,
  smallvec,
};
use thiserror::Error;

use crate::context::EditingContext;

/// One parsed command line, before any command-specific interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<'a> {
  /// The range prefix, unresolved. `None` when no range was written.
  pub range:    Option<RangeSpec>,
  /// The command name exactly as typed, possibly abbreviated.
  pub name:     &'a str,
  /// Whether the name carried a `!` suffix.
  pub bang:     bool,
  /// Argument text after the name with leading blanks stripped. Empty means
  /// the invocation has no argument.
  pub argument: &'a str,
}

impl Invocation<'_> {
  pub fn has_range(&self) -> bool {
    self.range.is_some()
  }

  pub fn has_argument(&self) -> bool {
    !self.argument.is_empty()
  }
}

/// An unresolved range prefix: one or more addresses with offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
  elems: SmallVec<[RangeElem; 2]>,
}

/// A single address within a range spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
  /// An absolute 1-based line number.
  Line(usize),
  /// `.`: the line the caret is on.
  Current,
  /// `$`: the last line of the buffer.
  Last,
  /// `'x`: the line of a mark.
  Mark(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RangeElem {
  address:   Address,
  /// Net offset applied after resolving the base address.
  offset:    i64,
  /// Whether this address was followed by `;`, which rebinds the current
  /// line for the addresses after it.
  semicolon: bool,
}

/// A range resolved to concrete buffer lines, 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
  pub start: usize,
  pub end:   usize,
}

impl LineRange {
  pub fn line_count(&self) -> usize {
    self.end - self.start + 1
  }

  pub fn contains(&self, line: usize) -> bool {
    self.start <= line && line <= self.end
  }

  /// The lines of the range in order.
  pub fn lines(&self) -> ops::RangeInclusive<usize> {
    self.start..=self.end
  }
}

/// A malformed command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  /// Nothing but colons and blanks on the line.
  #[error("empty command line")]
  EmptyLine,
  /// A range or junk where the command name should start.
  #[error("expected a command name")]
  MissingName { at: usize },
  #[error("E16: Invalid range")]
  InvalidRange { at: usize },
  /// A string literal whose closing quote never arrived.
  #[error("unterminated string {text}")]
  UnterminatedString { text: String },
}

/// A range that parsed but does not fit the buffer it is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
  #[error("E16: Invalid range")]
  OutOfBounds { line: i64, last: usize },
  #[error("E493: Backwards range given")]
  Backwards { start: usize, end: usize },
  #[error("E20: Mark not set")]
  MarkNotSet { mark: char },
}

impl RangeSpec {
  fn whole_buffer() -> Self {
    // `%` is shorthand for `1,$`.
    Self {
      elems: smallvec![
        RangeElem {
          address:   Address::Line(1),
          offset:    0,
          semicolon: false,
        },
        RangeElem {
          address:   Address::Last,
          offset:    0,
          semicolon: false,
        },
      ],
    }
  }

  /// Resolves every address against the context and returns the final
  /// one- or two-address range.
  pub fn resolve(&self, ctx: &impl EditingContext) -> Result<LineRange, RangeError> {
    let mut current = ctx.current_line();
    let mut previous = None;
    let mut last = None;

    for elem in &self.elems {
      let line = elem.resolve(ctx, current)?;
      if elem.semicolon {
        current = line;
      }
      previous = last;
      last = Some(line);
    }

    let end = last.unwrap_or(current);
    let start = previous.unwrap_or(end);
    if start > end {
      return Err(RangeError::Backwards { start, end });
    }

    Ok(LineRange { start, end })
  }
}

impl RangeElem {
  fn resolve(&self, ctx: &impl EditingContext, current: usize) -> Result<usize, RangeError> {
    let base = match self.address {
      Address::Line(n) => n as i64,
      Address::Current => current as i64,
      Address::Last => ctx.line_count() as i64,
      Address::Mark(mark) => {
        match ctx.mark_line(mark) {
          Some(line) => line as i64,
          None => return Err(RangeError::MarkNotSet { mark }),
        }
      },
    };

    let line = base.saturating_add(self.offset);
    let last = ctx.line_count();
    if line < 1 || line > last as i64 {
      return Err(RangeError::OutOfBounds { line, last });
    }

    Ok(line as usize)
  }
}

/// Splits one raw ex line into its shape.
///
/// Leading blanks and prompt colons are skipped, so `:5p`, `::5p` and
/// `  5p  ` all parse the same way. The argument text is returned verbatim
/// (trailing blanks included); only the blanks between the name and the
/// argument are stripped.
pub fn parse(line: &str) -> Result<Invocation<'_>, ParseError> {
  let mut scanner = Scanner::new(line);

  scanner.skip_blanks();
  // A line may arrive with its prompt colons still attached.
  while scanner.byte() == Some(b':') {
    scanner.advance();
    scanner.skip_blanks();
  }

  let range = scan_range(&mut scanner)?;
  scanner.skip_blanks();

  let name = scanner.take_while(|b| b.is_ascii_alphabetic());
  if name.is_empty() {
    if range.is_none() && scanner.byte().is_none() {
      return Err(ParseError::EmptyLine);
    }
    return Err(ParseError::MissingName { at: scanner.pos() });
  }

  let bang = scanner.byte() == Some(b'!');
  if bang {
    scanner.advance();
  }

  scanner.skip_blanks();
  let argument = scanner.rest();

  Ok(Invocation {
    range,
    name,
    bang,
    argument,
  })
}

fn scan_range(scanner: &mut Scanner<'_>) -> Result<Option<RangeSpec>, ParseError> {
  // `%` names the whole buffer and stands alone.
  if scanner.byte() == Some(b'%') {
    scanner.advance();
    return Ok(Some(RangeSpec::whole_buffer()));
  }

  let mut elems: SmallVec<[RangeElem; 2]> = SmallVec::new();
  loop {
    scanner.skip_blanks();
    let address = scan_address(scanner)?;
    let (offset, has_offset) = scan_offsets(scanner)?;
    scanner.skip_blanks();

    let separator = matches!(scanner.byte(), Some(b',' | b';'));

    if address.is_none() && !has_offset && !separator {
      if elems.is_empty() {
        return Ok(None);
      }
      // The previous iteration consumed a separator, as in `5,` or `5,p`.
      // The missing side defaults to the current line.
      elems.push(RangeElem {
        address:   Address::Current,
        offset:    0,
        semicolon: false,
      });
      break;
    }

    let elem = RangeElem {
      address: address.unwrap_or(Address::Current),
      offset,
      semicolon: separator && scanner.byte() == Some(b';'),
    };
    elems.push(elem);

    if separator {
      scanner.advance();
    } else {
      break;
    }
  }

  Ok(Some(RangeSpec { elems }))
}

fn scan_address(scanner: &mut Scanner<'_>) -> Result<Option<Address>, ParseError> {
  match scanner.byte() {
    Some(b'0'..=b'9') => {
      let at = scanner.pos();
      let digits = scanner.take_while(|b| b.is_ascii_digit());
      let line = digits
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidRange { at })?;
      Ok(Some(Address::Line(line)))
    },
    Some(b'.') => {
      scanner.advance();
      Ok(Some(Address::Current))
    },
    Some(b'$') => {
      scanner.advance();
      Ok(Some(Address::Last))
    },
    Some(b'\'') => {
      let at = scanner.pos();
      scanner.advance();
      match scanner.byte() {
        Some(b) if b.is_ascii_alphanumeric() || b == b'<' || b == b'>' => {
          scanner.advance();
          Ok(Some(Address::Mark(b as char)))
        },
        _ => Err(ParseError::InvalidRange { at }),
      }
    },
    // Search-pattern addresses need the host's search engine.
    Some(b'/' | b'?') => Err(ParseError::InvalidRange { at: scanner.pos() }),
    _ => Ok(None),
  }
}

fn scan_offsets(scanner: &mut Scanner<'_>) -> Result<(i64, bool), ParseError> {
  let mut total: i64 = 0;
  let mut any = false;

  loop {
    scanner.skip_blanks();
    match scanner.byte() {
      Some(sign @ (b'+' | b'-')) => {
        let at = scanner.pos();
        scanner.advance();
        scanner.skip_blanks();
        let digits = scanner.take_while(|b| b.is_ascii_digit());
        let step: i64 = if digits.is_empty() {
          1
        } else {
          digits
            .parse()
            .map_err(|_| ParseError::InvalidRange { at })?
        };
        total = if sign == b'+' {
          total.saturating_add(step)
        } else {
          total.saturating_sub(step)
        };
        any = true;
      },
      _ => break,
    }
  }

  Ok((total, any))
}

/// A byte cursor over one command line.
///
/// Positions only ever stop on ASCII bytes or the end of the input, so every
/// slice taken out of the scanner is on a character boundary even when the
/// line contains multi-byte text.
#[derive(Debug)]
pub(crate) struct Scanner<'a> {
  input: &'a str,
  /// The current byte index of the input being considered.
  pos:   usize,
}

impl<'a> Scanner<'a> {
  pub(crate) fn new(input: &'a str) -> Self {
    Self { input, pos: 0 }
  }

  /// Returns the current byte index position of the scanner in the input.
  pub(crate) fn pos(&self) -> usize {
    self.pos
  }

  pub(crate) fn byte(&self) -> Option<u8> {
    self.input.as_bytes().get(self.pos).copied()
  }

  pub(crate) fn peek_byte(&self) -> Option<u8> {
    self.input.as_bytes().get(self.pos + 1).copied()
  }

  pub(crate) fn advance(&mut self) {
    self.pos += 1;
  }

  pub(crate) fn skip_blanks(&mut self) {
    while matches!(self.byte(), Some(b' ' | b'\t')) {
      self.pos += 1;
    }
  }

  /// Consumes bytes while `pred` holds and returns them as one slice.
  pub(crate) fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
    let start = self.pos;
    while let Some(b) = self.byte() {
      if !pred(b) {
        break;
      }
      self.pos += 1;
    }
    &self.input[start..self.pos]
  }

  /// The input between `start` and the current position.
  pub(crate) fn slice_from(&self, start: usize) -> &'a str {
    &self.input[start..self.pos]
  }

  /// Consumes and returns the rest of the input verbatim.
  pub(crate) fn rest(&mut self) -> &'a str {
    let start = self.pos;
    self.pos = self.input.len();
    &self.input[start..]
  }
}

#[cfg(test)]
mod test {
  use quickcheck::quickcheck;

  use super::*;
  use crate::context::SessionId;

  #[track_caller]
  fn parse_ok(line: &str) -> Invocation<'_> {
    match parse(line) {
      Ok(invocation) => invocation,
      Err(err) => panic!("parse failed for {line:?}: {err}"),
    }
  }

  #[track_caller]
  fn assert_shape(line: &str, name: &str, bang: bool, argument: &str) {
    let invocation = parse_ok(line);
    assert_eq!(invocation.name, name, "name of {line:?}");
    assert_eq!(invocation.bang, bang, "bang of {line:?}");
    assert_eq!(invocation.argument, argument, "argument of {line:?}");
  }

  /// A fixed fake buffer for range resolution.
  struct Buffer {
    lines:   usize,
    current: usize,
  }

  impl EditingContext for Buffer {
    fn session(&self) -> SessionId {
      SessionId(0)
    }

    fn is_read_only(&self) -> bool {
      false
    }

    fn line_count(&self) -> usize {
      self.lines
    }

    fn current_line(&self) -> usize {
      self.current
    }

    fn mark_line(&self, mark: char) -> Option<usize> {
      match mark {
        'a' => Some(2),
        'b' => Some(7),
        _ => None,
      }
    }
  }

  const BUFFER: Buffer = Buffer {
    lines:   10,
    current: 4,
  };

  #[track_caller]
  fn resolve(line: &str) -> Result<LineRange, RangeError> {
    let invocation = parse_ok(line);
    let spec = invocation.range.expect("line has no range");
    spec.resolve(&BUFFER)
  }

  #[track_caller]
  fn assert_range(line: &str, start: usize, end: usize) {
    assert_eq!(resolve(line), Ok(LineRange { start, end }), "range of {line:?}");
  }

  #[test]
  fn plain_names() {
    assert_shape("echo", "echo", false, "");
    assert_shape("echo hello", "echo", false, "hello");
    assert_shape("history", "history", false, "");
    // Abbreviations are resolved later; the scanner keeps what was typed.
    assert_shape("ec 'x'", "ec", false, "'x'");
  }

  #[test]
  fn prompt_colons_and_blanks() {
    assert_shape(":echo hi", "echo", false, "hi");
    assert_shape("::echo hi", "echo", false, "hi");
    assert_shape("  :  echo   hi", "echo", false, "hi");
  }

  #[test]
  fn bang_suffix() {
    assert_shape("write!", "write", true, "");
    assert_shape("w! file.txt", "w", true, "file.txt");
    // The bang belongs to the name, not the argument.
    assert_shape("echo !", "echo", false, "!");
  }

  #[test]
  fn argument_is_kept_verbatim() {
    assert_shape("echo 'a'  'b'", "echo", false, "'a'  'b'");
    assert_shape("echo trailing  ", "echo", false, "trailing  ");
    // No blank is required between name and argument.
    assert_shape("echo'x'", "echo", false, "'x'");
  }

  #[test]
  fn empty_lines() {
    assert_eq!(parse(""), Err(ParseError::EmptyLine));
    assert_eq!(parse("   "), Err(ParseError::EmptyLine));
    assert_eq!(parse(":"), Err(ParseError::EmptyLine));
    assert_eq!(parse(" : :  "), Err(ParseError::EmptyLine));
  }

  #[test]
  fn range_without_name() {
    // A bare address is a caret motion in a full editor; this layer reports
    // it so the host can decide what to do with it.
    assert!(matches!(parse("5"), Err(ParseError::MissingName { .. })));
    assert!(matches!(parse("%"), Err(ParseError::MissingName { .. })));
    assert!(matches!(parse("'a,'b"), Err(ParseError::MissingName { .. })));
  }

  #[test]
  fn junk_instead_of_name() {
    assert!(matches!(parse("#"), Err(ParseError::MissingName { .. })));
    assert!(matches!(parse("5#"), Err(ParseError::MissingName { .. })));
  }

  #[test]
  fn range_presence() {
    assert!(!parse_ok("echo").has_range());
    assert!(parse_ok("%echo").has_range());
    assert!(parse_ok("1,5print").has_range());
    assert!(parse_ok(".print").has_range());
  }

  #[test]
  fn resolve_absolute_and_whole_buffer() {
    assert_range("5p", 5, 5);
    assert_range("1,5p", 1, 5);
    assert_range("%p", 1, 10);
    assert_range("1,$p", 1, 10);
  }

  #[test]
  fn resolve_current_and_last() {
    assert_range(".p", 4, 4);
    assert_range("$p", 10, 10);
    assert_range(".,$p", 4, 10);
    // An omitted address defaults to the current line.
    assert_range(",5p", 4, 5);
    assert_range("2,p", 2, 4);
    assert_range(",p", 4, 4);
  }

  #[test]
  fn resolve_offsets() {
    assert_range(".+2p", 6, 6);
    assert_range(".-1,.+1p", 3, 5);
    assert_range("+2p", 6, 6);
    assert_range("-3p", 1, 1);
    // Offsets chain; a sign without digits steps by one.
    assert_range(".++p", 6, 6);
    assert_range("5+2-1p", 6, 6);
    // Blanks are allowed around addresses and offsets.
    assert_range(" 1 , 5 p", 1, 5);
    assert_range(". + 2 p", 6, 6);
  }

  #[test]
  fn resolve_marks() {
    assert_range("'a,'bp", 2, 7);
    assert_eq!(resolve("'zp"), Err(RangeError::MarkNotSet { mark: 'z' }));
  }

  #[test]
  fn semicolon_rebinds_current() {
    // `6;+2`: the right side is relative to 6, not to the caret.
    assert_range("6;+2p", 6, 8);
    // With a comma the offset is relative to the caret (line 4).
    assert_range("6,.+4p", 6, 8);
  }

  #[test]
  fn more_than_two_addresses_keep_the_last_two() {
    assert_range("1,3,5p", 3, 5);
    assert_range("8;1;2p", 1, 2);
  }

  #[test]
  fn out_of_bounds_ranges() {
    assert!(matches!(
      resolve("11p"),
      Err(RangeError::OutOfBounds { line: 11, .. })
    ));
    assert!(matches!(
      resolve("1-1p"),
      Err(RangeError::OutOfBounds { line: 0, .. })
    ));
    assert!(matches!(
      resolve("$+1p"),
      Err(RangeError::OutOfBounds { line: 11, .. })
    ));
  }

  #[test]
  fn backwards_ranges() {
    assert_eq!(
      resolve("5,2p"),
      Err(RangeError::Backwards { start: 5, end: 2 })
    );
    // `5,p` with the caret on line 4 runs backwards too.
    assert_eq!(
      resolve("5,p"),
      Err(RangeError::Backwards { start: 5, end: 4 })
    );
  }

  #[test]
  fn malformed_ranges() {
    assert!(matches!(parse("'"), Err(ParseError::InvalidRange { .. })));
    assert!(matches!(parse("'~p"), Err(ParseError::InvalidRange { .. })));
    assert!(matches!(parse("/pat/d"), Err(ParseError::InvalidRange { .. })));
    assert!(matches!(parse("?pat?d"), Err(ParseError::InvalidRange { .. })));
    // A line number that does not fit in usize.
    assert!(matches!(
      parse("99999999999999999999999999p"),
      Err(ParseError::InvalidRange { .. })
    ));
  }

  #[test]
  fn multibyte_input_is_scanned_safely() {
    assert_shape("echo 'héllo wörld'", "echo", false, "'héllo wörld'");
    assert_shape("echo 日本語", "echo", false, "日本語");
    assert!(parse("日本語").is_err());
  }

  quickcheck! {
    fn parse_never_panics(line: String) -> bool {
      // Success or failure are both fine; the scanner just must not panic.
      let _ = parse(&line);
      true
    }
  }
}
