//! Structural constraints a command places on its invocations.
//!
//! Every handler declares a [`Signature`]: whether it takes a range prefix,
//! whether it takes argument text, and whether it may run in a read-only
//! context. The dispatcher checks the signature after parsing and before
//! execution, so a handler body never sees an invocation that violates its
//! own declaration.

use thiserror::Error;

/// Whether a command accepts a line range prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePolicy {
  /// A range prefix is rejected (`:1,2echo` fails).
  Forbidden,
  /// A range may or may not be present.
  Optional,
  /// The command is meaningless without a range.
  ///
  /// Rare: on a real command line almost every range defaults to the
  /// current line, so only commands that are pure range consumers use this.
  Required,
}

/// Whether a command accepts argument text after its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentPolicy {
  /// Trailing text is rejected.
  Forbidden,
  /// Argument text may or may not be present.
  Optional,
  /// The command requires an argument.
  Required,
}

/// Whether a command can run against a read-only buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
  /// The command never modifies the buffer and always runs.
  ReadOnly,
  /// The command may modify the buffer and is rejected when the context
  /// reports read-only.
  ReadWrite,
}

/// The structural contract between a command and the dispatcher.
///
/// Declared once per handler and immutable afterwards. The dispatcher
/// consults it on every dispatch: an invocation that violates the signature
/// produces a [`ValidationError`] and the handler is never invoked, so
/// validation failures cannot leave partial side effects behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
  pub range:    RangePolicy,
  pub argument: ArgumentPolicy,
  pub access:   AccessPolicy,
}

impl Signature {
  // This allows defining signatures with the `..Signature::DEFAULT` shorthand.
  // The defaults are the permissive-but-safe choice: ranges and arguments
  // accepted, write access assumed.
  pub const DEFAULT: Self = Self {
    range:    RangePolicy::Optional,
    argument: ArgumentPolicy::Optional,
    access:   AccessPolicy::ReadWrite,
  };

  /// Checks one invocation shape against this signature.
  ///
  /// `has_range` and `has_argument` describe the parsed line; `read_only`
  /// comes from the editing context. The first violated axis wins, checked
  /// in range, argument, access order.
  pub fn check(
    &self,
    has_range: bool,
    has_argument: bool,
    read_only: bool,
  ) -> Result<(), ValidationError> {
    match (self.range, has_range) {
      (RangePolicy::Forbidden, true) => return Err(ValidationError::RangeForbidden),
      (RangePolicy::Required, false) => return Err(ValidationError::RangeRequired),
      _ => {},
    }

    match (self.argument, has_argument) {
      (ArgumentPolicy::Forbidden, true) => return Err(ValidationError::ArgumentForbidden),
      (ArgumentPolicy::Required, false) => return Err(ValidationError::ArgumentRequired),
      _ => {},
    }

    if self.access == AccessPolicy::ReadWrite && read_only {
      return Err(ValidationError::ReadOnly);
    }

    Ok(())
  }
}

/// A structural violation caught before a handler runs.
///
/// Messages reuse the classic ex error codes where one exists, so they read
/// right to anyone coming from a vi-family editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("E481: No range allowed")]
  RangeForbidden,
  #[error("range required")]
  RangeRequired,
  #[error("E488: Trailing characters")]
  ArgumentForbidden,
  #[error("E471: Argument required")]
  ArgumentRequired,
  #[error("E21: Cannot make changes, buffer is read-only")]
  ReadOnly,
}
