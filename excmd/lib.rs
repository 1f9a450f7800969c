//! # excmd
//!
//! An embeddable ex-style command line: `[range]name[!] [argument]`.
//!
//! The crate parses command lines, resolves abbreviated names against a
//! registry, validates each invocation against the handler's declared
//! signature, and runs the handler with output collected per session. The
//! host supplies the editing state behind the [`EditingContext`] trait and
//! decides when sessions and their output sinks come and go.
//!
//! - **Handlers**: one object per command, declaring its names and
//!   [`Signature`] and executing typed [`CommandNode`]s
//! - **Single-shot dispatch**: one synchronous pass per line; validation
//!   failures surface before the handler can touch anything
//! - **Sessions**: output accumulates in per-session [`OutputSink`]s with a
//!   pollable event log, never in global state
//!
//! ```rust
//! use excmd::{
//!   CommandRegistry,
//!   EditingContext,
//!   SessionId,
//!   register_builtins,
//! };
//!
//! struct Host;
//!
//! impl EditingContext for Host {
//!   fn session(&self) -> SessionId {
//!     SessionId(1)
//!   }
//!
//!   fn is_read_only(&self) -> bool {
//!     false
//!   }
//!
//!   fn line_count(&self) -> usize {
//!     1
//!   }
//!
//!   fn current_line(&self) -> usize {
//!     1
//!   }
//!
//!   fn mark_line(&self, _mark: char) -> Option<usize> {
//!     None
//!   }
//! }
//!
//! let mut registry = CommandRegistry::new();
//! register_builtins(&mut registry)?;
//!
//! let mut host = Host;
//! registry.execute(&mut host, "echo 'hello' 'world'")?;
//!
//! assert_eq!(registry.sink(SessionId(1)).unwrap().text(), "hello world\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod command_line;
pub mod context;
pub mod flags;
pub mod handler;
pub mod handlers;
pub mod history;
pub mod node;
pub mod output;
pub mod registry;

pub use command_line::{
  Address,
  Invocation,
  LineRange,
  ParseError,
  RangeError,
  RangeSpec,
  parse,
};
pub use context::{
  EditingContext,
  SessionId,
};
pub use flags::{
  AccessPolicy,
  ArgumentPolicy,
  RangePolicy,
  Signature,
  ValidationError,
};
pub use handler::{
  CommandError,
  CommandHandler,
  CommandName,
  InvalidNamePattern,
  InvocationContext,
};
pub use handlers::{
  EchoHandler,
  HistoryHandler,
  register_builtins,
};
pub use history::{
  History,
  HistoryEntry,
};
pub use node::{
  CommandNode,
  DefaultNodeParser,
  EchoNode,
  Expr,
  HistoryNode,
  NodeParser,
  SimpleNode,
};
pub use output::{
  OutputEvent,
  OutputEventKind,
  OutputSink,
  OutputSnapshot,
  Outputs,
};
pub use registry::{
  CommandRegistry,
  DispatchError,
  DispatchOutcome,
  RegistryError,
};
