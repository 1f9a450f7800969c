//! Built-in command handlers.
//!
//! Hosts register these through [`register_builtins`] and add their own
//! handlers alongside. Nothing here is special: the built-ins go through
//! the same registration and dispatch paths as host commands.

use crate::{
  context::EditingContext,
  registry::{
    CommandRegistry,
    RegistryError,
  },
};

pub mod echo;
pub mod history;

pub use echo::EchoHandler;
pub use history::HistoryHandler;

/// Registers every built-in handler.
pub fn register_builtins<Ctx: EditingContext>(
  registry: &mut CommandRegistry<Ctx>,
) -> Result<(), RegistryError> {
  registry.register(EchoHandler)?;
  registry.register(HistoryHandler)?;
  Ok(())
}
