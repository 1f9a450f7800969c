//! Line-oriented host for the excmd command line.
//!
//! Reads ex commands from stdin, runs them against an in-memory buffer, and
//! prints whatever each command appends to the session's output sink. This
//! binary exists to exercise the library end to end: the buffer, the host
//! commands, and the sink-draining loop are all the minimal honest versions
//! of what a real editor would wire in.

mod cli;
mod commands;
mod config;
mod context;

use std::{
  io::{
    self,
    BufRead,
    Write,
  },
  path::Path,
};

use anyhow::Result;
use excmd::{
  CommandRegistry,
  DispatchOutcome,
  EditingContext,
  History,
  OutputEventKind,
  register_builtins,
};

use crate::{
  cli::CliOptions,
  config::Config,
  context::ReplContext,
};

fn main() -> Result<()> {
  let options = CliOptions::parse()?;
  setup_logging(options.verbosity, options.log_file.as_deref())?;

  let config = match options.config_file.as_deref() {
    Some(path) => Config::load_file(path)?,
    None => Config::default(),
  };

  let mut ctx = match options.file.as_deref() {
    Some(path) => ReplContext::from_file(path, options.read_only)?,
    None => ReplContext::sample(options.read_only),
  };
  if let Some(line) = options.start_line {
    ctx.set_start_line(line);
  }

  let mut registry = CommandRegistry::new();
  *registry.history_mut() = History::with_limit(config.history_limit);
  register_builtins(&mut registry)?;
  commands::register_host_commands(&mut registry)?;

  let stdin = io::stdin();
  let mut input = stdin.lock();
  let mut stdout = io::stdout();
  // The newest sink event already printed.
  let mut seen = 0u64;

  loop {
    write!(stdout, "{}", config.prompt)?;
    stdout.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
      break;
    }
    let line = line.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() {
      continue;
    }

    match registry.execute(&mut ctx, line) {
      Ok(DispatchOutcome::Completed) => {},
      Ok(DispatchOutcome::NotHandled) => {
        log::debug!("line {line:?} was not handled");
      },
      Err(err) => eprintln!("{err}"),
    }

    if let Some(sink) = registry.sink(ctx.session()) {
      for event in sink.events_since(seen) {
        if let OutputEventKind::Appended { text } = &event.kind {
          write!(stdout, "{text}")?;
        }
        seen = event.seq;
      }
      stdout.flush()?;
    }

    if ctx.should_quit {
      break;
    }
  }

  // The session is over; its sink goes with it.
  registry.outputs_mut().remove(ctx.session());
  Ok(())
}

fn setup_logging(verbosity: u8, log_file: Option<&Path>) -> Result<()> {
  let level = match verbosity {
    0 => log::LevelFilter::Warn,
    1 => log::LevelFilter::Info,
    2 => log::LevelFilter::Debug,
    _ => log::LevelFilter::Trace,
  };

  let dispatch = fern::Dispatch::new()
    .format(|out, message, record| {
      out.finish(format_args!(
        "[{}] {} {}",
        record.level(),
        record.target(),
        message
      ))
    })
    .level(level);

  let dispatch = match log_file {
    Some(path) => dispatch.chain(fern::log_file(path)?),
    None => dispatch.chain(io::stderr()),
  };

  dispatch.apply()?;
  Ok(())
}
