//! commandeer - command-line parsing and dispatch on two engines
//!
//! This crate builds command trees (commands, subcommands, options,
//! arguments, actions) that run on a native engine process when one is
//! installed and on an in-process fallback engine otherwise, with the same
//! parse results and help text either way.
//!
//! ```rust,no_run
//! use commandeer::{Command, Runtime};
//!
//! let runtime = Runtime::from_env();
//! let mut app = Command::new(&runtime, "app");
//! app.command("serve", "Start the server")
//!     .option_with_default("-p, --port <number>", "Port to bind", "3000")
//!     .argument("<file>", "Input file")
//!     .action(|args, opts| {
//!         println!("serving {} on {}", args[0], opts["port"]);
//!         Ok(())
//!     });
//! app.parse_env().unwrap();
//! ```

pub mod core;
pub mod dispatch;
pub mod engine;
pub mod help;
pub mod ops;
pub mod util;

/// Test utilities and mocks for commandeer unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides an in-memory native engine and a stub loader.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    Command, CommandDiagnostics, EngineBinding, EngineMode, FallbackReason, OptionMap,
    OptionValue, ParsedOutcome,
};
pub use crate::dispatch::{Dispatch, DispatchError};
pub use crate::engine::{BackendStatus, EngineError, Runtime};
pub use crate::util::config::Config;
