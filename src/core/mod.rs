//! Core data structures for commandeer.
//!
//! This module contains the engine-independent command model:
//! - Flag specs and options
//! - Positional arguments
//! - Command definitions and the command tree
//! - Parse outcomes and option values

pub mod argument;
pub mod command;
pub mod definition;
pub mod errors;
pub mod option;
pub mod outcome;
pub mod value;

pub use argument::Argument;
pub use command::{
    Action, Command, CommandDiagnostics, CommandSnapshot, EngineBinding, EngineMode,
    FallbackReason,
};
pub use definition::CommandDef;
pub use errors::DefinitionError;
pub use option::{Flags, OptionDef, ValueArity};
pub use outcome::ParsedOutcome;
pub use value::{OptionMap, OptionValue};
