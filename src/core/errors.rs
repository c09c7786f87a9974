//! Errors raised while defining options and arguments.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// A flag spec or argument token that could not be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum DefinitionError {
    #[error("flag spec is empty")]
    #[diagnostic(code(commandeer::define::empty_flags))]
    EmptyFlags,

    #[error("unrecognized token `{token}` in flag spec `{spec}`")]
    #[diagnostic(
        code(commandeer::define::bad_token),
        help("flag specs look like `-p, --port <number>` or `--verbose`")
    )]
    UnrecognizedToken { spec: String, token: String },

    #[error("flag spec `{spec}` declares more than one {kind} flag")]
    #[diagnostic(code(commandeer::define::duplicate_flag))]
    DuplicateFlag { spec: String, kind: &'static str },

    #[error("flag spec `{0}` names neither a short nor a long flag")]
    #[diagnostic(code(commandeer::define::no_flag))]
    NoFlag(String),

    #[error("option `{key}` is already defined on `{command}`")]
    #[diagnostic(code(commandeer::define::duplicate_option))]
    DuplicateOption { command: String, key: String },

    #[error("`{command}` has no option `{key}`")]
    #[diagnostic(code(commandeer::define::unknown_option))]
    UnknownOption { command: String, key: String },

    #[error("argument name is empty")]
    #[diagnostic(code(commandeer::define::empty_argument))]
    EmptyArgument,

    #[error("argument `{name}` cannot follow variadic argument `{variadic}`")]
    #[diagnostic(
        code(commandeer::define::after_variadic),
        help("only the last argument may be variadic")
    )]
    ArgumentAfterVariadic { name: String, variadic: String },
}

impl DefinitionError {
    /// Convert to a user-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            DefinitionError::UnrecognizedToken { .. } | DefinitionError::NoFlag(_) => diag
                .with_suggestion("Use `-x, --long` for flags and `<value>` or `[value]` for values"),
            DefinitionError::DuplicateOption { key, .. } => diag.with_suggestion(format!(
                "Rename one of the options so `{}` is defined once",
                key
            )),
            DefinitionError::UnknownOption { .. } => diag
                .with_suggestion("Refer to an option by its long name without dashes, e.g. `port`"),
            DefinitionError::ArgumentAfterVariadic { variadic, .. } => {
                diag.with_context(format!("`{}` already collects all remaining values", variadic))
            }
            _ => diag,
        }
    }
}
