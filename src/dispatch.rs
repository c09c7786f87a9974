//! Argument dispatch.
//!
//! Dispatch walks argv in three steps:
//! 1. A leading `help` token renders help for the root or a named subcommand.
//! 2. Leading tokens that name subcommands (or their aliases) descend the tree.
//! 3. The remaining tokens are scanned by the resolved command's engine and
//!    its action, if any, is invoked.
//!
//! A first token that names no subcommand is not an error: nothing runs.

use std::io::{self, Write};

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::{Command, ParsedOutcome};
use crate::util::diagnostic::Diagnostic;

/// What a dispatch did.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Help was requested; `target` is the qualified command name
    Help { target: String, text: String },
    /// `--version` on a versioned command
    Version(String),
    /// The resolved command's action ran
    Invoked {
        command: String,
        outcome: ParsedOutcome,
    },
    /// The command was resolved but has no action
    Matched {
        command: String,
        outcome: ParsedOutcome,
    },
    /// The first token names no subcommand
    Unresolved { token: Option<String> },
}

/// Errors that stop a dispatch.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum DispatchError {
    #[error("invalid arguments for `{command}`: {}", errors.join("; "))]
    #[diagnostic(code(commandeer::dispatch::invalid))]
    Invalid {
        command: String,
        errors: Vec<String>,
    },

    #[error("action for `{command}` failed")]
    #[diagnostic(code(commandeer::dispatch::action))]
    Action {
        command: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Convert to a user-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            DispatchError::Invalid { command, errors } => {
                let mut diag = Diagnostic::error(format!("invalid arguments for `{}`", command));
                for error in errors {
                    diag = diag.with_context(error.clone());
                }
                diag.with_suggestion(format!("Run `{} --help` for usage", command))
            }
            DispatchError::Action { source, .. } => {
                Diagnostic::error(self.to_string()).with_context(format!("{:#}", source))
            }
        }
    }
}

fn is_help_flag(token: &str) -> bool {
    token == "-h" || token == "--help"
}

fn is_version_flag(token: &str) -> bool {
    token == "-V" || token == "--version"
}

impl Command {
    /// Dispatch `argv` (program name first) and report what happened.
    pub fn try_parse<I, S>(&mut self, argv: I) -> Result<Dispatch, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = argv.into_iter().skip(1).map(Into::into).collect();
        let strict = self.runtime().config().parse.strict;

        if tokens.first().map(String::as_str) == Some("help") && self.child_index("help").is_none()
        {
            let (target, _) = self.resolve(&tokens[1..]);
            return Ok(Dispatch::Help {
                target: target.qualified_name(),
                text: target.help_text(),
            });
        }

        if self.has_children() {
            match tokens.first().map(String::as_str) {
                Some(token) if self.child_index(token).is_some() => {}
                Some(token) if is_help_flag(token) => {
                    return Ok(Dispatch::Help {
                        target: self.qualified_name(),
                        text: self.help_text(),
                    });
                }
                Some(token) if is_version_flag(token) && self.get_version().is_some() => {
                    return Ok(Dispatch::Version(
                        self.get_version().unwrap_or_default().to_string(),
                    ));
                }
                first => {
                    tracing::debug!("no subcommand matches {:?}", first);
                    return Ok(Dispatch::Unresolved {
                        token: first.map(str::to_string),
                    });
                }
            }
        }

        let (target, used) = self.resolve(&tokens);
        target.dispatch(&tokens[used..], strict)
    }

    /// Dispatch `argv`, printing help or the version and exiting when asked.
    ///
    /// An unresolved subcommand is a silent no-op.
    pub fn parse<I, S>(&mut self, argv: I) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.try_parse(argv)? {
            Dispatch::Help { text, .. } => {
                print!("{}", text);
                let _ = io::stdout().flush();
                std::process::exit(0)
            }
            Dispatch::Version(version) => {
                println!("{}", version);
                let _ = io::stdout().flush();
                std::process::exit(0)
            }
            Dispatch::Invoked { .. } | Dispatch::Matched { .. } | Dispatch::Unresolved { .. } => {
                Ok(())
            }
        }
    }

    /// Dispatch the current process's arguments.
    pub fn parse_env(&mut self) -> Result<(), DispatchError> {
        self.parse(std::env::args())
    }

    /// Descend through leading tokens that name subcommands.
    fn resolve(&mut self, tokens: &[String]) -> (&mut Command, usize) {
        match tokens.first().and_then(|token| self.child_index(token)) {
            Some(index) => {
                let (target, used) = self.child_at_mut(index).resolve(&tokens[1..]);
                (target, used + 1)
            }
            None => (self, 0),
        }
    }

    fn dispatch(&mut self, tokens: &[String], strict: bool) -> Result<Dispatch, DispatchError> {
        let outcome = self.parse_tokens(tokens);
        let command = self.qualified_name();

        if outcome.help {
            return Ok(Dispatch::Help {
                target: command,
                text: self.help_text(),
            });
        }
        if let Some(version) = &outcome.version {
            return Ok(Dispatch::Version(version.clone()));
        }

        if !outcome.errors.is_empty() {
            if strict {
                return Err(DispatchError::Invalid {
                    command,
                    errors: outcome.errors,
                });
            }
            for error in &outcome.errors {
                tracing::warn!("{}: {}", command, error);
            }
        }

        match self.run_action(&outcome.arguments, &outcome.options) {
            Some(Ok(())) => Ok(Dispatch::Invoked { command, outcome }),
            Some(Err(source)) => Err(DispatchError::Action { command, source }),
            None => Ok(Dispatch::Matched { command, outcome }),
        }
    }
}
