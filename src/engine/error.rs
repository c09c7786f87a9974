//! Engine error taxonomy.

use std::io;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use super::protocol::NativeCode;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Anything that can go wrong talking to the native engine.
///
/// Every adapter operation returns this instead of letting a native-side
/// failure reach application code.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum EngineError {
    #[error("native engine is not available: {reason}")]
    #[diagnostic(code(commandeer::engine::unavailable))]
    Unavailable { reason: String },

    #[error("{op}: invalid command handle {handle}")]
    #[diagnostic(code(commandeer::engine::invalid_handle))]
    InvalidHandle { op: &'static str, handle: u64 },

    #[error("{op}: null parameter provided")]
    #[diagnostic(code(commandeer::engine::null_parameter))]
    NullParameter { op: &'static str },

    #[error("{op}: parsing failed: {message}")]
    #[diagnostic(code(commandeer::engine::parse_failed))]
    ParseFailed { op: &'static str, message: String },

    #[error("{op}: memory allocation error")]
    #[diagnostic(code(commandeer::engine::memory))]
    Memory { op: &'static str },

    #[error("{op}: {message} (code {code})")]
    #[diagnostic(code(commandeer::engine::native))]
    Native {
        op: &'static str,
        code: i32,
        message: String,
    },

    #[error("{op}: malformed engine response: {message}")]
    #[diagnostic(code(commandeer::engine::malformed_response))]
    MalformedResponse { op: &'static str, message: String },

    #[error("{op}: engine transport failed")]
    #[diagnostic(code(commandeer::engine::transport))]
    Transport {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{op}: engine panicked")]
    #[diagnostic(code(commandeer::engine::panicked))]
    Panicked { op: &'static str },
}

impl EngineError {
    /// Translate a failed envelope into an error.
    pub fn from_envelope(
        op: &'static str,
        handle: Option<u64>,
        code: Option<i32>,
        message: Option<String>,
    ) -> Self {
        let message = message.unwrap_or_else(|| "unknown engine error".to_string());
        match code.map(NativeCode::from_i32) {
            Some(NativeCode::InvalidId) => EngineError::InvalidHandle {
                op,
                handle: handle.unwrap_or(0),
            },
            Some(NativeCode::NullParam) => EngineError::NullParameter { op },
            Some(NativeCode::ParseFail) => EngineError::ParseFailed { op, message },
            Some(NativeCode::Memory) => EngineError::Memory { op },
            Some(other) => EngineError::Native {
                op,
                code: other.as_i32(),
                message,
            },
            None => EngineError::Native {
                op,
                code: -1,
                message,
            },
        }
    }

    /// Whether this error means the engine itself is gone.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            EngineError::Unavailable { .. }
                | EngineError::Transport { .. }
                | EngineError::Panicked { .. }
        )
    }

    /// Convert to a user-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            EngineError::Unavailable { reason } if reason.contains("disabled") => diag
                .with_context("commands keep working through the fallback engine")
                .with_suggestion(suggestions::ENABLE_ENGINE),
            EngineError::Unavailable { .. } => diag
                .with_context("commands keep working through the fallback engine")
                .with_suggestion(suggestions::INSTALL_ENGINE)
                .with_suggestion(suggestions::RUN_DOCTOR),
            EngineError::InvalidHandle { handle, .. } => diag
                .with_context(format!("handle {} is unknown or was released", handle))
                .with_suggestion(suggestions::REPORT_BUG),
            EngineError::Transport { source, .. } => diag
                .with_context(source.to_string())
                .with_suggestion(suggestions::RUN_TEST),
            EngineError::MalformedResponse { .. } | EngineError::Panicked { .. } => {
                diag.with_suggestion(suggestions::RUN_TEST)
            }
            _ => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_translation() {
        let err = EngineError::from_envelope("addOption", Some(9), Some(1), None);
        assert!(matches!(
            err,
            EngineError::InvalidHandle {
                op: "addOption",
                handle: 9
            }
        ));

        let err = EngineError::from_envelope("parseArgs", None, Some(3), Some("bad".into()));
        assert_eq!(err.to_string(), "parseArgs: parsing failed: bad");

        let err = EngineError::from_envelope("getHelp", None, Some(42), Some("odd".into()));
        assert_eq!(err.to_string(), "getHelp: odd (code 42)");
    }

    #[test]
    fn test_diagnostic_suggests_fallback_context() {
        let err = EngineError::Unavailable {
            reason: "not found".into(),
        };
        let out = err.to_diagnostic().format(false);
        assert!(out.contains("fallback engine"));
        assert!(out.contains("help: consider:"));
        assert!(out.contains("COMMANDEER_ENGINE"));

        let err = EngineError::Unavailable {
            reason: "native engine disabled by configuration".into(),
        };
        let out = err.to_diagnostic().format(false);
        assert!(out.contains("Unset COMMANDEER_FORCE_FALLBACK"));
        assert!(!out.contains("Install `commandeer-engine`"));
    }
}
