//! Engine status queries.

use std::fmt::Write;

use crate::engine::{BackendStatus, EngineError, Runtime};
use crate::util::diagnostic::Diagnostic;

/// Whether commands created on `runtime` bind to the native engine.
pub fn is_backend_available(runtime: &Runtime) -> bool {
    runtime.is_available()
}

/// Snapshot of the engine state behind `runtime`.
pub fn backend_status(runtime: &Runtime) -> BackendStatus {
    runtime.backend_status()
}

/// Render a status snapshot for the terminal.
pub fn format_status(status: &BackendStatus) -> String {
    let mut output = String::new();

    let engine = if status.engine_available {
        "native"
    } else {
        "fallback"
    };
    let _ = writeln!(output, "Engine: {}", engine);
    let _ = writeln!(
        output,
        "  Native engine available: {}",
        yes_no(status.engine_available)
    );
    let _ = writeln!(
        output,
        "  Native engine loaded:    {}",
        yes_no(status.engine_loaded)
    );
    if let Some(path) = &status.engine_path {
        let _ = writeln!(output, "  Path:    {}", path.display());
    }
    if let Some(version) = &status.engine_version {
        let _ = writeln!(output, "  Version: {}", version);
    }
    if let Some(error) = &status.load_error {
        let _ = writeln!(output, "  Load error: {}", error);
    }
    if let Some(error) = &status.last_engine_error {
        let _ = writeln!(output, "  Last engine error: {}", error);
    }

    output
}

/// A note explaining why commands run on the fallback engine, if they do.
pub fn fallback_note(status: &BackendStatus) -> Option<Diagnostic> {
    if status.engine_available {
        return None;
    }
    let reason = status
        .last_engine_error
        .clone()
        .filter(|_| status.engine_loaded)
        .or_else(|| status.load_error.clone())
        .unwrap_or_else(|| "native engine unavailable".to_string());
    let unavailable = EngineError::Unavailable {
        reason: reason.clone(),
    };
    let mut note = Diagnostic::note("commands run on the fallback engine").with_context(reason);
    note.suggestions = unavailable.to_diagnostic().suggestions;
    Some(note)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
