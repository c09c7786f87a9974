//! Troubleshooting guidance for a missing or broken native engine.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::engine::probe::ENGINE_EXECUTABLE;
use crate::util::config::{ENGINE_ENV, FORCE_FALLBACK_ENV};

/// Advice shown by `commandeer doctor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidance {
    /// Ordered steps to get the native engine working
    pub steps: Vec<String>,
    /// Symptoms and their usual causes
    pub common_issues: Vec<String>,
    /// One-line fixes
    pub quick_fixes: Vec<String>,
    /// Advice for the current operating system
    pub platform_specific: Vec<String>,
}

/// Guidance for the platform this process runs on.
pub fn troubleshooting_guidance() -> Guidance {
    troubleshooting_guidance_for(std::env::consts::OS)
}

/// Guidance for the operating system named `os` (as in `std::env::consts::OS`).
pub fn troubleshooting_guidance_for(os: &str) -> Guidance {
    let steps = vec![
        "Run `commandeer status` to see which engine is active".to_string(),
        "Run `commandeer test` to exercise the native engine end to end".to_string(),
        format!(
            "Make sure `{}` is on PATH, next to your program, or named by {}",
            ENGINE_EXECUTABLE, ENGINE_ENV
        ),
        "Set `engine.path` in .commandeer/config.toml to pin a specific engine".to_string(),
        "Re-run with --verbose (or RUST_LOG=commandeer=debug) to see every probe attempt"
            .to_string(),
    ];

    let common_issues = vec![
        "\"no engine at ...\": the executable is not in any searched location".to_string(),
        "\"failed to start engine\": the file exists but is not executable for this platform"
            .to_string(),
        "\"hello returned an empty greeting\": the file is not a commandeer engine".to_string(),
        "\"engine version ... required\": the engine is from an incompatible major release"
            .to_string(),
        format!(
            "Engine never used: {} or `engine.disabled` forces the fallback engine",
            FORCE_FALLBACK_ENV
        ),
    ];

    let quick_fixes = vec![
        format!("export {}=/path/to/{}", ENGINE_ENV, ENGINE_EXECUTABLE),
        format!("unset {}", FORCE_FALLBACK_ENV),
        "Nothing at all: every command keeps working on the fallback engine".to_string(),
    ];

    let platform_specific = match os {
        "windows" => vec![
            format!("The engine must be named `{}`", ENGINE_EXECUTABLE),
            "Check that antivirus software is not blocking the executable".to_string(),
        ],
        "macos" => vec![
            "Clear the quarantine flag: xattr -d com.apple.quarantine <engine>".to_string(),
            "Use an engine built for this CPU (arm64 or x86_64)".to_string(),
        ],
        "linux" => vec![
            "Mark the engine executable: chmod +x <engine>".to_string(),
            "Check the engine's libc matches (glibc vs musl)".to_string(),
        ],
        other => vec![format!(
            "No native engine builds are known for `{}`; the fallback engine is used",
            other
        )],
    };

    Guidance {
        steps,
        common_issues,
        quick_fixes,
        platform_specific,
    }
}

/// Render guidance for the terminal.
pub fn format_guidance(guidance: &Guidance) -> String {
    let mut output = String::new();
    let sections = [
        ("Steps", &guidance.steps),
        ("Common issues", &guidance.common_issues),
        ("Quick fixes", &guidance.quick_fixes),
        ("Platform notes", &guidance.platform_specific),
    ];
    for (title, lines) in sections {
        let _ = writeln!(output, "{}:", title);
        for (i, line) in lines.iter().enumerate() {
            let _ = writeln!(output, "  {}. {}", i + 1, line);
        }
        let _ = writeln!(output);
    }
    output
}
