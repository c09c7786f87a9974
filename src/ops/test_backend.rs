//! End-to-end engine self test.
//!
//! Runs on a freshly probed session so the cached session used by live
//! commands is never disturbed:
//!
//! - Probe (load plus liveness)
//! - `hello` and `version`
//! - Register a command, add an option and an argument
//! - Parse a sample argv and compare against the fallback engine
//! - Render help and compare against the fallback engine
//! - Release the command

use std::fmt::Write;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::{CommandDef, OptionValue};
use crate::engine::{fallback, NativeAdapter, Runtime};

const SAMPLE_COMMAND: &str = "selftest";
const SAMPLE_OPTION: &str = "-p, --port <number>";
const SAMPLE_ARGUMENT: &str = "<file>";

/// Result of a single check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// How long the check took
    pub duration: Duration,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            duration: Duration::ZERO,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: false,
            message: message.into(),
            duration: Duration::ZERO,
        }
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of an engine self test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendTestReport {
    /// Every check passed
    pub success: bool,

    /// One-line summary
    pub message: String,

    /// Individual check results, in order
    pub tests: Vec<CheckResult>,

    /// Total time taken
    pub total_duration: Duration,
}

impl BackendTestReport {
    /// Get the count of passed checks.
    pub fn passed_count(&self) -> usize {
        self.tests.iter().filter(|c| c.passed).count()
    }

    /// Get the count of failed checks.
    pub fn failed_count(&self) -> usize {
        self.tests.iter().filter(|c| !c.passed).count()
    }
}

/// Exercise the native engine end to end.
///
/// Never fails: problems are reported as failed checks.
pub fn test_backend(runtime: &Runtime) -> BackendTestReport {
    let start = Instant::now();
    let mut tests = Vec::new();

    let probe_start = Instant::now();
    let (outcome, adapter) = runtime.fresh_session();
    let adapter = match adapter {
        Some(adapter) => {
            let location = outcome
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "unknown location".to_string());
            tests.push(
                CheckResult::pass("Probe", format!("Engine loaded from {}", location))
                    .with_duration(probe_start.elapsed()),
            );
            adapter
        }
        None => {
            let reason = outcome
                .error
                .unwrap_or_else(|| "native engine unavailable".to_string());
            tests.push(CheckResult::fail("Probe", reason).with_duration(probe_start.elapsed()));
            return finish(tests, start);
        }
    };

    run_checks(adapter, &mut tests);
    finish(tests, start)
}

fn finish(tests: Vec<CheckResult>, start: Instant) -> BackendTestReport {
    let failed = tests.iter().filter(|t| !t.passed).count();
    let success = failed == 0;
    let message = if success {
        format!("All {} engine checks passed", tests.len())
    } else {
        format!("{} of {} engine checks failed", failed, tests.len())
    };
    BackendTestReport {
        success,
        message,
        tests,
        total_duration: start.elapsed(),
    }
}

fn timed(
    name: &str,
    tests: &mut Vec<CheckResult>,
    check: impl FnOnce() -> Result<String, String>,
) -> bool {
    let start = Instant::now();
    let result = match check() {
        Ok(message) => CheckResult::pass(name, message),
        Err(message) => CheckResult::fail(name, message),
    };
    let passed = result.passed;
    tests.push(result.with_duration(start.elapsed()));
    passed
}

fn run_checks(mut engine: NativeAdapter, tests: &mut Vec<CheckResult>) {
    timed("Hello", tests, || {
        engine
            .hello()
            .map(|greeting| format!("Engine says \"{}\"", greeting))
            .map_err(|e| e.to_string())
    });
    timed("Version", tests, || {
        engine
            .version()
            .map(|v| format!("Engine version {}", v))
            .map_err(|e| e.to_string())
    });

    let mut reference = CommandDef::new(SAMPLE_COMMAND);
    let default = OptionValue::from("3000");
    let setup = fallback::add_option(&mut reference, SAMPLE_OPTION, "Port", Some(default.clone()))
        .and_then(|()| fallback::add_argument(&mut reference, SAMPLE_ARGUMENT, "Input", None));
    if let Err(err) = setup {
        tests.push(CheckResult::fail("Register", err.to_string()));
        return;
    }

    let mut handle = None;
    let registered = timed("Register", tests, || {
        let created = engine.create_command(SAMPLE_COMMAND).map_err(|e| e.to_string())?;
        handle = Some(created);
        engine
            .add_option(created, SAMPLE_OPTION, "Port", Some(&default))
            .and_then(|()| engine.add_argument(created, SAMPLE_ARGUMENT, "Input", true))
            .map_err(|e| e.to_string())?;
        Ok(format!("Command registered as handle {}", created))
    });
    let Some(handle) = handle else {
        return;
    };

    if registered {
        let argv: Vec<String> = ["--port", "8080", "in.txt", "--flag"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        timed("Parse", tests, || {
            let native = engine.parse_args(handle, &argv).map_err(|e| e.to_string())?;
            if native == fallback::parse_args(&reference, &argv) {
                Ok("Parse result matches the fallback engine".to_string())
            } else {
                Err(format!("Parse result differs from the fallback engine: {:?}", native))
            }
        });
        timed("Help", tests, || {
            let native = engine.get_help(handle).map_err(|e| e.to_string())?;
            if native == fallback::get_help(&reference, SAMPLE_COMMAND, &[]) {
                Ok("Help text matches the fallback engine".to_string())
            } else {
                Err("Help text differs from the fallback engine".to_string())
            }
        });
    }

    timed("Release", tests, || {
        engine
            .release(handle)
            .map(|()| format!("Handle {} released", handle))
            .map_err(|e| e.to_string())
    });
}

/// Format a self-test report for display.
pub fn format_report(report: &BackendTestReport, verbose: bool) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Engine Self Test");
    let _ = writeln!(output, "================\n");

    let _ = writeln!(output, "Checks:");
    for check in &report.tests {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let _ = writeln!(output, "  {} {}", status, check.name);
        if verbose || !check.passed {
            let _ = writeln!(output, "      {}", check.message);
        }
        if verbose {
            let _ = writeln!(output, "      Took: {:?}", check.duration);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Summary: {} passed, {} failed",
        report.passed_count(),
        report.failed_count()
    );
    let _ = writeln!(output, "{}", report.message);

    if !report.success {
        let _ = writeln!(
            output,
            "\nCommands still work through the fallback engine. Run `commandeer doctor` for help."
        );
    }

    output
}
