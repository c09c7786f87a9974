//! Test fixtures for common test scenarios.
//!
//! This module provides a small pre-built command tree whose actions record
//! every invocation.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{Action, Command, OptionMap};
use crate::engine::Runtime;

/// One recorded action call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Name of the command whose action ran.
    pub command: String,
    /// Positional arguments passed to the action.
    pub arguments: Vec<String>,
    /// Options passed to the action.
    pub options: OptionMap,
}

/// Shared log of action calls.
pub type Recorder = Rc<RefCell<Vec<Invocation>>>;

fn record(recorder: &Recorder, command: &str) -> Action {
    let recorder = Rc::clone(recorder);
    let command = command.to_string();
    Box::new(move |arguments: &[String], options: &OptionMap| {
        recorder.borrow_mut().push(Invocation {
            command: command.clone(),
            arguments: arguments.to_vec(),
            options: options.clone(),
        });
        Ok(())
    })
}

/// Build the sample tree:
///
/// ```text
/// app                         Demo application (1.0.0)
///   serve|s <file>            -p, --port <number> (3000), -v, --verbose
///   build [targets...]        --release
///   remote
///     add <name> <url>
/// ```
///
/// Every command except `remote` has a recording action.
pub fn sample_tree(runtime: &Rc<Runtime>) -> (Command, Recorder) {
    let recorder: Recorder = Rc::new(RefCell::new(Vec::new()));

    let mut root = Command::new(runtime, "app");
    root.description("Demo application")
        .version("1.0.0")
        .action(record(&recorder, "app"));

    root.command("serve", "Start the server")
        .alias("s")
        .option_with_default("-p, --port <number>", "Port to bind", "3000")
        .option("-v, --verbose", "Chatty output")
        .argument("<file>", "Input file")
        .action(record(&recorder, "serve"));

    root.command("build", "Build targets")
        .option("--release", "Optimized build")
        .argument("[targets...]", "Targets to build")
        .action(record(&recorder, "build"));

    root.command("remote", "Manage remotes")
        .command("add", "Add a remote")
        .argument("<name>", "Remote name")
        .argument("<url>", "Remote URL")
        .action(record(&recorder, "add"));

    (root, recorder)
}
