//! `commandeer preview` command
//!
//! Builds a small demo tree and reports what dispatching the given argv did.

use std::rc::Rc;

use anyhow::Result;
use serde_json::json;

use crate::cli::PreviewArgs;
use commandeer::util::diagnostic::emit;
use commandeer::{Command, Dispatch, DispatchError, ParsedOutcome, Runtime};

fn demo_tree(runtime: &Rc<Runtime>) -> Command {
    let mut root = Command::new(runtime, "demo");
    root.description("Demo application")
        .version("1.0.0")
        .action(|_, _| Ok(()));

    root.command("serve", "Start the server")
        .alias("s")
        .option_with_default("-p, --port <number>", "Port to bind", "3000")
        .option("-v, --verbose", "Chatty output")
        .option("--trace", "Trace engine calls")
        .option_env("port", "DEMO_PORT")
        .hide_option("trace")
        .argument("<file>", "Input file")
        .action(|_, _| Ok(()));

    root.command("build", "Build targets")
        .option("--release", "Optimized build")
        .argument("[targets...]", "Targets to build")
        .action(|_, _| Ok(()));

    root.command("remote", "Manage remotes")
        .command("add", "Add a remote")
        .argument("<name>", "Remote name")
        .argument("<url>", "Remote URL")
        .action(|_, _| Ok(()));

    root
}

pub fn execute(args: PreviewArgs) -> Result<()> {
    let runtime = if args.fallback {
        Runtime::fallback_only()
    } else {
        Runtime::from_env()
    };
    let mut root = demo_tree(&runtime);
    let engine = if root.is_fallback() { "fallback" } else { "native" };

    let argv = std::iter::once("demo".to_string()).chain(args.argv);
    if args.parse {
        root.parse(argv)?;
        println!("Dispatched on the {} engine", engine);
        return Ok(());
    }
    let result = root.try_parse(argv);

    if args.json {
        let doc = match &result {
            Ok(dispatch) => json!({ "engine": engine, "dispatch": dispatch_json(dispatch) }),
            Err(e) => json!({ "engine": engine, "error": e.to_string() }),
        };
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("Engine: {}", engine);
    match result {
        Ok(Dispatch::Help { target, text }) => {
            println!("Help for `{}`:\n", target);
            print!("{}", text);
        }
        Ok(Dispatch::Version(version)) => println!("Version: {}", version),
        Ok(Dispatch::Invoked { command, outcome }) => {
            println!("Invoked: {}", command);
            print_outcome(&outcome);
        }
        Ok(Dispatch::Matched { command, outcome }) => {
            println!("Matched: {} (no action)", command);
            print_outcome(&outcome);
        }
        Ok(Dispatch::Unresolved { token }) => match token {
            Some(token) => println!("Unresolved: `{}` names no subcommand", token),
            None => println!("Unresolved"),
        },
        Err(e) => report_error(&e),
    }

    Ok(())
}

fn dispatch_json(dispatch: &Dispatch) -> serde_json::Value {
    match dispatch {
        Dispatch::Help { target, text } => json!({ "kind": "help", "target": target, "text": text }),
        Dispatch::Version(version) => json!({ "kind": "version", "version": version }),
        Dispatch::Invoked { command, outcome } => {
            json!({ "kind": "invoked", "command": command, "outcome": outcome })
        }
        Dispatch::Matched { command, outcome } => {
            json!({ "kind": "matched", "command": command, "outcome": outcome })
        }
        Dispatch::Unresolved { token } => json!({ "kind": "unresolved", "token": token }),
    }
}

fn print_outcome(outcome: &ParsedOutcome) {
    println!("Arguments: {:?}", outcome.arguments);
    if outcome.options.is_empty() {
        println!("Options: (none)");
    } else {
        println!("Options:");
        for (name, value) in &outcome.options {
            println!("  {} = {}", name, value);
        }
    }
    for error in &outcome.errors {
        println!("Warning: {}", error);
    }
}

fn report_error(error: &DispatchError) {
    emit(&error.to_diagnostic(), false);
}
