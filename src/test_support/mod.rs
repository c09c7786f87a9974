//! Test utilities and mocks for commandeer unit tests.
//!
//! This module provides an in-memory native engine and a loader that hands
//! it out, so engine-bound code paths run without an engine executable.
//!
//! # Example
//!
//! ```rust,ignore
//! use commandeer::test_support::{native_runtime, sample_tree};
//!
//! #[test]
//! fn test_example() {
//!     let (runtime, engine) = native_runtime();
//!     let (root, _calls) = sample_tree(&runtime);
//!     assert_eq!(engine.live_commands(), 5);
//! }
//! ```

pub mod fixtures;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::core::CommandDef;
use crate::engine::fallback;
use crate::engine::probe::{EngineLoader, ProbeError};
use crate::engine::protocol::{Envelope, Handle, NativeCode, Request};
use crate::engine::{EngineTransport, Runtime};
use crate::help::{self, HelpView};
use crate::util::config::Config;

// Re-export fixtures for convenience
pub use fixtures::*;

#[derive(Debug)]
struct MockCommand {
    def: CommandDef,
    parent: Option<u64>,
    children: Vec<u64>,
    refs: u32,
}

#[derive(Debug)]
struct MockState {
    next_id: u64,
    commands: BTreeMap<u64, MockCommand>,
    version: String,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    calls: Vec<String>,
    last_error: String,
}

/// In-memory native engine.
///
/// Clones share state, so a test can keep one clone for inspection while
/// the adapter owns another. Parsing and help rendering run the same code
/// as the fallback engine.
#[derive(Debug, Clone)]
pub struct MockEngine {
    state: Rc<RefCell<MockState>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create an engine reporting version 1.0.0.
    pub fn new() -> Self {
        MockEngine {
            state: Rc::new(RefCell::new(MockState {
                next_id: 1,
                commands: BTreeMap::new(),
                version: "1.0.0".to_string(),
                failing: HashSet::new(),
                panicking: HashSet::new(),
                calls: Vec::new(),
                last_error: String::new(),
            })),
        }
    }

    /// Make every later call to `op` answer with a failed envelope.
    pub fn fail_op(&self, op: &str) {
        self.state.borrow_mut().failing.insert(op.to_string());
    }

    /// Make every later call to `op` panic inside the transport.
    pub fn panic_on(&self, op: &str) {
        self.state.borrow_mut().panicking.insert(op.to_string());
    }

    /// Stop injecting faults into `op`.
    pub fn heal_op(&self, op: &str) {
        let mut state = self.state.borrow_mut();
        state.failing.remove(op);
        state.panicking.remove(op);
    }

    pub fn set_version(&self, version: &str) {
        self.state.borrow_mut().version = version.to_string();
    }

    /// Number of options registered on `handle`, if it is live.
    pub fn option_count(&self, handle: Handle) -> Option<usize> {
        let state = self.state.borrow();
        state.commands.get(&handle.get()).map(|c| c.def.options.len())
    }

    /// Number of arguments registered on `handle`, if it is live.
    pub fn argument_count(&self, handle: Handle) -> Option<usize> {
        let state = self.state.borrow();
        state.commands.get(&handle.get()).map(|c| c.def.arguments.len())
    }

    /// Commands not yet released.
    pub fn live_commands(&self) -> usize {
        self.state.borrow().commands.len()
    }

    /// Every op received, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.state.borrow().calls.iter().filter(|c| *c == op).count()
    }

    fn handle_request(state: &mut MockState, request: &Request) -> io::Result<Envelope> {
        let envelope = match request {
            Request::Hello => Envelope::ok("hello from the mock engine"),
            Request::Version => Envelope::ok(state.version.clone()),
            Request::IsAvailable => Envelope::ok(true),
            Request::GetLastError => Envelope::ok(state.last_error.clone()),
            Request::CreateCommand { name } => {
                let id = state.next_id;
                state.next_id += 1;
                state.commands.insert(
                    id,
                    MockCommand {
                        def: CommandDef::new(name.clone()),
                        parent: None,
                        children: Vec::new(),
                        refs: 1,
                    },
                );
                Envelope::ok(id)
            }
            Request::AddOption {
                handle,
                flags,
                description,
                default,
            } => match state.commands.get_mut(handle) {
                Some(cmd) => {
                    match fallback::add_option(&mut cmd.def, flags, description, default.clone()) {
                        Ok(()) => Envelope::empty(),
                        Err(err) => Envelope::err(NativeCode::ParseFail, err.to_string()),
                    }
                }
                None => invalid(*handle),
            },
            Request::AddArgument {
                handle,
                name,
                description,
                required,
            } => match state.commands.get_mut(handle) {
                Some(cmd) => {
                    match fallback::add_argument(&mut cmd.def, name, description, Some(*required)) {
                        Ok(()) => Envelope::empty(),
                        Err(err) => Envelope::err(NativeCode::ParseFail, err.to_string()),
                    }
                }
                None => invalid(*handle),
            },
            Request::AddChild { parent, child } => {
                if !state.commands.contains_key(child) {
                    invalid(*child)
                } else if let Some(cmd) = state.commands.get_mut(parent) {
                    cmd.children.push(*child);
                    if let Some(cmd) = state.commands.get_mut(child) {
                        cmd.parent = Some(*parent);
                    }
                    Envelope::empty()
                } else {
                    invalid(*parent)
                }
            }
            Request::SetDescription { handle, text } => match state.commands.get_mut(handle) {
                Some(cmd) => {
                    cmd.def.description = text.clone();
                    Envelope::empty()
                }
                None => invalid(*handle),
            },
            Request::SetVersion { handle, text } => match state.commands.get_mut(handle) {
                Some(cmd) => {
                    cmd.def.version = Some(text.clone());
                    Envelope::empty()
                }
                None => invalid(*handle),
            },
            Request::SetAllowUnknown { handle, allow } => match state.commands.get_mut(handle) {
                Some(cmd) => {
                    cmd.def.allow_unknown = *allow;
                    Envelope::empty()
                }
                None => invalid(*handle),
            },
            Request::SetOptionHidden {
                handle,
                key,
                hidden,
            } => match state.commands.get_mut(handle) {
                Some(cmd) => match fallback::hide_option(&mut cmd.def, key, *hidden) {
                    Ok(()) => Envelope::empty(),
                    Err(err) => Envelope::err(NativeCode::ParseFail, err.to_string()),
                },
                None => invalid(*handle),
            },
            Request::SetOptionEnv { handle, key, env } => match state.commands.get_mut(handle) {
                Some(cmd) => match fallback::set_option_env(&mut cmd.def, key, env) {
                    Ok(()) => Envelope::empty(),
                    Err(err) => Envelope::err(NativeCode::ParseFail, err.to_string()),
                },
                None => invalid(*handle),
            },
            Request::ParseArgs { handle, argv } => match state.commands.get(handle) {
                Some(cmd) => {
                    let outcome = fallback::parse_args(&cmd.def, argv);
                    Envelope::ok(serde_json::to_value(outcome).map_err(io::Error::other)?)
                }
                None => invalid(*handle),
            },
            Request::GetHelp { handle } => match state.commands.get(handle) {
                Some(cmd) => Envelope::ok(Self::render_help(state, *handle, &cmd.def)),
                None => invalid(*handle),
            },
            Request::AddRef { handle } => match state.commands.get_mut(handle) {
                Some(cmd) => {
                    cmd.refs += 1;
                    Envelope::empty()
                }
                None => invalid(*handle),
            },
            Request::Release { handle } => match state.commands.get_mut(handle) {
                Some(cmd) => {
                    cmd.refs -= 1;
                    if cmd.refs == 0 {
                        state.commands.remove(handle);
                    }
                    Envelope::empty()
                }
                None => invalid(*handle),
            },
        };
        Ok(envelope)
    }

    fn render_help(state: &MockState, handle: u64, def: &CommandDef) -> String {
        let mut names = Vec::new();
        let mut cursor = Some(handle);
        while let Some(cmd) = cursor.and_then(|id| state.commands.get(&id)) {
            names.push(cmd.def.name.clone());
            cursor = cmd.parent;
        }
        names.reverse();
        let qualified = names
            .into_iter()
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let subcommands: Vec<(String, String)> = state.commands[&handle]
            .children
            .iter()
            .filter_map(|id| state.commands.get(id))
            .map(|c| (c.def.name.clone(), c.def.description.clone()))
            .collect();

        help::render(&HelpView {
            qualified_name: &qualified,
            def,
            subcommands: &subcommands,
        })
    }
}

fn invalid(handle: u64) -> Envelope {
    Envelope::err(NativeCode::InvalidId, format!("Invalid command ID: {}", handle))
}

impl EngineTransport for MockEngine {
    fn call(&mut self, request: &Request) -> io::Result<Envelope> {
        let op = request.op();
        let mut state = self.state.borrow_mut();
        state.calls.push(op.to_string());

        if state.panicking.contains(op) {
            drop(state);
            panic!("mock engine crashed in {}", op);
        }
        if state.failing.contains(op) {
            state.last_error = format!("injected failure in {}", op);
            return Ok(Envelope::err(NativeCode::Other(99), state.last_error.clone()));
        }

        let envelope = Self::handle_request(&mut state, request)?;
        if let Some(error) = &envelope.error {
            state.last_error = error.clone();
        }
        Ok(envelope)
    }

    fn describe(&self) -> String {
        "mock engine".to_string()
    }
}

/// Loader that hands out a [`MockEngine`] and counts load attempts.
#[derive(Debug, Clone)]
pub struct StubLoader {
    engine: Option<MockEngine>,
    loads: Rc<Cell<usize>>,
}

impl StubLoader {
    /// Loader whose only candidate connects to `engine`.
    pub fn with_engine(engine: MockEngine) -> Self {
        StubLoader {
            engine: Some(engine),
            loads: Rc::new(Cell::new(0)),
        }
    }

    /// Loader whose only candidate does not exist.
    pub fn missing() -> Self {
        StubLoader {
            engine: None,
            loads: Rc::new(Cell::new(0)),
        }
    }

    /// How many times `load` has been called, across clones.
    pub fn load_calls(&self) -> usize {
        self.loads.get()
    }
}

impl EngineLoader for StubLoader {
    fn candidates(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("stub").join("commandeer-engine")]
    }

    fn load(&self, path: &Path) -> Result<Box<dyn EngineTransport>, ProbeError> {
        self.loads.set(self.loads.get() + 1);
        match &self.engine {
            Some(engine) => Ok(Box::new(engine.clone())),
            None => Err(ProbeError::NotFound(path.to_path_buf())),
        }
    }
}

/// A runtime backed by a fresh [`MockEngine`], already probed.
pub fn native_runtime() -> (Rc<Runtime>, MockEngine) {
    let engine = MockEngine::new();
    let runtime = Runtime::with_loader(
        Config::default(),
        Box::new(StubLoader::with_engine(engine.clone())),
    );
    assert!(runtime.is_available(), "mock engine should pass the probe");
    (runtime, engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_engine_rejects_unknown_handles() {
        let mut engine = MockEngine::new();
        let envelope = engine.call(&Request::GetHelp { handle: 5 }).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.code, Some(1));
    }

    #[test]
    fn test_mock_engine_refcounts() {
        let mut engine = MockEngine::new();
        engine
            .call(&Request::CreateCommand { name: "x".into() })
            .unwrap();
        engine.call(&Request::AddRef { handle: 1 }).unwrap();
        engine.call(&Request::Release { handle: 1 }).unwrap();
        assert_eq!(engine.live_commands(), 1);
        engine.call(&Request::Release { handle: 1 }).unwrap();
        assert_eq!(engine.live_commands(), 0);
    }
}
