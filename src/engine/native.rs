//! Typed adapter over the native engine's function contract.

use std::panic::{self, AssertUnwindSafe};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::EngineError;
use super::protocol::{Handle, Request};
use super::transport::EngineTransport;
use crate::core::{OptionValue, ParsedOutcome};

/// One live session with a native engine.
///
/// All calls are synchronous. Transport failures, failed envelopes, payloads
/// of the wrong shape, and panics inside the transport all come back as
/// [`EngineError`].
pub struct NativeAdapter {
    transport: Box<dyn EngineTransport>,
    last_error: Option<String>,
    calls: u64,
}

impl NativeAdapter {
    /// Wrap a connected transport.
    pub fn new(transport: Box<dyn EngineTransport>) -> Self {
        NativeAdapter {
            transport,
            last_error: None,
            calls: 0,
        }
    }

    /// Where this session's engine lives.
    pub fn describe(&self) -> String {
        self.transport.describe()
    }

    /// Message of the most recent failed call.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of calls issued on this session.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    fn exchange(&mut self, request: Request) -> Result<Value, EngineError> {
        let op = request.op();
        let handle = request.handle();
        self.calls += 1;
        tracing::debug!("engine call {} (handle {:?})", op, handle);

        let transport = &mut self.transport;
        let result = match panic::catch_unwind(AssertUnwindSafe(|| transport.call(&request))) {
            Err(_) => Err(EngineError::Panicked { op }),
            Ok(Err(source)) => Err(EngineError::Transport { op, source }),
            Ok(Ok(envelope)) if envelope.success => Ok(envelope.data.unwrap_or(Value::Null)),
            Ok(Ok(envelope)) => Err(EngineError::from_envelope(
                op,
                handle,
                envelope.code,
                envelope.error,
            )),
        };

        if let Err(err) = &result {
            tracing::debug!("engine call {} failed: {}", op, err);
            self.last_error = Some(err.to_string());
        }
        result
    }

    fn exchange_as<T: DeserializeOwned>(&mut self, request: Request) -> Result<T, EngineError> {
        let op = request.op();
        let data = self.exchange(request)?;
        serde_json::from_value(data).map_err(|e| {
            let err = EngineError::MalformedResponse {
                op,
                message: e.to_string(),
            };
            self.last_error = Some(err.to_string());
            err
        })
    }

    /// Liveness check; returns the engine's greeting.
    pub fn hello(&mut self) -> Result<String, EngineError> {
        self.exchange_as(Request::Hello)
    }

    /// Engine version string.
    pub fn version(&mut self) -> Result<String, EngineError> {
        self.exchange_as(Request::Version)
    }

    /// Whether the engine considers itself ready.
    pub fn is_available(&mut self) -> Result<bool, EngineError> {
        self.exchange_as(Request::IsAvailable)
    }

    /// The engine's own record of its last error.
    pub fn engine_last_error(&mut self) -> Result<String, EngineError> {
        self.exchange_as(Request::GetLastError)
    }

    /// Register a new command and return its handle.
    pub fn create_command(&mut self, name: &str) -> Result<Handle, EngineError> {
        let raw: u64 = self.exchange_as(Request::CreateCommand {
            name: name.to_string(),
        })?;
        Handle::new(raw).ok_or_else(|| {
            let err = EngineError::MalformedResponse {
                op: "createCommand",
                message: format!("engine returned unusable handle {}", raw),
            };
            self.last_error = Some(err.to_string());
            err
        })
    }

    pub fn add_option(
        &mut self,
        handle: Handle,
        flags: &str,
        description: &str,
        default: Option<&OptionValue>,
    ) -> Result<(), EngineError> {
        self.exchange(Request::AddOption {
            handle: handle.get(),
            flags: flags.to_string(),
            description: description.to_string(),
            default: default.cloned(),
        })
        .map(drop)
    }

    pub fn add_argument(
        &mut self,
        handle: Handle,
        name: &str,
        description: &str,
        required: bool,
    ) -> Result<(), EngineError> {
        self.exchange(Request::AddArgument {
            handle: handle.get(),
            name: name.to_string(),
            description: description.to_string(),
            required,
        })
        .map(drop)
    }

    /// Link `child` under `parent` inside the engine.
    pub fn add_child(&mut self, parent: Handle, child: Handle) -> Result<(), EngineError> {
        self.exchange(Request::AddChild {
            parent: parent.get(),
            child: child.get(),
        })
        .map(drop)
    }

    pub fn set_description(&mut self, handle: Handle, text: &str) -> Result<(), EngineError> {
        self.exchange(Request::SetDescription {
            handle: handle.get(),
            text: text.to_string(),
        })
        .map(drop)
    }

    pub fn set_version(&mut self, handle: Handle, text: &str) -> Result<(), EngineError> {
        self.exchange(Request::SetVersion {
            handle: handle.get(),
            text: text.to_string(),
        })
        .map(drop)
    }

    pub fn set_allow_unknown(&mut self, handle: Handle, allow: bool) -> Result<(), EngineError> {
        self.exchange(Request::SetAllowUnknown {
            handle: handle.get(),
            allow,
        })
        .map(drop)
    }

    /// Show or hide an option in the command's help.
    pub fn set_option_hidden(
        &mut self,
        handle: Handle,
        key: &str,
        hidden: bool,
    ) -> Result<(), EngineError> {
        self.exchange(Request::SetOptionHidden {
            handle: handle.get(),
            key: key.to_string(),
            hidden,
        })
        .map(drop)
    }

    /// Name the environment variable an option falls back to.
    pub fn set_option_env(&mut self, handle: Handle, key: &str, env: &str) -> Result<(), EngineError> {
        self.exchange(Request::SetOptionEnv {
            handle: handle.get(),
            key: key.to_string(),
            env: env.to_string(),
        })
        .map(drop)
    }

    /// Scan `argv` against the command's options and arguments.
    pub fn parse_args(
        &mut self,
        handle: Handle,
        argv: &[String],
    ) -> Result<ParsedOutcome, EngineError> {
        self.exchange_as(Request::ParseArgs {
            handle: handle.get(),
            argv: argv.to_vec(),
        })
    }

    /// Rendered help text for the command.
    pub fn get_help(&mut self, handle: Handle) -> Result<String, EngineError> {
        self.exchange_as(Request::GetHelp {
            handle: handle.get(),
        })
    }

    pub fn add_ref(&mut self, handle: Handle) -> Result<(), EngineError> {
        self.exchange(Request::AddRef {
            handle: handle.get(),
        })
        .map(drop)
    }

    pub fn release(&mut self, handle: Handle) -> Result<(), EngineError> {
        self.exchange(Request::Release {
            handle: handle.get(),
        })
        .map(drop)
    }
}

impl std::fmt::Debug for NativeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeAdapter")
            .field("transport", &self.transport.describe())
            .field("last_error", &self.last_error)
            .field("calls", &self.calls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::engine::protocol::{Envelope, NativeCode};
    use crate::test_support::MockEngine;

    struct Scripted(Vec<io::Result<Envelope>>);

    impl EngineTransport for Scripted {
        fn call(&mut self, _request: &Request) -> io::Result<Envelope> {
            self.0.remove(0)
        }

        fn describe(&self) -> String {
            "scripted".into()
        }
    }

    struct Exploding;

    impl EngineTransport for Exploding {
        fn call(&mut self, _request: &Request) -> io::Result<Envelope> {
            panic!("native crash")
        }

        fn describe(&self) -> String {
            "exploding".into()
        }
    }

    #[test]
    fn test_round_trip_against_mock() {
        let engine = MockEngine::new();
        let mut adapter = NativeAdapter::new(Box::new(engine.clone()));

        let handle = adapter.create_command("serve").unwrap();
        adapter
            .add_option(handle, "-p, --port <number>", "Port", Some(&"3000".into()))
            .unwrap();
        adapter.add_argument(handle, "<file>", "Input", true).unwrap();

        let outcome = adapter
            .parse_args(handle, &["--port".into(), "8080".into(), "in.txt".into()])
            .unwrap();
        assert_eq!(outcome.options["port"], OptionValue::from("8080"));
        assert_eq!(outcome.arguments, vec!["in.txt"]);
        assert_eq!(adapter.calls(), 4);
    }

    #[test]
    fn test_invalid_handle_is_an_error_not_a_crash() {
        let engine = MockEngine::new();
        let mut adapter = NativeAdapter::new(Box::new(engine));
        let bogus = Handle::new(777).unwrap();

        let err = adapter.add_option(bogus, "--x", "", None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidHandle { handle: 777, .. }));
        assert!(adapter.last_error().unwrap().contains("777"));
    }

    #[test]
    fn test_transport_error_translated() {
        let mut adapter = NativeAdapter::new(Box::new(Scripted(vec![Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "gone",
        ))])));
        let err = adapter.hello().unwrap_err();
        assert!(matches!(err, EngineError::Transport { op: "hello", .. }));
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_wrong_payload_type_is_malformed() {
        let mut adapter = NativeAdapter::new(Box::new(Scripted(vec![Ok(Envelope::ok(12))])));
        let err = adapter.hello().unwrap_err();
        assert!(matches!(err, EngineError::MalformedResponse { .. }));
    }

    #[test]
    fn test_zero_handle_from_engine_rejected() {
        let mut adapter = NativeAdapter::new(Box::new(Scripted(vec![Ok(Envelope::ok(0))])));
        let err = adapter.create_command("x").unwrap_err();
        assert!(matches!(err, EngineError::MalformedResponse { .. }));
    }

    #[test]
    fn test_failed_envelope_translated() {
        let mut adapter = NativeAdapter::new(Box::new(Scripted(vec![Ok(Envelope::err(
            NativeCode::Memory,
            "oom",
        ))])));
        let err = adapter.get_help(Handle::new(1).unwrap()).unwrap_err();
        assert!(matches!(err, EngineError::Memory { op: "getHelp" }));
    }

    #[test]
    fn test_panic_contained() {
        let mut adapter = NativeAdapter::new(Box::new(Exploding));
        let err = adapter.hello().unwrap_err();
        assert!(matches!(err, EngineError::Panicked { op: "hello" }));
    }

    #[test]
    fn test_handles_isolated() {
        let engine = MockEngine::new();
        let mut adapter = NativeAdapter::new(Box::new(engine.clone()));

        let busy = adapter.create_command("busy").unwrap();
        let quiet = adapter.create_command("quiet").unwrap();
        adapter.add_option(quiet, "--only", "", None).unwrap();

        for i in 0..200 {
            adapter
                .add_option(busy, &format!("--opt-{}", i), "", None)
                .unwrap();
            adapter
                .add_argument(busy, &format!("[arg{}]", i), "", false)
                .unwrap();
        }

        assert_eq!(engine.option_count(quiet), Some(1));
        assert_eq!(engine.argument_count(quiet), Some(0));
        assert_eq!(engine.option_count(busy), Some(200));
    }
}
