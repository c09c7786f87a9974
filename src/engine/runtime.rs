//! Engine selection context.
//!
//! A [`Runtime`] is built once and shared (`Rc`) by every command in a tree.
//! It owns the memoized probe result and the single live native session.
//! Two runtimes never share state, so tests can simulate an engine being
//! present and absent side by side.

use std::cell::{Cell, OnceCell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::error::EngineError;
use super::native::NativeAdapter;
use super::probe::{self, EngineLoader, ProbeOutcome, ProcessLoader};
use crate::util::config::Config;

/// Snapshot of the engine state, as reported by diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatus {
    /// The native engine answered the liveness checks
    pub engine_available: bool,
    /// An engine executable was found and started
    pub engine_loaded: bool,
    /// Why the engine could not be used
    pub load_error: Option<String>,
    /// Most recent failed engine call
    pub last_engine_error: Option<String>,
    pub engine_path: Option<PathBuf>,
    pub engine_version: Option<String>,
}

/// Shared engine context for a command tree.
pub struct Runtime {
    config: Config,
    loader: Option<Box<dyn EngineLoader>>,
    status: OnceCell<ProbeOutcome>,
    session: RefCell<Option<NativeAdapter>>,
    last_engine_error: RefCell<Option<String>>,
    /// The live session died after a successful probe
    session_lost: Cell<bool>,
    notified: Cell<bool>,
    notices: Cell<usize>,
}

impl Runtime {
    /// Runtime that looks for the engine executable as `config` describes.
    pub fn new(config: Config) -> Rc<Self> {
        let loader = ProcessLoader::new(config.engine.clone());
        Self::with_loader(config, Box::new(loader))
    }

    /// Runtime configured from config files and the process environment.
    pub fn from_env() -> Rc<Self> {
        Self::new(Config::from_env())
    }

    /// Runtime that probes through a custom loader.
    pub fn with_loader(config: Config, loader: Box<dyn EngineLoader>) -> Rc<Self> {
        Rc::new(Runtime {
            config,
            loader: Some(loader),
            status: OnceCell::new(),
            session: RefCell::new(None),
            last_engine_error: RefCell::new(None),
            session_lost: Cell::new(false),
            notified: Cell::new(false),
            notices: Cell::new(0),
        })
    }

    /// Runtime that never probes; every command uses the fallback engine.
    pub fn fallback_only() -> Rc<Self> {
        let status = OnceCell::new();
        let _ = status.set(ProbeOutcome {
            error: Some("native engine not requested".to_string()),
            ..Default::default()
        });
        Rc::new(Runtime {
            config: Config::default(),
            loader: None,
            status,
            session: RefCell::new(None),
            last_engine_error: RefCell::new(None),
            session_lost: Cell::new(false),
            notified: Cell::new(true),
            notices: Cell::new(0),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The probe result, computed on first use and cached afterwards.
    pub fn status(&self) -> &ProbeOutcome {
        self.status.get_or_init(|| {
            let (outcome, adapter) = match &self.loader {
                Some(loader) => probe::probe(loader.as_ref()),
                None => (ProbeOutcome::default(), None),
            };
            *self.session.borrow_mut() = adapter;
            outcome
        })
    }

    /// Whether new commands bind to the native engine.
    ///
    /// Turns false for good once the live session is lost.
    pub fn is_available(&self) -> bool {
        self.status().available && !self.session_lost.get()
    }

    fn unavailable_reason(&self) -> Option<String> {
        if self.session_lost.get() {
            self.last_engine_error()
        } else {
            self.status().error.clone()
        }
    }

    /// Probe again without touching the cached result or the live session.
    pub fn retest(&self) -> ProbeOutcome {
        self.fresh_session().0
    }

    /// Probe again and hand back a session of its own.
    pub fn fresh_session(&self) -> (ProbeOutcome, Option<NativeAdapter>) {
        match &self.loader {
            Some(loader) => probe::probe(loader.as_ref()),
            None => (self.status().clone(), None),
        }
    }

    /// Run `f` against the live native session.
    pub fn with_engine<T>(
        &self,
        f: impl FnOnce(&mut NativeAdapter) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let reason = self.unavailable_reason();
        let mut session = self
            .session
            .try_borrow_mut()
            .map_err(|_| EngineError::Unavailable {
                reason: "engine session is already in use".to_string(),
            })?;
        let adapter = session.as_mut().ok_or_else(|| EngineError::Unavailable {
            reason: reason.unwrap_or_else(|| "no engine session".to_string()),
        })?;

        let result = f(adapter);
        if let Err(err) = &result {
            *self.last_engine_error.borrow_mut() = Some(err.to_string());
            if err.is_unavailable() {
                tracing::warn!("native engine session lost: {}", err);
                *session = None;
                self.session_lost.set(true);
            }
        }
        result
    }

    /// Log the fallback notice, once per runtime.
    pub fn notify_fallback(&self) {
        if self.notified.replace(true) {
            return;
        }
        self.notices.set(self.notices.get() + 1);
        let reason = self
            .unavailable_reason()
            .unwrap_or_else(|| "unknown reason".to_string());
        if self.config.engine.disabled {
            tracing::debug!("using the fallback engine: {}", reason);
        } else {
            tracing::warn!("native engine unavailable, using the fallback engine: {}", reason);
        }
    }

    /// How many fallback notices this runtime has logged (never more than one).
    pub fn fallback_notices(&self) -> usize {
        self.notices.get()
    }

    /// Most recent failed engine call on the live session.
    pub fn last_engine_error(&self) -> Option<String> {
        self.last_engine_error.borrow().clone()
    }

    pub fn backend_status(&self) -> BackendStatus {
        let status = self.status();
        BackendStatus {
            engine_available: self.is_available(),
            engine_loaded: status.loaded,
            load_error: status.error.clone(),
            last_engine_error: self.last_engine_error(),
            engine_path: status.path.clone(),
            engine_version: status.version.clone(),
        }
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("status", &self.status.get())
            .field("session", &self.session.try_borrow().ok())
            .finish()
    }
}
