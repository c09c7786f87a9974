//! Native engine capability probe.
//!
//! Key principle: probing never fails. Every problem (missing executable,
//! spawn error, a liveness call that errors or answers with the wrong
//! shape, an incompatible version) becomes `available = false` plus a
//! message, and the caller carries on with the fallback engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::native::NativeAdapter;
use super::transport::{EngineTransport, ProcessTransport};
use crate::util::config::EngineConfig;

/// Executable name of the native engine.
pub const ENGINE_EXECUTABLE: &str = if cfg!(windows) {
    "commandeer-engine.exe"
} else {
    "commandeer-engine"
};

/// Engine versions this library can drive.
pub const SUPPORTED_ENGINE_VERSION: &str = "^1";

/// Why a single candidate could not be loaded.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no engine at {0}")]
    NotFound(PathBuf),

    #[error("failed to start engine at {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Locates and connects to native engine candidates.
pub trait EngineLoader {
    /// Candidate locations, in the order they should be tried.
    fn candidates(&self) -> Vec<PathBuf>;

    /// Connect to the engine at `path`.
    fn load(&self, path: &Path) -> Result<Box<dyn EngineTransport>, ProbeError>;

    /// A reason the engine must not be used at all, if any.
    fn disabled_reason(&self) -> Option<String> {
        None
    }
}

/// Loader that runs the engine as a child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessLoader {
    config: EngineConfig,
}

impl ProcessLoader {
    pub fn new(config: EngineConfig) -> Self {
        ProcessLoader { config }
    }
}

impl EngineLoader for ProcessLoader {
    /// Configured path, `search_paths`, the current executable's directory,
    /// `./`, `./bin/`, `./target/{release,debug}/`, then `PATH`.
    ///
    /// Reads from the engine have no deadline. Any executable found here
    /// that starts but never answers `hello` blocks the probe, and with it
    /// the first `Command::new`. Pin `engine.path` or set `engine.disabled`
    /// where stray binaries are possible.
    fn candidates(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(path) = &self.config.path {
            paths.push(path.clone());
        }
        for dir in &self.config.search_paths {
            paths.push(dir.join(ENGINE_EXECUTABLE));
        }
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            paths.push(dir.join(ENGINE_EXECUTABLE));
        }
        for dir in [".", "bin", "target/release", "target/debug"] {
            paths.push(Path::new(dir).join(ENGINE_EXECUTABLE));
        }
        if let Ok(path) = which::which(ENGINE_EXECUTABLE) {
            paths.push(path);
        }

        let mut seen = std::collections::HashSet::new();
        paths.retain(|p| seen.insert(p.clone()));
        paths
    }

    fn load(&self, path: &Path) -> Result<Box<dyn EngineTransport>, ProbeError> {
        if !path.is_file() {
            return Err(ProbeError::NotFound(path.to_path_buf()));
        }
        let transport = ProcessTransport::spawn(path, &self.config.args).map_err(|source| {
            ProbeError::Spawn {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(Box::new(transport))
    }

    fn disabled_reason(&self) -> Option<String> {
        if self.config.disabled {
            Some("native engine disabled by configuration".to_string())
        } else {
            None
        }
    }
}

/// One candidate that was tried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeAttempt {
    pub path: PathBuf,
    pub error: Option<String>,
}

/// What the probe found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// A loaded engine answered the liveness checks
    pub available: bool,
    /// Some candidate was loaded, even if it then failed liveness
    pub loaded: bool,
    /// Why the engine is unavailable
    pub error: Option<String>,
    /// Location of the engine in use
    pub path: Option<PathBuf>,
    /// Version the engine reported
    pub version: Option<String>,
    /// Every candidate tried, in order
    pub attempts: Vec<ProbeAttempt>,
}

/// Try each candidate until one loads and passes the liveness checks.
///
/// Returns the outcome and, on success, the connected adapter.
pub fn probe(loader: &dyn EngineLoader) -> (ProbeOutcome, Option<NativeAdapter>) {
    let mut outcome = ProbeOutcome::default();

    if let Some(reason) = loader.disabled_reason() {
        tracing::debug!("{}", reason);
        outcome.error = Some(reason);
        return (outcome, None);
    }

    let candidates = loader.candidates();
    if candidates.is_empty() {
        outcome.error = Some("no candidate engine locations".to_string());
        return (outcome, None);
    }

    let mut failures = Vec::new();
    for path in candidates {
        let transport = match loader.load(&path) {
            Ok(transport) => transport,
            Err(err) => {
                tracing::trace!("engine candidate {} rejected: {}", path.display(), err);
                failures.push(err.to_string());
                outcome.attempts.push(ProbeAttempt {
                    path,
                    error: Some(err.to_string()),
                });
                continue;
            }
        };

        outcome.loaded = true;
        let mut adapter = NativeAdapter::new(transport);
        match check_liveness(&mut adapter) {
            Ok(version) => {
                tracing::info!("native engine {} ready at {}", version, path.display());
                outcome.available = true;
                outcome.error = None;
                outcome.version = Some(version);
                outcome.path = Some(path.clone());
                outcome.attempts.push(ProbeAttempt { path, error: None });
                return (outcome, Some(adapter));
            }
            Err(message) => {
                tracing::debug!("engine at {} failed liveness: {}", path.display(), message);
                failures.push(format!("{}: {}", path.display(), message));
                outcome.attempts.push(ProbeAttempt {
                    path,
                    error: Some(message),
                });
            }
        }
    }

    outcome.error = Some(format!(
        "failed to load native engine from any location: {}",
        failures.join("; ")
    ));
    (outcome, None)
}

fn check_liveness(adapter: &mut NativeAdapter) -> Result<String, String> {
    let greeting = adapter.hello().map_err(|e| e.to_string())?;
    if greeting.trim().is_empty() {
        return Err("hello returned an empty greeting".to_string());
    }

    let raw = adapter.version().map_err(|e| e.to_string())?;
    let version = semver::Version::parse(raw.trim())
        .map_err(|e| format!("engine version `{}` is not semver: {}", raw, e))?;
    let req = semver::VersionReq::parse(SUPPORTED_ENGINE_VERSION)
        .map_err(|e| e.to_string())?;
    if !req.matches(&version) {
        return Err(format!(
            "engine version {} found, but {} required",
            version, req
        ));
    }
    Ok(version.to_string())
}
