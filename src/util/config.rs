//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.commandeer/config.toml` - User-wide defaults
//! - Project: `.commandeer/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and the
//! `COMMANDEER_ENGINE` / `COMMANDEER_FORCE_FALLBACK` environment variables
//! take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming the engine executable.
pub const ENGINE_ENV: &str = "COMMANDEER_ENGINE";

/// Environment variable that disables the native engine when truthy.
pub const FORCE_FALLBACK_ENV: &str = "COMMANDEER_FORCE_FALLBACK";

/// Library configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Native engine settings
    pub engine: EngineConfig,

    /// Parsing behavior
    pub parse: ParseConfig,
}

/// Native engine settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Explicit engine executable, tried first
    pub path: Option<PathBuf>,

    /// Extra arguments passed to the engine executable
    pub args: Vec<String>,

    /// Directories searched for the engine executable
    pub search_paths: Vec<PathBuf>,

    /// Never use the native engine
    pub disabled: bool,
}

/// Parsing behavior.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Refuse to dispatch when scanning reports errors
    pub strict: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.engine.path.is_some() {
            self.engine.path = other.engine.path;
        }
        if !other.engine.args.is_empty() {
            self.engine.args = other.engine.args;
        }
        if !other.engine.search_paths.is_empty() {
            self.engine.search_paths = other.engine.search_paths;
        }
        if other.engine.disabled {
            self.engine.disabled = true;
        }
        if other.parse.strict {
            self.parse.strict = true;
        }
    }

    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENGINE_ENV).filter(|p| !p.trim().is_empty()) {
            self.engine.path = Some(PathBuf::from(path));
        }
        if let Some(flag) = lookup(FORCE_FALLBACK_ENV) {
            if is_truthy(&flag) {
                self.engine.disabled = true;
            }
        }
    }

    /// Config with defaults, global and project files, and the process environment.
    pub fn from_env() -> Self {
        let project = std::env::current_dir()
            .map(|dir| project_config_path(&dir))
            .unwrap_or_else(|_| PathBuf::from(".commandeer/config.toml"));
        let mut config = match global_config_path() {
            Some(global) => load_config(&global, &project),
            None => load_config(Path::new(""), &project),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.commandeer/config.toml)
/// 2. Global config (~/.commandeer/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.is_file() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.is_file() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global config directory (~/.commandeer).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".commandeer"))
}

/// Get the global config path (~/.commandeer/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.commandeer/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".commandeer").join("config.toml")
}
