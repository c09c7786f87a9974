//! Result of scanning a command's tokens.

use serde::{Deserialize, Serialize};

use super::value::OptionMap;

/// What one engine produced from a command's argv tail.
///
/// This is also the payload the native engine returns from `parseArgs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedOutcome {
    /// Name of the command that was parsed
    pub command: String,
    /// Options keyed by canonical name, defaults applied
    pub options: OptionMap,
    /// Positional arguments in order
    pub arguments: Vec<String>,
    /// Problems found while scanning (unknown options, missing values, ...)
    pub errors: Vec<String>,
    /// `-h` / `--help` was seen
    pub help: bool,
    /// `-V` / `--version` was seen on a versioned command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ParsedOutcome {
    /// Whether scanning found no problems.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
