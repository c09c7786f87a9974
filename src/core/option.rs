//! Option definitions and the flag-spec grammar.
//!
//! A flag spec is the human-written string passed to `Command::option`, such
//! as `"-p, --port <number>"`. Tokens are separated by commas, pipes, or
//! whitespace and must each be one of:
//!
//! - a short flag: `-p`
//! - a long flag: `--port`
//! - a required value placeholder: `<number>`
//! - an optional value placeholder: `[number]`
//!
//! Anything else is rejected rather than turned into a garbage key.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::DefinitionError;
use super::value::OptionValue;

static SHORT_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-([A-Za-z0-9])$").expect("valid regex"));
static LONG_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--([A-Za-z0-9][A-Za-z0-9_-]*)$").expect("valid regex"));
static REQUIRED_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([^<>\[\]]+)>$").expect("valid regex"));
static OPTIONAL_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^<>\[\]]+)\]$").expect("valid regex"));
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,|\s]+").expect("valid regex"));

/// Whether an option consumes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueArity {
    /// Boolean switch
    None,
    /// `<value>` must follow
    Required,
    /// `[value]` may follow
    Optional,
}

/// A validated flag spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    /// The spec exactly as written
    pub raw: String,
    /// Short flag letter, without the dash
    pub short: Option<char>,
    /// Long flag name, without the dashes
    pub long: Option<String>,
    /// Value arity
    pub arity: ValueArity,
    /// Placeholder name ends in `...`
    pub variadic: bool,
}

impl Flags {
    /// Parse a flag spec.
    pub fn parse(spec: &str) -> Result<Self, DefinitionError> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(DefinitionError::EmptyFlags);
        }

        let mut flags = Flags {
            raw: trimmed.to_string(),
            short: None,
            long: None,
            arity: ValueArity::None,
            variadic: false,
        };

        for token in SEPARATOR.split(trimmed).filter(|t| !t.is_empty()) {
            if let Some(caps) = LONG_FLAG.captures(token) {
                if flags.long.is_some() {
                    return Err(DefinitionError::DuplicateFlag {
                        spec: flags.raw,
                        kind: "long",
                    });
                }
                flags.long = Some(caps[1].to_string());
            } else if let Some(caps) = SHORT_FLAG.captures(token) {
                if flags.short.is_some() {
                    return Err(DefinitionError::DuplicateFlag {
                        spec: flags.raw,
                        kind: "short",
                    });
                }
                flags.short = caps[1].chars().next();
            } else if let Some(caps) = REQUIRED_VALUE.captures(token) {
                flags.arity = ValueArity::Required;
                flags.variadic = caps[1].ends_with("...");
            } else if let Some(caps) = OPTIONAL_VALUE.captures(token) {
                flags.arity = ValueArity::Optional;
                flags.variadic = caps[1].ends_with("...");
            } else {
                return Err(DefinitionError::UnrecognizedToken {
                    spec: flags.raw,
                    token: token.to_string(),
                });
            }
        }

        if flags.short.is_none() && flags.long.is_none() {
            return Err(DefinitionError::NoFlag(flags.raw));
        }

        Ok(flags)
    }

    /// Canonical lookup key: the long name, else the short letter.
    pub fn key(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => long.clone(),
            (None, Some(short)) => short.to_string(),
            (None, None) => String::new(),
        }
    }

    /// Whether the option consumes a value.
    pub fn takes_value(&self) -> bool {
        self.arity != ValueArity::None
    }

    /// Whether `token` (e.g. `-p`) is this option's short flag.
    pub fn matches_short(&self, token: &str) -> bool {
        let mut chars = token.chars();
        match (chars.next(), chars.next(), chars.next(), self.short) {
            (Some('-'), Some(c), None, Some(short)) => c == short,
            _ => false,
        }
    }

    /// Whether `name` (without dashes) is this option's long flag.
    pub fn matches_long(&self, name: &str) -> bool {
        self.long.as_deref() == Some(name)
    }
}

/// An option owned by a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDef {
    pub flags: Flags,
    pub description: String,
    pub default: Option<OptionValue>,
    /// Left out of help output
    #[serde(default)]
    pub hidden: bool,
    /// Environment variable read when the flag is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

impl OptionDef {
    /// Build an option from a raw flag spec.
    pub fn new(
        spec: &str,
        description: impl Into<String>,
        default: Option<OptionValue>,
    ) -> Result<Self, DefinitionError> {
        Ok(OptionDef {
            flags: Flags::parse(spec)?,
            description: description.into(),
            default,
            hidden: false,
            env: None,
        })
    }

    /// Canonical key in the owning command's option set.
    pub fn key(&self) -> String {
        self.flags.key()
    }

    /// Value taken from the environment variable, if one is set.
    ///
    /// Boolean switches read `1`/`true`/`yes`/`on` as `true` and anything
    /// else as `false`.
    pub fn env_value(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<OptionValue> {
        let raw = lookup(self.env.as_deref()?)?;
        if raw.is_empty() {
            return None;
        }
        Some(match self.flags.arity {
            ValueArity::None => OptionValue::Bool(matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )),
            ValueArity::Required | ValueArity::Optional => OptionValue::Str(raw),
        })
    }
}
