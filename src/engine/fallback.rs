//! In-process fallback engine.
//!
//! Mirrors the native engine's operations directly on a [`CommandDef`]: no
//! handles, no calls out of process. The mock engine used in tests drives
//! the same scanner, so both engines agree on every parse.
//!
//! Scanning rules, left to right:
//!
//! - `--name=value` sets `name` to `value`.
//! - `--name` consumes the next token when the option takes a value,
//!   otherwise sets `true`.
//! - `-x` for a registered short flag behaves like its long form.
//! - Anything else is positional, and once one positional token has been
//!   seen every later token is positional too, even `--flag`. This greedy
//!   capture differs from getopt on purpose.
//!
//! After scanning, an option that was not given takes its environment
//! variable's value if that is set, and its default otherwise.

use crate::core::{
    Argument, CommandDef, DefinitionError, OptionDef, OptionValue, ParsedOutcome, ValueArity,
};
use crate::help::{self, HelpView};

pub fn add_option(
    def: &mut CommandDef,
    flags: &str,
    description: &str,
    default: Option<OptionValue>,
) -> Result<(), DefinitionError> {
    let option = OptionDef::new(flags, description, default)?;
    def.add_option(option)
}

pub fn add_argument(
    def: &mut CommandDef,
    token: &str,
    description: &str,
    required: Option<bool>,
) -> Result<(), DefinitionError> {
    let mut argument = Argument::parse(token, description)?;
    if let Some(required) = required {
        argument = argument.with_required(required);
    }
    def.add_argument(argument)
}

pub fn hide_option(def: &mut CommandDef, key: &str, hidden: bool) -> Result<(), DefinitionError> {
    def.option_mut(key)?.hidden = hidden;
    Ok(())
}

pub fn set_option_env(def: &mut CommandDef, key: &str, var: &str) -> Result<(), DefinitionError> {
    def.option_mut(key)?.env = Some(var.to_string());
    Ok(())
}

/// Scan `tokens` (the argv tail after the command name) against `def`.
pub fn parse_args(def: &CommandDef, tokens: &[String]) -> ParsedOutcome {
    parse_args_with_env(def, tokens, |name| std::env::var(name).ok())
}

/// [`parse_args`] with environment variables read through `lookup`.
pub fn parse_args_with_env(
    def: &CommandDef,
    tokens: &[String],
    lookup: impl Fn(&str) -> Option<String>,
) -> ParsedOutcome {
    let mut outcome = ParsedOutcome {
        command: def.name.clone(),
        ..Default::default()
    };

    let mut positional = false;
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        i += 1;

        if positional || !token.starts_with('-') || token == "-" {
            outcome.arguments.push(token.to_string());
            positional = true;
            continue;
        }

        if token == "--" {
            positional = true;
            continue;
        }

        if is_help(def, token) {
            outcome.help = true;
            return outcome;
        }

        if let Some(version) = version_request(def, token) {
            outcome.version = Some(version);
            return outcome;
        }

        if let Some(body) = token.strip_prefix("--") {
            let (name, inline) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (body, None),
            };

            match def.find_long(name) {
                Some(option) => {
                    let value = take_value(option, token, inline, tokens, &mut i, &mut outcome);
                    if let Some(value) = value {
                        outcome.options.insert(option.key(), value);
                    }
                }
                None if def.allow_unknown => {
                    let value = inline
                        .map(OptionValue::from)
                        .unwrap_or(OptionValue::Bool(true));
                    outcome.options.insert(name.to_string(), value);
                }
                None => outcome.errors.push(format!("unknown option '--{}'", name)),
            }
            continue;
        }

        match def.find_short(token) {
            Some(option) => {
                let value = take_value(option, token, None, tokens, &mut i, &mut outcome);
                if let Some(value) = value {
                    outcome.options.insert(option.key(), value);
                }
            }
            None => {
                outcome.arguments.push(token.to_string());
                positional = true;
            }
        }
    }

    if outcome.arguments.len() < def.required_arguments() {
        outcome.errors.push("missing required arguments".to_string());
    }

    for (key, option) in &def.options {
        if outcome.options.contains_key(key) {
            continue;
        }
        let fallback = option.env_value(&lookup).or_else(|| option.default.clone());
        if let Some(value) = fallback {
            outcome.options.insert(key.clone(), value);
        }
    }

    outcome
}

fn take_value(
    option: &OptionDef,
    token: &str,
    inline: Option<&str>,
    tokens: &[String],
    i: &mut usize,
    outcome: &mut ParsedOutcome,
) -> Option<OptionValue> {
    if let Some(value) = inline {
        return Some(OptionValue::from(value));
    }
    match option.flags.arity {
        ValueArity::None => Some(OptionValue::Bool(true)),
        ValueArity::Required | ValueArity::Optional if *i < tokens.len() => {
            let value = tokens[*i].clone();
            *i += 1;
            Some(OptionValue::Str(value))
        }
        ValueArity::Required => {
            outcome
                .errors
                .push(format!("option '{}' missing argument", token));
            None
        }
        ValueArity::Optional => Some(OptionValue::Bool(true)),
    }
}

/// `-h` / `--help`, unless the command defines its own option with that flag.
fn is_help(def: &CommandDef, token: &str) -> bool {
    match token {
        "--help" => def.find_long("help").is_none(),
        "-h" => def.find_short("-h").is_none(),
        _ => false,
    }
}

/// `-V` / `--version` on a versioned command without its own such option.
fn version_request(def: &CommandDef, token: &str) -> Option<String> {
    let claimed = match token {
        "--version" => def.find_long("version").is_some(),
        "-V" => def.find_short("-V").is_some(),
        _ => return None,
    };
    if claimed {
        None
    } else {
        def.version.clone()
    }
}

/// Render help for `def`.
pub fn get_help(def: &CommandDef, qualified_name: &str, subcommands: &[(String, String)]) -> String {
    help::render(&HelpView {
        qualified_name,
        def,
        subcommands,
    })
}
