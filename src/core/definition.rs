//! Engine-independent command data.
//!
//! `CommandDef` is the part of a command that both engines understand:
//! identity, descriptive text, options, and arguments. Tree structure,
//! actions, and engine binding live on `Command`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::argument::Argument;
use super::errors::DefinitionError;
use super::option::OptionDef;

/// The data a single command node carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandDef {
    pub name: String,
    pub description: String,
    pub version: Option<String>,
    pub options: IndexMap<String, OptionDef>,
    pub arguments: Vec<Argument>,
    pub allow_unknown: bool,
}

impl CommandDef {
    /// Create an empty definition.
    pub fn new(name: impl Into<String>) -> Self {
        CommandDef {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an option, rejecting a second option with the same key.
    pub fn add_option(&mut self, option: OptionDef) -> Result<(), DefinitionError> {
        let key = option.key();
        if self.options.contains_key(&key) {
            return Err(DefinitionError::DuplicateOption {
                command: self.name.clone(),
                key,
            });
        }
        for existing in self.options.values() {
            if existing.flags.short.is_some() && existing.flags.short == option.flags.short {
                tracing::warn!(
                    "conflicting short flag '-{}' on `{}`",
                    existing.flags.short.unwrap_or_default(),
                    self.name
                );
            }
        }
        self.options.insert(key, option);
        Ok(())
    }

    /// Append an argument, keeping any variadic argument last.
    pub fn add_argument(&mut self, argument: Argument) -> Result<(), DefinitionError> {
        if let Some(last) = self.arguments.last() {
            if last.variadic {
                return Err(DefinitionError::ArgumentAfterVariadic {
                    name: argument.name,
                    variadic: last.name.clone(),
                });
            }
        }
        self.arguments.push(argument);
        Ok(())
    }

    /// Find an option by its short flag token (e.g. `-p`).
    pub fn find_short(&self, token: &str) -> Option<&OptionDef> {
        self.options.values().find(|o| o.flags.matches_short(token))
    }

    /// Find an option by its long name (without dashes).
    pub fn find_long(&self, name: &str) -> Option<&OptionDef> {
        self.options.values().find(|o| o.flags.matches_long(name))
    }

    /// Option by canonical key, for adjusting it after it was added.
    pub fn option_mut(&mut self, key: &str) -> Result<&mut OptionDef, DefinitionError> {
        let command = &self.name;
        self.options
            .get_mut(key)
            .ok_or_else(|| DefinitionError::UnknownOption {
                command: command.clone(),
                key: key.to_string(),
            })
    }

    /// Number of arguments that must be supplied.
    pub fn required_arguments(&self) -> usize {
        self.arguments.iter().filter(|a| a.required).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_rejected() {
        let mut def = CommandDef::new("serve");
        def.add_option(OptionDef::new("-p, --port <n>", "", None).unwrap())
            .unwrap();
        let err = def
            .add_option(OptionDef::new("--port", "", None).unwrap())
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateOption { .. }));
        assert_eq!(def.options.len(), 1);
    }

    #[test]
    fn test_variadic_must_be_last() {
        let mut def = CommandDef::new("calc");
        def.add_argument(Argument::parse("<numbers...>", "").unwrap())
            .unwrap();
        let err = def
            .add_argument(Argument::parse("<extra>", "").unwrap())
            .unwrap_err();
        assert!(matches!(err, DefinitionError::ArgumentAfterVariadic { .. }));
    }

    #[test]
    fn test_lookup_and_required_count() {
        let mut def = CommandDef::new("cp");
        def.add_option(OptionDef::new("-f, --force", "", None).unwrap())
            .unwrap();
        def.add_argument(Argument::parse("<src>", "").unwrap()).unwrap();
        def.add_argument(Argument::parse("[dst]", "").unwrap()).unwrap();

        assert!(def.find_short("-f").is_some());
        assert!(def.find_long("force").is_some());
        assert!(def.find_long("f").is_none());
        assert_eq!(def.required_arguments(), 1);
    }
}
