//! Positional argument definitions.

use serde::{Deserialize, Serialize};

use super::errors::DefinitionError;

/// A positional parameter.
///
/// Written as `<name>` (required), `[name]` (optional), or a bare `name`
/// (required). A trailing `...` makes it variadic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub variadic: bool,
}

impl Argument {
    /// Parse an argument token such as `<file>` or `[files...]`.
    pub fn parse(token: &str, description: impl Into<String>) -> Result<Self, DefinitionError> {
        let token = token.trim();
        let (inner, required) = if token.len() >= 2 && token.starts_with('<') && token.ends_with('>')
        {
            (&token[1..token.len() - 1], true)
        } else if token.len() >= 2 && token.starts_with('[') && token.ends_with(']') {
            (&token[1..token.len() - 1], false)
        } else {
            (token, true)
        };

        let (name, variadic) = match inner.strip_suffix("...") {
            Some(stripped) => (stripped.trim(), true),
            None => (inner.trim(), false),
        };

        if name.is_empty() {
            return Err(DefinitionError::EmptyArgument);
        }

        Ok(Argument {
            name: name.to_string(),
            description: description.into(),
            required,
            variadic,
        })
    }

    /// Override the required flag inferred from the brackets.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Render back to bracket notation, e.g. `[files...]`.
    pub fn token(&self) -> String {
        let dots = if self.variadic { "..." } else { "" };
        if self.required {
            format!("<{}{}>", self.name, dots)
        } else {
            format!("[{}{}]", self.name, dots)
        }
    }
}
