//! Option values and the parsed-option map.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Parsed options keyed by canonical option name, in the order they were set.
pub type OptionMap = IndexMap<String, OptionValue>;

/// A primitive option value: a default, a parsed flag, or a parsed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl OptionValue {
    /// Borrow the value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a bool, if it is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as an integer, parsing strings when possible.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            OptionValue::Int(n) => Some(*n),
            OptionValue::Str(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Whether this value is a boolean `true`.
    pub fn is_true(&self) -> bool {
        matches!(self, OptionValue::Bool(true))
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Int(n) => write!(f, "{}", n),
            OptionValue::Float(x) => write!(f, "{}", x),
            OptionValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_json_shapes() {
        let values: Vec<OptionValue> =
            serde_json::from_str(r#"[true, 3000, 1.5, "3000"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                OptionValue::Bool(true),
                OptionValue::Int(3000),
                OptionValue::Float(1.5),
                OptionValue::Str("3000".into()),
            ]
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(OptionValue::from("8080").as_i64(), Some(8080));
        assert_eq!(OptionValue::from("x").as_i64(), None);
        assert!(OptionValue::from(true).is_true());
        assert_eq!(OptionValue::from(false).to_string(), "false");
    }
}
