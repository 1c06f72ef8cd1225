use std::fmt;

use serde::Serialize;

use crate::token::is_numeric_like;

/// A parsed argument value.
#[derive(Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Value>),
}

impl Value {
    /// Interprets a raw token.
    ///
    /// Surrounding quotes are dropped, then the rest is read as a number,
    /// a boolean, or a bracketed array literal, falling back to the string
    /// itself. Coercing an already coerced value changes nothing.
    pub fn coerce(token: &str) -> Value {
        let token = token.trim_matches('"');
        if is_numeric_like(token) {
            if let Ok(n) = token.trim().parse::<f64>() {
                return Value::Number(n);
            }
        }
        match token {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => (),
        }
        if token.starts_with('[') && token.ends_with(']') {
            if let Some(items) = array_literal(token) {
                return Value::Array(items);
            }
        }
        Value::Str(token.to_string())
    }

    /// [`Value::coerce`] lifted to values: only strings are reinterpreted.
    pub fn recoerce(self) -> Value {
        match self {
            Value::Str(s) => Value::coerce(&s),
            it => it,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(it) => Some(it),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(it) => Some(*it),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(it) => Some(*it),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(it) => Some(it),
            _ => None,
        }
    }
}

fn array_literal(token: &str) -> Option<Vec<Value>> {
    let json: serde_json::Value = serde_json::from_str(token).ok()?;
    match json {
        serde_json::Value::Array(items) => items.into_iter().map(from_json).collect(),
        _ => None,
    }
}

fn from_json(json: serde_json::Value) -> Option<Value> {
    let res = match json {
        serde_json::Value::Bool(it) => Value::Bool(it),
        serde_json::Value::Number(it) => Value::Number(it.as_f64()?),
        serde_json::Value::String(it) => Value::Str(it),
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(from_json).collect::<Option<_>>()?)
        }
        serde_json::Value::Null | serde_json::Value::Object(_) => return None,
    };
    Some(res)
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(it) => fmt::Debug::fmt(it, f),
            Value::Number(it) => fmt::Display::fmt(it, f),
            Value::Str(it) => fmt::Debug::fmt(it, f),
            Value::Array(items) => f.debug_list().entries(items).finish(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(it) => fmt::Display::fmt(it, f),
            Value::Number(it) => fmt::Display::fmt(it, f),
            Value::Str(it) => fmt::Display::fmt(it, f),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    fmt::Display::fmt(item, f)?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(it: bool) -> Value {
        Value::Bool(it)
    }
}

impl From<f64> for Value {
    fn from(it: f64) -> Value {
        Value::Number(it)
    }
}

impl From<i32> for Value {
    fn from(it: i32) -> Value {
        Value::Number(it.into())
    }
}

impl From<u32> for Value {
    fn from(it: u32) -> Value {
        Value::Number(it.into())
    }
}

impl From<&str> for Value {
    fn from(it: &str) -> Value {
        Value::Str(it.to_string())
    }
}

impl From<String> for Value {
    fn from(it: String) -> Value {
        Value::Str(it)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Value {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}
