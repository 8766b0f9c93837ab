//! Runtime values of the expression language
//!
//! `Value` is a closed sum type: the JSON kinds plus the values that only
//! exist while a template is being expanded (`NoValue`, dynamic keys, join
//! separators and functions). Conversion back to JSON fails for the latter
//! three so they can never leak into an output file.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};

use super::parser::Expr;

/// Largest integer an `f64` represents exactly
pub(crate) const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A value produced by evaluating an expression
#[derive(Clone, Debug)]
pub enum Value {
    /// The "no value" sentinel; omitted from template output
    NoValue,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Object(Object),
    /// Result of `K(identifier, scope)`
    Key(DynamicKey),
    /// Result of `joinStr(separator)`
    JoinSeparator(String),
    Function(Function),
}

/// A map key together with extra scope for expanding its value
#[derive(Clone, Debug, PartialEq)]
pub struct DynamicKey {
    pub identifier: String,
    pub scope: Object,
}

/// Insertion-ordered string-keyed map
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object {
    entries: Vec<(String, Value)>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace, keeping the original position of an existing key
    pub fn insert(&mut self, key: String, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut object = Object::new();
        for (key, value) in iter {
            object.insert(key, value);
        }
        object
    }
}

/// Callable values
#[derive(Clone, Debug)]
pub enum Function {
    Builtin(Builtin),
    Lambda(Rc<Lambda>),
}

/// A lambda together with the scope it was created in
#[derive(Debug)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Rc<Expr>,
    pub captured: Scope,
}

/// Functions available to every expression
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    /// `K(identifier, scope?)`
    DynamicKey,
    /// `joinStr(separator)`
    JoinStr,
    Range,
    Str,
    Int,
    Len,
    Keys,
    Values,
    Entries,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        let builtin = match name {
            "K" => Builtin::DynamicKey,
            "joinStr" => Builtin::JoinStr,
            "range" => Builtin::Range,
            "str" => Builtin::Str,
            "int" => Builtin::Int,
            "len" => Builtin::Len,
            "keys" => Builtin::Keys,
            "values" => Builtin::Values,
            "entries" => Builtin::Entries,
            _ => return None,
        };
        Some(builtin)
    }
}

/// Variables visible to an expression
#[derive(Clone, Debug, Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every entry of a JSON object as a variable
    pub fn from_json(map: &JsonMap<String, JsonValue>) -> Self {
        let vars = map
            .iter()
            .map(|(name, value)| (name.clone(), Value::from_json(value)))
            .collect();
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// A copy of this scope with every entry of `fragment` bound over it
    pub fn overlay(&self, fragment: &Object) -> Scope {
        let mut scope = self.clone();
        for (name, value) in fragment.iter() {
            scope.set(name.clone(), value.clone());
        }
        scope
    }

    /// A copy of this scope with a JSON object bound over it
    pub fn overlay_json(&self, fragment: &JsonMap<String, JsonValue>) -> Scope {
        let mut scope = self.clone();
        for (name, value) in fragment {
            scope.set(name.clone(), Value::from_json(value));
        }
        scope
    }
}

impl Value {
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON. `NoValue` yields `None` and is dropped from lists and
    /// objects; template-only values are an error.
    pub fn to_json(&self) -> Result<Option<JsonValue>, String> {
        let json = match self {
            Value::NoValue => return Ok(None),
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => JsonValue::Number(number_to_json(*n)?),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(json) = item.to_json()? {
                        out.push(json);
                    }
                }
                JsonValue::Array(out)
            }
            Value::Object(object) => {
                let mut out = JsonMap::new();
                for (key, value) in object.iter() {
                    if let Some(json) = value.to_json()? {
                        out.insert(key.clone(), json);
                    }
                }
                JsonValue::Object(out)
            }
            Value::Key(_) | Value::JoinSeparator(_) | Value::Function(_) => {
                return Err(format!("a {} cannot be stored in JSON output", self.type_name()))
            }
        };
        Ok(Some(json))
    }

    /// Text form used by string concatenation, joins and text templates
    pub fn to_text(&self) -> Result<String, String> {
        match self {
            Value::NoValue => Ok(String::new()),
            Value::Null => Ok("null".to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Number(n) => Ok(format_number(*n)),
            Value::String(s) => Ok(s.clone()),
            Value::List(_) | Value::Object(_) => {
                let json = self.to_json()?.unwrap_or(JsonValue::Null);
                serde_json::to_string(&json).map_err(|e| e.to_string())
            }
            Value::Key(key) => Ok(key.identifier.clone()),
            Value::JoinSeparator(_) | Value::Function(_) => {
                Err(format!("a {} has no text form", self.type_name()))
            }
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::NoValue | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::NoValue => "noValue",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Key(_) => "dynamic key",
            Value::JoinSeparator(_) => "join separator",
            Value::Function(_) => "function",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::NoValue, Value::NoValue) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Key(a), Value::Key(b)) => a == b,
            (Value::JoinSeparator(a), Value::JoinSeparator(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "<{}>", self.type_name()),
        }
    }
}

/// Integral numbers print without a fraction
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn number_to_json(n: f64) -> Result<JsonNumber, String> {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Ok(JsonNumber::from(n as i64));
    }
    JsonNumber::from_f64(n).ok_or_else(|| format!("{} cannot be represented in JSON", n))
}
