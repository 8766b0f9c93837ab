//! Tree-mode template expansion
//!
//! A JSON template is walked recursively. Strings wrapped in backticks are
//! expressions; everything else is copied. Object keys may be expressions
//! too, producing zero, one or many output keys. Lists support two extra
//! forms:
//!
//! - an object holding `__unpack__` expands into one element per scope
//!   fragment, either by evaluating its `__value__` or by expanding the
//!   remaining fields;
//! - a list whose first surviving element is `joinStr(sep)` collapses into
//!   the text of the other elements joined with `sep`.
//!
//! An expression evaluating to `noValue` removes the surrounding key or
//! list element; at the top level it omits the whole document.

use serde_json::{Map, Value as JsonValue};

use super::expr::{self, Object, Scope, Value};
use crate::error::{Error, Result};

/// Directive key that fans a list element out over scope fragments
pub const UNPACK_KEY: &str = "__unpack__";

/// Value template evaluated once per fragment of an `__unpack__` directive
pub const VALUE_KEY: &str = "__value__";

/// Result of expanding one template node before join reduction
enum Expanded {
    Json(JsonValue),
    Join(String),
}

/// Whether a string is a backtick-delimited expression
pub fn is_expression(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('`') && text.ends_with('`')
}

fn expression_body(text: &str) -> &str {
    &text[1..text.len() - 1]
}

/// Expand a JSON template.
///
/// Returns `None` when the whole document evaluated to `noValue`.
pub fn expand(template: &JsonValue, scope: &Scope) -> Result<Option<JsonValue>> {
    match expand_node(template, scope)? {
        None => Ok(None),
        Some(Expanded::Json(value)) => Ok(Some(value)),
        Some(Expanded::Join(_)) => Err(template_error(
            "joinStr() can only be used as the first element of a list",
        )),
    }
}

fn expand_node(template: &JsonValue, scope: &Scope) -> Result<Option<Expanded>> {
    match template {
        JsonValue::String(text) if is_expression(text) => {
            let value = expr::evaluate(expression_body(text), scope)?;
            from_expression(value)
        }
        JsonValue::Array(items) => expand_list(items, scope).map(Some),
        JsonValue::Object(map) => {
            let expanded = expand_object(map, scope)?;
            Ok(Some(Expanded::Json(JsonValue::Object(expanded))))
        }
        other => Ok(Some(Expanded::Json(other.clone()))),
    }
}

fn from_expression(value: Value) -> Result<Option<Expanded>> {
    match value {
        Value::NoValue => Ok(None),
        Value::JoinSeparator(separator) => Ok(Some(Expanded::Join(separator))),
        other => {
            let json = other.to_json().map_err(|message| Error::Template { message })?;
            Ok(json.map(Expanded::Json))
        }
    }
}

fn expand_object(map: &Map<String, JsonValue>, scope: &Scope) -> Result<Map<String, JsonValue>> {
    let mut out = Map::new();

    for (key, template) in map {
        if !is_expression(key) {
            insert_expanded(&mut out, key.clone(), template, scope)?;
            continue;
        }

        match expr::evaluate(expression_body(key), scope)? {
            Value::NoValue => {}
            Value::String(name) => insert_expanded(&mut out, name, template, scope)?,
            Value::Key(dynamic) => {
                let key_scope = scope.overlay(&dynamic.scope);
                insert_expanded(&mut out, dynamic.identifier, template, &key_scope)?;
            }
            Value::List(keys) if keys.iter().all(|k| matches!(k, Value::Key(_))) => {
                for key in keys {
                    if let Value::Key(dynamic) = key {
                        let key_scope = scope.overlay(&dynamic.scope);
                        insert_expanded(&mut out, dynamic.identifier, template, &key_scope)?;
                    }
                }
            }
            Value::List(keys) if keys.iter().all(|k| matches!(k, Value::String(_))) => {
                for key in keys {
                    if let Value::String(name) = key {
                        insert_expanded(&mut out, name, template, scope)?;
                    }
                }
            }
            Value::List(_) => {
                return Err(template_error(
                    "Array keys must contain only dynamic keys or strings",
                ))
            }
            other => {
                return Err(template_error(format!(
                    "Object keys must be strings, got {}",
                    other.type_name()
                )))
            }
        }
    }

    Ok(out)
}

fn insert_expanded(
    out: &mut Map<String, JsonValue>,
    key: String,
    template: &JsonValue,
    scope: &Scope,
) -> Result<()> {
    match expand_node(template, scope)? {
        None => {}
        Some(Expanded::Json(value)) => {
            out.insert(key, value);
        }
        Some(Expanded::Join(_)) => {
            return Err(template_error(format!(
                "joinStr() used as the value of key '{}'; it can only start a list",
                key
            )))
        }
    }
    Ok(())
}

fn expand_list(items: &[JsonValue], scope: &Scope) -> Result<Expanded> {
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        match item.as_object().filter(|m| m.contains_key(UNPACK_KEY)) {
            Some(directive) => expand_unpack(directive, scope, &mut out)?,
            None => {
                if let Some(expanded) = expand_node(item, scope)? {
                    out.push(expanded);
                }
            }
        }
    }

    reduce_list(out)
}

fn expand_unpack(
    directive: &Map<String, JsonValue>,
    scope: &Scope,
    out: &mut Vec<Expanded>,
) -> Result<()> {
    let Some(spec) = directive.get(UNPACK_KEY) else {
        return Ok(());
    };
    let fragments = unpack_fragments(spec, scope)?;

    let rest: Map<String, JsonValue> = directive
        .iter()
        .filter(|(k, _)| k.as_str() != UNPACK_KEY)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    for fragment in &fragments {
        let fragment_scope = scope.overlay(fragment);
        let expanded = match directive.get(VALUE_KEY) {
            Some(value_template) => expand_node(value_template, &fragment_scope)?,
            None => Some(Expanded::Json(JsonValue::Object(expand_object(
                &rest,
                &fragment_scope,
            )?))),
        };
        if let Some(expanded) = expanded {
            out.push(expanded);
        }
    }
    Ok(())
}

fn unpack_fragments(spec: &JsonValue, scope: &Scope) -> Result<Vec<Object>> {
    let items = match spec {
        JsonValue::String(text) if is_expression(text) => {
            match expr::evaluate(expression_body(text), scope)? {
                Value::List(items) => items,
                other => {
                    return Err(template_error(format!(
                        "__unpack__ must evaluate to a list, got {}",
                        other.type_name()
                    )))
                }
            }
        }
        JsonValue::Array(items) => items.iter().map(Value::from_json).collect(),
        other => {
            return Err(template_error(format!(
                "__unpack__ must be an expression or a list, got {}",
                json_type_name(other)
            )))
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(fragment) => Ok(fragment),
            other => Err(template_error(format!(
                "Each item in __unpack__ must be an object to use as scope, got {}",
                other.type_name()
            ))),
        })
        .collect()
}

/// Collapse a list that starts with a join separator into a string
fn reduce_list(items: Vec<Expanded>) -> Result<Expanded> {
    let mut items = items.into_iter();
    let first = match items.next() {
        None => return Ok(Expanded::Json(JsonValue::Array(Vec::new()))),
        Some(first) => first,
    };

    if let Expanded::Join(separator) = first {
        let parts = items.map(join_part).collect::<Result<Vec<_>>>()?;
        return Ok(Expanded::Json(JsonValue::String(parts.join(&separator))));
    }

    std::iter::once(first)
        .chain(items)
        .map(|item| match item {
            Expanded::Json(value) => Ok(value),
            Expanded::Join(_) => Err(template_error(
                "joinStr() can only be used as the first element of a list",
            )),
        })
        .collect::<Result<Vec<_>>>()
        .map(|values| Expanded::Json(JsonValue::Array(values)))
}

fn join_part(item: Expanded) -> Result<String> {
    match item {
        Expanded::Json(JsonValue::String(text)) => Ok(text),
        Expanded::Json(other) => Ok(other.to_string()),
        Expanded::Join(_) => Err(template_error(
            "joinStr() can only be used as the first element of a list",
        )),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}

fn template_error(message: impl Into<String>) -> Error {
    Error::Template {
        message: message.into(),
    }
}
