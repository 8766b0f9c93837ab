//! Tree-walking evaluator
//!
//! Evaluation is pure: expressions only read their scope and can neither
//! touch the filesystem nor mutate values visible to other expressions.
//! `let` bindings live in a copy of the scope local to one block.

use std::cmp::Ordering;
use std::rc::Rc;

use super::parser::{BinaryOp, Expr, LogicalOp, Program, Stmt, UnaryOp};
use super::value::{Builtin, DynamicKey, Function, Lambda, Object, Scope, Value, MAX_SAFE_INTEGER};

type EvalResult = Result<Value, String>;

/// Upper bound on the length of a list built by `range`
const MAX_RANGE: f64 = 1_000_000.0;

pub fn eval(expr: &Expr, scope: &Scope) -> EvalResult {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Null => Ok(Value::Null),
        Expr::NoValue => Ok(Value::NoValue),
        Expr::Ident(name) => lookup(name, scope),
        Expr::List(items) => items
            .iter()
            .map(|item| eval(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Object(entries) => {
            let mut object = Object::new();
            for (key, value) in entries {
                object.insert(key.clone(), eval(value, scope)?);
            }
            Ok(Value::Object(object))
        }
        Expr::Unary(op, operand) => unary(*op, eval(operand, scope)?),
        Expr::Binary(op, left, right) => {
            let left = eval(left, scope)?;
            let right = eval(right, scope)?;
            binary(*op, left, right)
        }
        Expr::Logical(op, left, right) => {
            let left = eval(left, scope)?;
            let settled = match op {
                LogicalOp::And => !left.is_truthy(),
                LogicalOp::Or => left.is_truthy(),
                LogicalOp::Coalesce => !matches!(left, Value::NoValue | Value::Null),
            };
            if settled {
                Ok(left)
            } else {
                eval(right, scope)
            }
        }
        Expr::Conditional(condition, then, otherwise) => {
            if eval(condition, scope)?.is_truthy() {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
        Expr::Member(target, name) => member(eval(target, scope)?, name),
        Expr::Index(target, index) => {
            let target = eval(target, scope)?;
            let index = eval(index, scope)?;
            index_value(target, index)
        }
        Expr::Call(callee, args) => {
            if let Expr::Member(receiver, name) = callee.as_ref() {
                let receiver = eval(receiver, scope)?;
                let args = eval_all(args, scope)?;
                // a function stored on an object is called, not dispatched
                if let Value::Object(object) = &receiver {
                    if let Some(Value::Function(function)) = object.get(name) {
                        return call(function, args);
                    }
                }
                return call_method(receiver, name, args);
            }
            match eval(callee, scope)? {
                Value::Function(function) => call(&function, eval_all(args, scope)?),
                other => Err(format!("a {} is not callable", other.type_name())),
            }
        }
        Expr::Lambda(params, body) => Ok(Value::Function(Function::Lambda(Rc::new(Lambda {
            params: params.clone(),
            body: Rc::clone(body),
            captured: scope.clone(),
        })))),
    }
}

/// Run a statement sequence; it must end in `return`
pub fn exec(program: &Program, scope: &Scope) -> EvalResult {
    let mut local = scope.clone();
    for statement in &program.statements {
        match statement {
            Stmt::Let(name, value) => {
                let value = eval(value, &local)?;
                local.set(name.clone(), value);
            }
            Stmt::Return(value) => return eval(value, &local),
            Stmt::Expr(expr) => {
                eval(expr, &local)?;
            }
        }
    }
    Err("block has more than one statement but never returns a value".to_string())
}

pub fn call(function: &Function, args: Vec<Value>) -> EvalResult {
    match function {
        Function::Builtin(builtin) => call_builtin(*builtin, args),
        Function::Lambda(lambda) => {
            let mut scope = lambda.captured.clone();
            let mut args = args.into_iter();
            for param in &lambda.params {
                scope.set(param.clone(), args.next().unwrap_or(Value::NoValue));
            }
            eval(&lambda.body, &scope)
        }
    }
}

fn lookup(name: &str, scope: &Scope) -> EvalResult {
    if let Some(value) = scope.get(name) {
        return Ok(value.clone());
    }
    Builtin::from_name(name)
        .map(|builtin| Value::Function(Function::Builtin(builtin)))
        .ok_or_else(|| format!("'{}' is not defined", name))
}

fn eval_all(args: &[Expr], scope: &Scope) -> Result<Vec<Value>, String> {
    args.iter().map(|arg| eval(arg, scope)).collect()
}

fn nth(args: &[Value], n: usize) -> Value {
    args.get(n).cloned().unwrap_or(Value::NoValue)
}

fn string_arg(args: &[Value], n: usize, method: &str) -> Result<String, String> {
    match args.get(n) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!(
            "{}() expects a string argument, got {}",
            method,
            other.type_name()
        )),
        None => Err(format!("{}() is missing a string argument", method)),
    }
}

fn number_arg(args: &[Value], n: usize, method: &str) -> Result<f64, String> {
    match args.get(n) {
        Some(Value::Number(x)) => Ok(*x),
        Some(other) => Err(format!(
            "{}() expects a number argument, got {}",
            method,
            other.type_name()
        )),
        None => Err(format!("{}() is missing a number argument", method)),
    }
}

fn function_arg(args: &[Value], n: usize, method: &str) -> Result<Function, String> {
    match args.get(n) {
        Some(Value::Function(function)) => Ok(function.clone()),
        _ => Err(format!("{}() expects a function argument", method)),
    }
}

fn object_arg(args: &[Value], method: &str) -> Result<Object, String> {
    match args.first() {
        Some(Value::Object(object)) => Ok(object.clone()),
        Some(other) => Err(format!("{}() expects an object, got {}", method, other.type_name())),
        None => Err(format!("{}() is missing an object argument", method)),
    }
}

fn call_builtin(builtin: Builtin, args: Vec<Value>) -> EvalResult {
    match builtin {
        Builtin::DynamicKey => {
            let identifier = string_arg(&args, 0, "K")?;
            let scope = match args.get(1) {
                None | Some(Value::NoValue) => Object::new(),
                Some(Value::Object(object)) => object.clone(),
                Some(other) => {
                    return Err(format!("K() scope must be an object, got {}", other.type_name()))
                }
            };
            Ok(Value::Key(DynamicKey { identifier, scope }))
        }
        Builtin::JoinStr => string_arg(&args, 0, "joinStr").map(Value::JoinSeparator),
        Builtin::Range => {
            let (start, end) = if args.len() > 1 {
                (number_arg(&args, 0, "range")?, number_arg(&args, 1, "range")?)
            } else {
                (0.0, number_arg(&args, 0, "range")?)
            };
            let (start, end) = (start.trunc(), end.trunc());
            if start.abs() > MAX_SAFE_INTEGER || end.abs() > MAX_SAFE_INTEGER {
                return Err("range() bounds must be safe integers".to_string());
            }
            let count = (end - start).max(0.0);
            if count > MAX_RANGE {
                return Err(format!("range() of {} items is too large", count));
            }
            let items = (0..count as usize)
                .map(|i| Value::Number(start + i as f64))
                .collect();
            Ok(Value::List(items))
        }
        Builtin::Str => nth(&args, 0).to_text().map(Value::String),
        Builtin::Int => match nth(&args, 0) {
            Value::Number(n) => Ok(Value::Number(n.trunc())),
            Value::Bool(b) => Ok(Value::Number(if b { 1.0 } else { 0.0 })),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(|n| Value::Number(n.trunc()))
                .map_err(|_| format!("int() cannot convert '{}' to a number", s)),
            other => Err(format!("int() cannot convert a {}", other.type_name())),
        },
        Builtin::Len => length(&nth(&args, 0)).map(|n| Value::Number(n as f64)),
        Builtin::Keys => {
            let object = object_arg(&args, "keys")?;
            Ok(Value::List(
                object.iter().map(|(k, _)| Value::String(k.clone())).collect(),
            ))
        }
        Builtin::Values => {
            let object = object_arg(&args, "values")?;
            Ok(Value::List(object.iter().map(|(_, v)| v.clone()).collect()))
        }
        Builtin::Entries => {
            let object = object_arg(&args, "entries")?;
            Ok(Value::List(
                object
                    .iter()
                    .map(|(k, v)| Value::List(vec![Value::String(k.clone()), v.clone()]))
                    .collect(),
            ))
        }
    }
}

fn length(value: &Value) -> Result<usize, String> {
    match value {
        Value::String(s) => Ok(s.chars().count()),
        Value::List(items) => Ok(items.len()),
        Value::Object(object) => Ok(object.len()),
        other => Err(format!("a {} has no length", other.type_name())),
    }
}

fn member(target: Value, name: &str) -> EvalResult {
    match target {
        Value::Object(object) => Ok(object.get(name).cloned().unwrap_or(Value::NoValue)),
        Value::String(_) | Value::List(_) if name == "length" => {
            length(&target).map(|n| Value::Number(n as f64))
        }
        Value::Key(key) => Ok(match name {
            "identifier" => Value::String(key.identifier),
            "scope" => Value::Object(key.scope),
            _ => Value::NoValue,
        }),
        Value::NoValue | Value::Null => Err(format!(
            "cannot read property '{}' of {}",
            name,
            target.type_name()
        )),
        _ => Ok(Value::NoValue),
    }
}

fn index_value(target: Value, index: Value) -> EvalResult {
    match (&target, &index) {
        (Value::NoValue | Value::Null, _) => Err(format!("cannot index {}", target.type_name())),
        (Value::List(items), Value::Number(n)) => Ok(position(*n, items.len())
            .map(|i| items[i].clone())
            .unwrap_or(Value::NoValue)),
        (Value::String(s), Value::Number(n)) => Ok(position(*n, s.chars().count())
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::NoValue)),
        (_, Value::String(name)) => member(target.clone(), name),
        _ => Err(format!(
            "cannot index a {} with a {}",
            target.type_name(),
            index.type_name()
        )),
    }
}

fn position(n: f64, len: usize) -> Option<usize> {
    if n < 0.0 || n.fract() != 0.0 || n >= len as f64 {
        None
    } else {
        Some(n as usize)
    }
}

fn unary(op: UnaryOp, operand: Value) -> EvalResult {
    match (op, operand) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOp::Neg, other) => Err(format!("cannot negate a {}", other.type_name())),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> EvalResult {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
                return Err(format!(
                    "arithmetic needs numbers, got {} and {}",
                    left.type_name(),
                    right.type_name()
                ));
            };
            let (a, b) = (*a, *b);
            if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0.0 {
                return Err("division by zero".to_string());
            }
            Ok(Value::Number(match op {
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            }))
        }
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let Some(ordering) = compare(&left, &right)? else {
                return Ok(Value::Bool(false));
            };
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
    }
}

fn add(left: Value, right: Value) -> EvalResult {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (left, right) if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) => {
            let mut text = left.to_text()?;
            text.push_str(&right.to_text()?);
            Ok(Value::String(text))
        }
        (left, right) => Err(format!(
            "cannot add {} and {}",
            left.type_name(),
            right.type_name()
        )),
    }
}

/// `None` when either number is NaN
fn compare(left: &Value, right: &Value) -> Result<Option<Ordering>, String> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        _ => Err(format!(
            "cannot compare {} and {}",
            left.type_name(),
            right.type_name()
        )),
    }
}

fn call_method(receiver: Value, name: &str, args: Vec<Value>) -> EvalResult {
    match receiver {
        Value::String(s) => string_method(&s, name, &args),
        Value::List(items) => list_method(items, name, &args),
        other => Err(format!("a {} has no method '{}'", other.type_name(), name)),
    }
}

fn string_method(s: &str, name: &str, args: &[Value]) -> EvalResult {
    let value = match name {
        "upper" | "toUpperCase" => Value::String(s.to_uppercase()),
        "lower" | "toLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::String(s.trim().to_string()),
        "startsWith" => Value::Bool(s.starts_with(string_arg(args, 0, name)?.as_str())),
        "endsWith" => Value::Bool(s.ends_with(string_arg(args, 0, name)?.as_str())),
        "includes" => Value::Bool(s.contains(string_arg(args, 0, name)?.as_str())),
        "replace" | "replaceAll" => {
            let from = string_arg(args, 0, name)?;
            let to = string_arg(args, 1, name)?;
            if from.is_empty() {
                Value::String(s.to_string())
            } else {
                Value::String(s.replace(&from, &to))
            }
        }
        "split" => {
            let separator = string_arg(args, 0, name)?;
            let parts: Vec<Value> = if separator.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(separator.as_str())
                    .map(|part| Value::String(part.to_string()))
                    .collect()
            };
            Value::List(parts)
        }
        "padStart" | "padEnd" => {
            let width = number_arg(args, 0, name)?.max(0.0) as usize;
            let fill = match args.get(1) {
                None | Some(Value::NoValue) => " ".to_string(),
                Some(_) => string_arg(args, 1, name)?,
            };
            let current = s.chars().count();
            if width <= current || fill.is_empty() {
                Value::String(s.to_string())
            } else {
                let padding: String = fill.chars().cycle().take(width - current).collect();
                Value::String(if name == "padStart" {
                    padding + s
                } else {
                    format!("{}{}", s, padding)
                })
            }
        }
        _ => return Err(format!("a string has no method '{}'", name)),
    };
    Ok(value)
}

fn list_method(items: Vec<Value>, name: &str, args: &[Value]) -> EvalResult {
    let value = match name {
        "map" => {
            let function = function_arg(args, 0, name)?;
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                out.push(call(&function, vec![item, Value::Number(i as f64)])?);
            }
            Value::List(out)
        }
        "filter" => {
            let function = function_arg(args, 0, name)?;
            let mut out = Vec::new();
            for (i, item) in items.into_iter().enumerate() {
                if call(&function, vec![item.clone(), Value::Number(i as f64)])?.is_truthy() {
                    out.push(item);
                }
            }
            Value::List(out)
        }
        "join" => {
            let separator = match args.first() {
                None | Some(Value::NoValue) => ",".to_string(),
                Some(other) => other.to_text()?,
            };
            let parts = items
                .iter()
                .map(Value::to_text)
                .collect::<Result<Vec<_>, _>>()?;
            Value::String(parts.join(&separator))
        }
        "includes" => Value::Bool(items.contains(&nth(args, 0))),
        "indexOf" => {
            let needle = nth(args, 0);
            let index = items.iter().position(|item| *item == needle);
            Value::Number(index.map(|i| i as f64).unwrap_or(-1.0))
        }
        "concat" => {
            let mut out = items;
            for arg in args {
                match arg {
                    Value::List(more) => out.extend(more.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            Value::List(out)
        }
        "slice" => {
            let len = items.len();
            let start = slice_bound(args.first(), 0, len)?;
            let end = slice_bound(args.get(1), len, len)?;
            if start >= end {
                Value::List(Vec::new())
            } else {
                Value::List(items[start..end].to_vec())
            }
        }
        "reverse" => {
            let mut out = items;
            out.reverse();
            Value::List(out)
        }
        _ => return Err(format!("a list has no method '{}'", name)),
    };
    Ok(value)
}

/// Negative bounds count from the end
fn slice_bound(arg: Option<&Value>, default: usize, len: usize) -> Result<usize, String> {
    match arg {
        None | Some(Value::NoValue) => Ok(default),
        Some(Value::Number(n)) => {
            let n = n.trunc();
            let bound = if n < 0.0 { len as f64 + n } else { n };
            Ok(bound.clamp(0.0, len as f64) as usize)
        }
        Some(other) => Err(format!("slice() bounds must be numbers, got {}", other.type_name())),
    }
}
