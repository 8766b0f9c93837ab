//! Sandboxed expression language
//!
//! Templates embed small expressions that compute values from the rule's
//! scope. The language is deliberately small: literals, lists and objects,
//! arithmetic, comparison, short-circuit logic, conditionals, member access,
//! lambdas and a fixed set of builtins. Nothing in it can reach the
//! filesystem, the environment or the network.
//!
//! Two entry points exist:
//!
//! - [`evaluate`] evaluates exactly one expression (tree-mode templates).
//! - [`evaluate_block`] evaluates a text-mode block, which is either one
//!   expression or a `;`-separated statement sequence ending in `return`.
//!
//! ```
//! use packmap::template::expr::{evaluate, Scope, Value};
//!
//! let mut scope = Scope::new();
//! scope.set("name", Value::String("apple".into()));
//! let value = evaluate("'item_' + name.upper()", &scope).unwrap();
//! assert_eq!(value, Value::String("item_APPLE".into()));
//! ```

mod eval;
mod lexer;
mod parser;
mod value;

pub use value::{format_number, Builtin, DynamicKey, Function, Object, Scope, Value};

use crate::error::{Error, Result};
use parser::Stmt;

/// Evaluate a single expression against `scope`
pub fn evaluate(source: &str, scope: &Scope) -> Result<Value> {
    let expr = lexer::tokenize(source)
        .and_then(parser::parse_expression)
        .map_err(|message| expression_error(source, message))?;
    eval::eval(&expr, scope).map_err(|message| expression_error(source, message))
}

/// Evaluate a text-mode block.
///
/// A block holding a single expression (or a single `return`) yields that
/// value. Anything longer runs as a statement sequence and must `return`.
pub fn evaluate_block(source: &str, scope: &Scope) -> Result<Value> {
    let program = lexer::tokenize(source)
        .and_then(parser::parse_program)
        .map_err(|message| expression_error(source, message))?;

    let result = match program.statements.as_slice() {
        [] => Err("block is empty".to_string()),
        [Stmt::Expr(expr)] | [Stmt::Return(expr)] => eval::eval(expr, scope),
        _ => eval::exec(&program, scope),
    };
    result.map_err(|message| expression_error(source, message))
}

fn expression_error(source: &str, message: String) -> Error {
    Error::Expression {
        expression: source.trim().to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope(json: serde_json::Value) -> Scope {
        match json {
            serde_json::Value::Object(map) => Scope::from_json(&map),
            _ => Scope::new(),
        }
    }

    fn eval_str(source: &str) -> Value {
        evaluate(source, &Scope::new()).unwrap()
    }

    fn eval_json(source: &str, vars: serde_json::Value) -> serde_json::Value {
        evaluate(source, &scope(vars))
            .unwrap()
            .to_json()
            .unwrap()
            .unwrap_or(serde_json::Value::Null)
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval_str("42"), Value::Number(42.0));
        assert_eq!(eval_str("'a'"), Value::String("a".into()));
        assert_eq!(eval_str("noValue"), Value::NoValue);
        assert_eq!(eval_json("[1, 'x', {a: null}]", json!({})), json!([1, "x", {"a": null}]));
    }

    #[test]
    fn test_arithmetic_and_concat() {
        assert_eq!(eval_str("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(eval_str("(1 + 2) * 3"), Value::Number(9.0));
        assert_eq!(eval_str("7 % 4"), Value::Number(3.0));
        assert_eq!(eval_str("'n' + 1"), Value::String("n1".into()));
        assert_eq!(eval_json("[1] + [2]", json!({})), json!([1, 2]));
    }

    #[test]
    fn test_division_by_zero_is_an_error() {
        let err = evaluate("1 / 0", &Scope::new()).unwrap_err();
        assert!(matches!(err, Error::Expression { .. }));
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn test_deep_equality() {
        assert_eq!(eval_str("[1, {a: 2}] == [1, {a: 2}]"), Value::Bool(true));
        assert_eq!(eval_str("'1' === 1"), Value::Bool(false));
        assert_eq!(eval_str("noValue != null"), Value::Bool(true));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval_str("2 >= 2"), Value::Bool(true));
        assert_eq!(eval_str("'apple' < 'banana'"), Value::Bool(true));
        assert!(evaluate("'a' < 1", &Scope::new()).is_err());
    }

    #[test]
    fn test_scope_variables_and_members() {
        let vars = json!({"item": {"name": "sword", "tags": ["a", "b"]}});
        assert_eq!(eval_json("item.name", vars.clone()), json!("sword"));
        assert_eq!(eval_json("item.tags[1]", vars.clone()), json!("b"));
        assert_eq!(eval_json("item['name'].length", vars.clone()), json!(5));
        assert_eq!(
            evaluate("item.missing", &scope(vars)).unwrap(),
            Value::NoValue
        );
    }

    #[test]
    fn test_unknown_identifier() {
        let err = evaluate("nope + 1", &Scope::new()).unwrap_err();
        assert!(err.to_string().contains("'nope' is not defined"));
    }

    #[test]
    fn test_property_of_null_is_an_error() {
        assert!(evaluate("null.x", &Scope::new()).is_err());
    }

    #[test]
    fn test_conditional() {
        let vars = json!({"count": 3});
        assert_eq!(eval_json("count > 2 ? 'many' : 'few'", vars), json!("many"));
    }

    #[test]
    fn test_list_methods() {
        let vars = json!({"items": [{"n": "a", "on": true}, {"n": "b", "on": false}]});
        assert_eq!(
            eval_json("items.filter(i => i.on).map(i => i.n)", vars.clone()),
            json!(["a"])
        );
        assert_eq!(eval_json("items.map((i, idx) => idx)", vars), json!([0, 1]));
        assert_eq!(eval_json("['x', 'y'].join('-')", json!({})), json!("x-y"));
        assert_eq!(eval_json("[3, 4].indexOf(4)", json!({})), json!(1));
        assert_eq!(eval_json("[1, 2].includes(3)", json!({})), json!(false));
        assert_eq!(eval_json("[1].concat([2], 3)", json!({})), json!([1, 2, 3]));
        assert_eq!(eval_json("[1, 2, 3].reverse()", json!({})), json!([3, 2, 1]));
    }

    #[test]
    fn test_string_methods() {
        assert_eq!(eval_json("'Ab'.lower()", json!({})), json!("ab"));
        assert_eq!(eval_json("'  x '.trim()", json!({})), json!("x"));
        assert_eq!(eval_json("'a.b.c'.replace('.', '/')", json!({})), json!("a/b/c"));
        assert_eq!(eval_json("'a,b'.split(',')", json!({})), json!(["a", "b"]));
        assert_eq!(eval_json("'prefix_x'.startsWith('prefix')", json!({})), json!(true));
        assert!(evaluate("'a'.explode()", &Scope::new()).is_err());
    }

    #[test]
    fn test_builtins() {
        assert_eq!(eval_json("range(3)", json!({})), json!([0, 1, 2]));
        assert_eq!(eval_json("range(2, 4)", json!({})), json!([2, 3]));
        assert_eq!(eval_json("str(5) + str(true)", json!({})), json!("5true"));
        assert_eq!(eval_json("int('12.7')", json!({})), json!(12));
        assert_eq!(eval_json("len({a: 1, b: 2})", json!({})), json!(2));
        assert_eq!(eval_json("keys({b: 1, a: 2})", json!({})), json!(["b", "a"]));
        assert_eq!(eval_json("values({b: 1})", json!({})), json!([1]));
        assert_eq!(eval_json("entries({b: 1})", json!({})), json!([["b", 1]]));
    }

    #[test]
    fn test_range_edges() {
        assert_eq!(eval_json("range(4, 2)", json!({})), json!([]));
        assert_eq!(eval_json("range(-2, 1)", json!({})), json!([-2, -1, 0]));
        assert!(evaluate("range(0, 2000000)", &Scope::new()).is_err());
    }

    #[test]
    fn test_range_beyond_safe_integers_fails() {
        let err = evaluate("range(9007199254740992, 9007199254740994)", &Scope::new()).unwrap_err();
        assert!(err.to_string().contains("safe integers"));
    }

    #[test]
    fn test_scope_shadows_builtins() {
        let vars = json!({"len": 3});
        assert_eq!(eval_json("len + 1", vars), json!(4));
    }

    #[test]
    fn test_dynamic_key() {
        let value = eval_str("K('greeting', {name: 'World'})");
        let Value::Key(key) = value else {
            panic!("expected a dynamic key");
        };
        assert_eq!(key.identifier, "greeting");
        assert_eq!(key.scope.get("name"), Some(&Value::String("World".into())));
        assert_eq!(eval_json("K('id').identifier", json!({})), json!("id"));
    }

    #[test]
    fn test_join_separator() {
        assert_eq!(eval_str("joinStr('; ')"), Value::JoinSeparator("; ".into()));
        assert!(evaluate("joinStr(1)", &Scope::new()).is_err());
    }

    #[test]
    fn test_parse_error_reports_expression() {
        let err = evaluate(" 1 + ", &Scope::new()).unwrap_err();
        match err {
            Error::Expression { expression, .. } => assert_eq!(expression, "1 +"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_single_expression_rejects_statements() {
        assert!(evaluate("let a = 1; a", &Scope::new()).is_err());
    }

    #[test]
    fn test_block_single_expression() {
        let value = evaluate_block("name.upper()", &scope(json!({"name": "x"}))).unwrap();
        assert_eq!(value, Value::String("X".into()));
        assert_eq!(evaluate_block("return 1", &Scope::new()).unwrap(), Value::Number(1.0));
        assert_eq!(evaluate_block("2;", &Scope::new()).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_block_statement_sequence() {
        let source = "let base = 'item'; let n = count * 2; return base + '_' + n";
        let value = evaluate_block(source, &scope(json!({"count": 4}))).unwrap();
        assert_eq!(value, Value::String("item_8".into()));
    }

    #[test]
    fn test_block_sequence_without_return() {
        let err = evaluate_block("let a = 1; a", &Scope::new()).unwrap_err();
        assert!(err.to_string().contains("never returns"));
        assert!(evaluate_block("let a = 1", &Scope::new()).is_err());
        assert!(evaluate_block("  ", &Scope::new()).is_err());
    }
}
