//! Template expansion
//!
//! Rules can run their source through one of two template modes before it is
//! written:
//!
//! - **Tree mode** ([`json::expand`]): the source is parsed as JSON and every
//!   backtick-delimited string is evaluated as an expression. See the
//!   [`json`] module for key expressions, `__unpack__` fan-out and join
//!   reduction.
//! - **Text mode** ([`text::expand_text`]): the source is treated as plain
//!   text and each `{expr: ... :}` block is replaced with the text form of
//!   its value.
//!
//! Both modes share the expression language in [`expr`].

pub mod expr;
pub mod json;
pub mod text;

pub use expr::Scope;
pub use json::expand;
pub use text::expand_text;
