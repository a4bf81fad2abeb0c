//! Condition and interpolation expressions.
//!
//! Documents embed small JavaScript-flavoured expressions in two places:
//! element `visible_if` / action `if` conditions, and `{{ ... }}` spans in
//! text. This crate lexes them with `logos`, parses them into an [`Expr`]
//! tree and walks that tree against a [`Context`] built from the state
//! store. Nothing outside the grammar can run.
//!
//! ```
//! use serde_json::{Map, json};
//! use tableau_expression::{Context, evaluate_condition, interpolate};
//!
//! let mut state = Map::new();
//! state.insert("score".into(), json!(5));
//! let context = Context::new(state, Map::new());
//!
//! assert!(evaluate_condition("score > 3 && !state.passed", &context));
//! assert_eq!(interpolate("Score: {{ score * 2 }}", &context), "Score: 10");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod ast;
mod context;
mod eval;
mod lexer;
mod parser;
mod value;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use context::Context;
pub use eval::{evaluate, evaluate_condition, interpolate};
pub use lexer::{Spanned, Token, lex};
pub use parser::parse;
pub use value::{Builtin, Value};
