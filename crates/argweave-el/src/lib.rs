//! Argweave EL - embedded expression language
//!
//! A small expression language for annotation-declared values: literals,
//! `#variables`, `@beans`, `T(Type)` references, property and index access,
//! method calls, arithmetic, comparison, logic, ternary and elvis operators.
//!
//! ```ignore
//! use argweave_el::{ElEvaluator, EvalContext, ExpressionEvaluator};
//!
//! let ctx = EvalContext::new(root).with_variable("p0", user);
//! let id = ElEvaluator.evaluate(&ctx, "#p0.id + ':' + #p0.name")?;
//! ```

#![warn(missing_docs)]

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use error::{ElError, ElResult};
pub use eval::{eval, BeanResolver, ElEvaluator, EvalContext, ExpressionEvaluator};
pub use lexer::{tokenize, Span, Token};
pub use parser::parse;
