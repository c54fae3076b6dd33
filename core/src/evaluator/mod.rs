//! Tree-walking evaluator for parsed expressions.
//!
//! The evaluator interprets an [`Expr`] against a [`BindingSet`] and produces
//! a [`Value`]. Operand kinds are checked at runtime; a mismatch is a
//! `TypeMismatch` error rather than a panic.
//!
//! ## Design Principles
//!
//! - **Never panic**: all adversarial inputs are handled gracefully, and
//!   panics inside bound functions are caught at the call boundary
//! - **Stack-safe**: depth tracking prevents stack overflow from deeply
//!   nested expressions
//!
//! ## Example
//!
//! ```
//! use celhost_core::api::{BindingSet, ExecutionOptions, Runtime};
//! use celhost_core::{evaluator, parser, values::Value};
//!
//! let expr = parser::parse("x * 2").unwrap();
//! let mut bindings = BindingSet::new();
//! bindings.bind_value("x", 21);
//!
//! let result = evaluator::evaluate(&expr, &bindings, Runtime::initialize(), &ExecutionOptions::default());
//! assert_eq!(result.unwrap(), Value::Int(42));
//! ```

mod error;
mod eval;
pub mod operators;


pub use error::{ExecutionError, ExecutionErrorKind};
pub use eval::Evaluator;

use crate::api::{BindingSet, ExecutionOptions, Runtime};
use crate::parser::Expr;
use crate::values::Value;

/// Evaluate a parsed expression.
pub fn evaluate(
    expr: &Expr,
    bindings: &BindingSet,
    runtime: &Runtime,
    options: &ExecutionOptions,
) -> Result<Value, ExecutionError> {
    Evaluator::new(options, runtime, bindings).eval(expr)
}
