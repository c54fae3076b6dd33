//! celhost - host value marshalling and execution contexts for CEL-like
//! expressions
//!
//! # Overview
//!
//! celhost evaluates small, side-effect free expressions on behalf of a host
//! application. The host hands values over in its own representation
//! ([`HostValue`]), they are decoded into runtime [`Value`]s, the expression
//! runs, and the result is encoded back. Common use cases include:
//!
//! - Access rules and request filters
//! - Feature flags and conditional logic
//! - Data transformations and mappings
//!
//! # Quick Start
//!
//! ```
//! use celhost::{BindingSet, ExecutionContext, HostValue};
//!
//! let mut context = ExecutionContext::new();
//! context.compile("adult", "person.age >= 18").unwrap();
//!
//! let mut bindings = BindingSet::new();
//! bindings
//!     .bind_param("person", HostValue::record([("age", HostValue::Number(42.0))]))
//!     .unwrap();
//!
//! let result = context.exec("adult", bindings).into_host();
//! assert_eq!(result.unwrap_value(), HostValue::Bool(true));
//! ```
//!
//! # Numbers
//!
//! Host numbers are doubles. An integral number decodes to `int`, anything
//! else to `double`. The one-key records `{cel_int: n}`, `{cel_uint: n}` and
//! `{cel_float: n}` force a specific numeric kind, and `{sec, nsec}` records
//! decode to durations.
//!
//! # Errors
//!
//! Every failure is reported as an [`EvalError`] inside the result
//! envelope. Compilation failures are also available as [`CompileError`],
//! which keeps source spans for rendering:
//!
//! ```
//! use celhost::{ExecutionContext, render_error_to_string_no_color};
//!
//! let context = ExecutionContext::new();
//! let error = context.compile_anonymous("1 +").unwrap_err();
//! assert!(render_error_to_string_no_color(&error).contains("1 +"));
//! ```

// Re-export public API from celhost_core
pub use celhost_core::api::{
    BindingSet, CompileError, CompileOptions, ContextOptions, DetailResult, Diagnostic, ErrorKind,
    EvalError, EvalResult, ExecutionContext, ExecutionOptions, Function, FunctionError,
    HostFunctionAdapter, NativeFunction, Program, ProgramDetails, Severity,
};

// Re-export the value model and the host codec
pub use celhost_core::host::{self, CodecError, HostValue, decode, encode};
pub use celhost_core::values::{self, Duration, Value};

// Re-export runtime errors
pub use celhost_core::evaluator::{ExecutionError, ExecutionErrorKind};

pub mod error_renderer;

pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
    render_runtime_error, render_runtime_error_to_string_no_color,
};
