//! Public API: bindings, programs, execution contexts and their results.
//!
//! # Example
//!
//! ```
//! use celhost_core::api::{BindingSet, ExecutionContext};
//! use celhost_core::host::HostValue;
//!
//! let mut context = ExecutionContext::new();
//! context.compile("greet", "'Hello, ' + name").unwrap();
//!
//! let mut bindings = BindingSet::new();
//! bindings.bind_param("name", HostValue::from("world")).unwrap();
//!
//! let result = context.exec("greet", bindings).into_host();
//! assert_eq!(result.unwrap_value(), HostValue::from("Hello, world"));
//!
//! let details = context.analyze("3 + foo").unwrap_details();
//! assert_eq!(details.params, ["foo"]);
//! ```

pub mod bindings;
pub mod context;
pub mod error;
pub mod options;
pub mod program;
pub mod result;
pub mod runtime;

#[cfg(test)]
mod context_test;
#[cfg(test)]
mod result_test;

pub use bindings::{BindingSet, Function, HostFunctionAdapter, NativeFunction};
pub use context::ExecutionContext;
pub use error::{CompileError, Diagnostic, ErrorKind, EvalError, FunctionError, Severity};
pub use options::{CompileOptions, ContextOptions, ExecutionOptions};
pub use program::{Program, ProgramDetails, free_variables};
pub use result::{DetailResult, EvalResult};
pub use runtime::Runtime;
