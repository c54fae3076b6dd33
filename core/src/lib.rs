//! Value marshalling and execution contexts for CEL-like expressions.
//!
//! - [`values`]: the runtime value model
//! - [`host`]: host values and the codec between them and runtime values
//! - [`api`]: bindings, programs, execution contexts and result envelopes
//! - [`parser`], [`evaluator`], [`stdlib`]: the expression language itself

pub mod api;
pub mod evaluator;
pub mod host;
pub mod parser;
pub mod stdlib;
pub mod syntax;
pub mod values;

pub use api::{
    BindingSet, CompileError, DetailResult, ErrorKind, EvalError, EvalResult, ExecutionContext,
    FunctionError, Program, ProgramDetails,
};
pub use host::HostValue;
pub use values::Value;

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_exec() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
