//! Configuration options for compiling and executing programs.

use crate::parser::DEFAULT_MAX_DEPTH;

/// Configuration options for compilation.
///
/// # Example
///
/// ```
/// use celhost_core::api::CompileOptions;
///
/// let options = CompileOptions { max_depth: 64 };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Maximum depth of the expression tree, counting brackets, prefix
    /// operators, ternaries and operator chains.
    ///
    /// Default: 256
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Configuration options for program execution.
///
/// These options control resource limits during evaluation.
///
/// # Example
///
/// ```
/// use celhost_core::api::ExecutionOptions;
///
/// let options = ExecutionOptions {
///     max_depth: 500,
///     max_iterations: Some(10_000),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Maximum evaluation stack depth (for recursion protection).
    ///
    /// Default: 1000
    pub max_depth: usize,

    /// Maximum number of comprehension iterations per execution (if Some).
    ///
    /// Set to `None` for unlimited iterations (be careful with untrusted code!).
    ///
    /// Default: None
    pub max_iterations: Option<usize>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            max_iterations: None,
        }
    }
}

/// Options for an [`ExecutionContext`](crate::api::ExecutionContext).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOptions {
    /// Used by `compile`, `compile_anonymous`, `eval` and `analyze`.
    pub compile: CompileOptions,

    /// Used by every execution.
    pub execution: ExecutionOptions,
}
