//! Runtime evaluation errors.
//!
//! The evaluator reports every failure as an [`ExecutionError`]: an
//! [`ExecutionErrorKind`] plus the span of the expression that failed, when
//! one is known. Builtins return bare kinds and the evaluator attaches the
//! span of the call site.

use core::fmt;

use thiserror::Error;

use crate::parser::Span;

/// Runtime evaluation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionError {
    pub kind: ExecutionErrorKind,
    pub span: Option<Span>,
}

impl ExecutionError {
    pub fn new(kind: ExecutionErrorKind, span: Option<Span>) -> Self {
        Self { kind, span }
    }

    /// Attach a span unless one is already present.
    pub fn or_span(mut self, span: &Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span.clone());
        }
        self
    }

    pub fn is_resource_exceeded(&self) -> bool {
        matches!(
            self.kind,
            ExecutionErrorKind::StackOverflow { .. }
                | ExecutionErrorKind::IterationLimitExceeded { .. }
        )
    }
}

impl From<ExecutionErrorKind> for ExecutionError {
    fn from(kind: ExecutionErrorKind) -> Self {
        Self { kind, span: None }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(span) = &self.span {
            write!(f, " at {}..{}", span.0.start, span.0.end)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExecutionError {}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionErrorKind {
    /// No overload of an operator or builtin accepts the operand kinds.
    #[error("no matching overload for '{operation}' applied to ({operands})")]
    TypeMismatch { operation: String, operands: String },

    #[error("undeclared reference to '{name}'")]
    UnknownIdentifier { name: String },

    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("function '{name}' expects {expected} argument(s), got {got}")]
    ArityMismatch {
        name: String,
        expected: String,
        got: usize,
    },

    /// A bound function returned an error or panicked.
    #[error("function '{name}' failed: {message}")]
    FunctionFailed { name: String, message: String },

    /// A builtin rejected an argument value (bad conversion, bad format).
    #[error("{function}: {message}")]
    InvalidArgument { function: String, message: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulus by zero")]
    ModuloByZero,

    #[error("overflow in {operation}")]
    Overflow { operation: String },

    #[error("index {index} out of bounds (length: {len})")]
    IndexOutOfBounds { index: String, len: usize },

    #[error("no such key: {key}")]
    KeyNotFound { key: String },

    #[error("duplicate map key: {key}")]
    DuplicateKey { key: String },

    #[error("evaluation stack overflow: depth {depth} exceeds maximum of {max_depth}")]
    StackOverflow { depth: usize, max_depth: usize },

    #[error("comprehension iteration limit of {limit} exceeded")]
    IterationLimitExceeded { limit: usize },
}

impl ExecutionErrorKind {
    /// `TypeMismatch` naming the operation and the kinds of its operands.
    pub fn no_overload(operation: impl Into<String>, operands: &[&crate::values::Value]) -> Self {
        ExecutionErrorKind::TypeMismatch {
            operation: operation.into(),
            operands: operands
                .iter()
                .map(|v| v.type_name())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn invalid_argument(function: &str, message: impl Into<String>) -> Self {
        ExecutionErrorKind::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }

    pub fn overflow(operation: &str) -> Self {
        ExecutionErrorKind::Overflow {
            operation: operation.to_string(),
        }
    }
}
