//! Public error types.
//!
//! Internal errors (parse, codec, evaluation) are converted to [`EvalError`]
//! at the context boundary. [`CompileError`] keeps the full diagnostics for
//! callers that want to render them.

use core::fmt;

use thiserror::Error;

use crate::evaluator::{ExecutionError, ExecutionErrorKind};
use crate::host::CodecError;
use crate::parser::{ParseError, Span};

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity level (error, warning, info).
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the primary issue.
    pub span: Span,

    /// Help text suggesting how to fix the issue.
    pub help: Vec<String>,

    /// Optional error code (e.g., "P001") for documentation lookup.
    pub code: Option<String>,
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - compilation cannot succeed.
    Error,
    /// Warning - suspicious code that might be wrong.
    Warning,
    /// Info - informational message.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Compilation failure, with the source it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileError {
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// The first error message, which is what [`EvalError`] reports.
    pub fn message(&self) -> String {
        match self.diagnostics.first() {
            Some(d) => format!("{} at {}..{}", d.message, d.span.0.start, d.span.0.end),
            None => "compilation failed".to_string(),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Compilation failed with {} error(s)", self.error_count())?;
        for d in &self.diagnostics {
            write!(f, "\n{}: {}", d.severity, d.message)?;
            if let Some(code) = &d.code {
                write!(f, " [{}]", code)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        CompileError {
            diagnostics: vec![err.to_diagnostic()],
            source: err.source,
        }
    }
}

/// Error returned by a bound function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FunctionError {
    pub message: String,
}

impl FunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for FunctionError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for FunctionError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<CodecError> for FunctionError {
    fn from(err: CodecError) -> Self {
        Self::new(err.to_string())
    }
}

/// Category of an [`EvalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorKind {
    SyntaxError,
    TypeError,
    UnknownIdentifier,
    UnknownFunction,
    UnknownProgram,
    FunctionError,
    ArityMismatch,
    ValueError,
    RuntimeError,
    ResourceExceeded,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::UnknownIdentifier => "UnknownIdentifier",
            ErrorKind::UnknownFunction => "UnknownFunction",
            ErrorKind::UnknownProgram => "UnknownProgram",
            ErrorKind::FunctionError => "FunctionError",
            ErrorKind::ArityMismatch => "ArityMismatch",
            ErrorKind::ValueError => "ValueError",
            ErrorKind::RuntimeError => "RuntimeError",
            ErrorKind::ResourceExceeded => "ResourceExceeded",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error carried by a failed [`EvalResult`](crate::api::EvalResult) or
/// [`DetailResult`](crate::api::DetailResult).
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[error("{kind}: {message}")]
pub struct EvalError {
    pub kind: ErrorKind,
    pub message: String,
}

impl EvalError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_program(name: &str) -> Self {
        Self::new(ErrorKind::UnknownProgram, format!("no program named '{}'", name))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<CompileError> for EvalError {
    fn from(err: CompileError) -> Self {
        Self::new(ErrorKind::SyntaxError, err.message())
    }
}

impl From<ParseError> for EvalError {
    fn from(err: ParseError) -> Self {
        Self::from(CompileError::from(err))
    }
}

impl From<CodecError> for EvalError {
    fn from(err: CodecError) -> Self {
        Self::new(ErrorKind::ValueError, err.to_string())
    }
}

impl From<ExecutionError> for EvalError {
    fn from(err: ExecutionError) -> Self {
        use ExecutionErrorKind::*;

        let kind = match &err.kind {
            TypeMismatch { .. } => ErrorKind::TypeError,
            UnknownIdentifier { .. } => ErrorKind::UnknownIdentifier,
            UnknownFunction { .. } => ErrorKind::UnknownFunction,
            ArityMismatch { .. } => ErrorKind::ArityMismatch,
            FunctionFailed { .. } => ErrorKind::FunctionError,
            InvalidArgument { .. } => ErrorKind::ValueError,
            StackOverflow { .. } | IterationLimitExceeded { .. } => ErrorKind::ResourceExceeded,
            DivisionByZero
            | ModuloByZero
            | Overflow { .. }
            | IndexOutOfBounds { .. }
            | KeyNotFound { .. }
            | DuplicateKey { .. } => ErrorKind::RuntimeError,
        };
        Self::new(kind, err.to_string())
    }
}
