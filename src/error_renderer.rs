//! Error rendering using ariadne
//!
//! This module renders compile errors and runtime errors with source code
//! snippets and labels pointing at the offending expression.

use crate::{CompileError, Diagnostic, ExecutionError, Severity};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use celhost_core::parser::Span;
use std::io::Write;

/// Render a compile error to stderr
///
/// # Example
/// ```no_run
/// use celhost::{Program, render_error};
///
/// if let Err(e) = Program::compile("1 + + 2") {
///     render_error(&e);
/// }
/// ```
pub fn render_error(error: &CompileError) {
    render_diagnostics(&error.source, &error.diagnostics, &mut std::io::stderr(), true).ok();
}

/// Render a compile error to a specific writer
pub fn render_error_to(error: &CompileError, writer: &mut dyn Write) -> std::io::Result<()> {
    render_diagnostics(&error.source, &error.diagnostics, writer, true)
}

/// Render a compile error to a String (useful for logs and UIs)
pub fn render_error_to_string(error: &CompileError) -> String {
    let mut buf = Vec::new();
    render_diagnostics(&error.source, &error.diagnostics, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render a compile error to a String without color codes (useful for tests)
pub fn render_error_to_string_no_color(error: &CompileError) -> String {
    let mut buf = Vec::new();
    render_diagnostics(&error.source, &error.diagnostics, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error raised while executing `source` to stderr
pub fn render_runtime_error(source: &str, error: &ExecutionError) {
    let diagnostic = runtime_diagnostic(source, error);
    render_diagnostics(source, &[diagnostic], &mut std::io::stderr(), true).ok();
}

/// Render an error raised while executing `source` to a String without color codes
pub fn render_runtime_error_to_string_no_color(source: &str, error: &ExecutionError) -> String {
    let diagnostic = runtime_diagnostic(source, error);
    let mut buf = Vec::new();
    render_diagnostics(source, &[diagnostic], &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn runtime_diagnostic(source: &str, error: &ExecutionError) -> Diagnostic {
    let mut help = Vec::new();
    if error.is_resource_exceeded() {
        help.push("raise the limit in ExecutionOptions if this input is expected".to_string());
    }
    Diagnostic {
        severity: Severity::Error,
        message: error.kind.to_string(),
        // Errors without a location point at the whole expression.
        span: error
            .span
            .clone()
            .unwrap_or_else(|| Span::new(0, source.len())),
        help,
        code: None,
    }
}

fn render_diagnostics(
    source: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    for diag in diagnostics {
        let mut colors = ColorGenerator::new();
        colors.next(); // Skip the first color.

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };

        let mut report = Report::build(kind, ("<expr>", diag.span.0.clone()))
            .with_message(&diag.message)
            .with_config(ariadne::Config::default().with_color(use_color));

        if let Some(code) = &diag.code {
            report = report.with_code(code);
        }

        let color = colors.next();
        report = report.with_label(
            Label::new(("<expr>", diag.span.0.clone()))
                .with_message(&diag.message)
                .with_color(color),
        );

        for help_msg in &diag.help {
            report = report.with_help(help_msg);
        }

        report
            .finish()
            .write(("<expr>", Source::from(source)), &mut *writer)?;
    }

    Ok(())
}
