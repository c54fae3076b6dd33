//! Compiled programs.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::api::{BindingSet, CompileError, CompileOptions, ExecutionOptions, Runtime};
use crate::evaluator::{self, ExecutionError};
use crate::parser::{
    self, Comprehension, DEFAULT_MAX_DEPTH, Expr, ExprKind, ParseError, ParseErrorKind,
    PostorderNode, Span,
};
use crate::values::Value;

/// A parsed expression ready for execution.
///
/// Programs own their syntax tree and can be executed any number of times,
/// from any thread, with different bindings.
///
/// # Example
///
/// ```
/// use celhost_core::api::Program;
///
/// let program = Program::compile("price * (1.0 + tax)").unwrap();
/// assert_eq!(program.params(), ["price", "tax"]);
/// ```
///
/// Programs serialize to JSON and load back without reparsing:
///
/// ```
/// use celhost_core::api::Program;
///
/// let program = Program::compile("a.b + 1").unwrap();
/// let loaded = Program::from_json(&program.to_json().unwrap()).unwrap();
/// assert_eq!(loaded, program);
/// ```
#[derive(Clone, PartialEq, Deserialize)]
#[serde(try_from = "SerializedProgram")]
pub struct Program {
    source: String,
    expr: Expr,
    params: Vec<String>,
}

impl Program {
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        Self::compile_with_options(source, &CompileOptions::default())
    }

    pub fn compile_with_options(
        source: &str,
        options: &CompileOptions,
    ) -> Result<Self, CompileError> {
        let expr = parser::parse_with_max_depth(source, options.max_depth)?;
        let params = free_variables(&expr);
        Ok(Self {
            source: source.to_string(),
            expr,
            params,
        })
    }

    /// Serialize the source and syntax tree to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Load a program written by [`Program::to_json`].
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        Self::from_json_with_options(json, &CompileOptions::default())
    }

    /// Load a program written by [`Program::to_json`], rejecting trees
    /// deeper than `options.max_depth`.
    pub fn from_json_with_options(
        json: &str,
        options: &CompileOptions,
    ) -> Result<Self, CompileError> {
        let invalid = |message: String| {
            CompileError::from(ParseError::new(
                ParseErrorKind::InvalidProgram { message },
                json,
                Span::new(0, 0),
            ))
        };
        let serialized: SerializedProgram =
            serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        Self::from_serialized(serialized, options.max_depth).map_err(invalid)
    }

    fn from_serialized(serialized: SerializedProgram, max_depth: usize) -> Result<Self, String> {
        let expr = parser::from_postorder(serialized.ast, max_depth)?;
        // Recomputed so a stale or edited list cannot disagree with the tree.
        let params = free_variables(&expr);
        Ok(Self {
            source: serialized.source,
            expr,
            params,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Free variables in order of first occurrence.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn details(&self) -> ProgramDetails {
        ProgramDetails {
            source: self.source.clone(),
            params: self.params.clone(),
        }
    }

    /// Evaluate against `bindings`.
    pub fn execute(
        &self,
        bindings: &BindingSet,
        options: &ExecutionOptions,
    ) -> Result<Value, ExecutionError> {
        evaluator::evaluate(&self.expr, bindings, Runtime::initialize(), options)
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("source", &self.source)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Serialize for Program {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SerializedProgramRef {
            source: &self.source,
            params: &self.params,
            ast: parser::to_postorder(&self.expr),
        }
        .serialize(serializer)
    }
}

/// JSON form of a [`Program`]. `ast` is the syntax tree in postorder.
/// The written `params` list is ignored on load.
#[derive(Deserialize)]
struct SerializedProgram {
    source: String,
    ast: Vec<PostorderNode>,
}

#[derive(Serialize)]
struct SerializedProgramRef<'a> {
    source: &'a str,
    params: &'a [String],
    ast: Vec<PostorderNode>,
}

impl TryFrom<SerializedProgram> for Program {
    type Error = String;

    fn try_from(serialized: SerializedProgram) -> Result<Self, String> {
        Self::from_serialized(serialized, DEFAULT_MAX_DEPTH)
    }
}

/// What `analyze` reports about a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramDetails {
    pub source: String,
    pub params: Vec<String>,
}

/// Identifiers not bound by an enclosing comprehension, de-duplicated, in
/// order of first occurrence. Function names at call sites are excluded.
pub fn free_variables(expr: &Expr) -> Vec<String> {
    let mut collector = FreeVariables::default();
    collector.visit(expr);
    collector.found
}

#[derive(Default)]
struct FreeVariables<'a> {
    bound: Vec<&'a str>,
    found: Vec<String>,
}

impl<'a> FreeVariables<'a> {
    fn visit(&mut self, expr: &'a Expr) {
        match &expr.kind {
            ExprKind::Literal(_) => {}
            ExprKind::Ident(name) => {
                if !self.bound.contains(&name.as_str()) && !self.found.contains(name) {
                    self.found.push(name.clone());
                }
            }
            ExprKind::List(elements) => elements.iter().for_each(|e| self.visit(e)),
            ExprKind::Map(entries) => {
                for (key, value) in entries {
                    self.visit(key);
                    self.visit(value);
                }
            }
            ExprKind::Unary { expr, .. } => self.visit(expr),
            ExprKind::Binary { left, right, .. }
            | ExprKind::Boolean { left, right, .. }
            | ExprKind::Comparison { left, right, .. } => {
                self.visit(left);
                self.visit(right);
            }
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                self.visit(cond);
                self.visit(then_branch);
                self.visit(else_branch);
            }
            ExprKind::Field { value, .. } | ExprKind::Has { value, .. } => self.visit(value),
            ExprKind::Index { value, index } => {
                self.visit(value);
                self.visit(index);
            }
            ExprKind::Call { target, args, .. } => {
                if let Some(target) = target {
                    self.visit(target);
                }
                args.iter().for_each(|a| self.visit(a));
            }
            ExprKind::Comprehension(comprehension) => {
                let Comprehension {
                    range,
                    var,
                    filter,
                    body,
                    ..
                } = comprehension.as_ref();
                self.visit(range);
                self.bound.push(var);
                if let Some(filter) = filter {
                    self.visit(filter);
                }
                self.visit(body);
                self.bound.pop();
            }
        }
    }
}
