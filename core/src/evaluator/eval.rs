//! Core evaluation logic.

use std::panic::{self, AssertUnwindSafe};

use tracing::trace;

use crate::api::{BindingSet, ExecutionOptions, Runtime};
use crate::evaluator::{ExecutionError, ExecutionErrorKind, operators};
use crate::parser::{BoolOp, Comprehension, ComprehensionKind, Expr, ExprKind, Literal};
use crate::values::{MapKey, Value, ValueMap};

/// Evaluator for parsed expressions.
///
/// Identifiers resolve, in order, to comprehension variables, bound
/// variables, bound functions and builtins. Calls resolve to bound functions
/// before builtins.
pub struct Evaluator<'a> {
    options: &'a ExecutionOptions,
    runtime: &'a Runtime,
    bindings: &'a BindingSet,
    /// Comprehension variables, innermost last.
    scopes: Vec<(&'a str, Value)>,
    depth: usize,
    iterations: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        options: &'a ExecutionOptions,
        runtime: &'a Runtime,
        bindings: &'a BindingSet,
    ) -> Self {
        Self {
            options,
            runtime,
            bindings,
            scopes: Vec::new(),
            depth: 0,
            iterations: 0,
        }
    }

    /// Evaluate an expression node.
    pub fn eval(&mut self, expr: &'a Expr) -> Result<Value, ExecutionError> {
        // Check depth before recursing
        if self.depth >= self.options.max_depth {
            return Err(ExecutionError::new(
                ExecutionErrorKind::StackOverflow {
                    depth: self.depth,
                    max_depth: self.options.max_depth,
                },
                Some(expr.span.clone()),
            ));
        }

        self.depth += 1;
        let result = self.eval_inner(expr);
        self.depth -= 1;

        // The innermost failing node keeps its span.
        result.map_err(|e| e.or_span(&expr.span))
    }

    fn eval_inner(&mut self, expr: &'a Expr) -> Result<Value, ExecutionError> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(literal_value(literal)),

            ExprKind::Ident(name) => self.lookup(name).map_err(Into::into),

            ExprKind::List(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element)?);
                }
                Ok(Value::from(values))
            }

            ExprKind::Map(entries) => {
                let mut map = ValueMap::new();
                for (key_expr, value_expr) in entries {
                    let key = self.eval(key_expr)?;
                    let Some(map_key) = MapKey::from_value(&key) else {
                        return Err(ExecutionError::new(
                            ExecutionErrorKind::no_overload("map key", &[&key]),
                            Some(key_expr.span.clone()),
                        ));
                    };
                    let value = self.eval(value_expr)?;
                    if map.contains_key(&map_key) {
                        return Err(ExecutionError::new(
                            ExecutionErrorKind::DuplicateKey {
                                key: map_key.to_string(),
                            },
                            Some(key_expr.span.clone()),
                        ));
                    }
                    map.insert(map_key, value);
                }
                Ok(Value::from(map))
            }

            ExprKind::Unary { op, expr: operand } => {
                let value = self.eval(operand)?;
                Ok(operators::unary(*op, &value)?)
            }

            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(operators::binary(*op, &left, &right)?)
            }

            ExprKind::Comparison { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(operators::compare(*op, &left, &right)?)
            }

            ExprKind::Boolean { op, left, right } => self.eval_boolean(*op, left, right),

            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                // Only the selected branch is evaluated.
                if self.eval_bool("_?_:_", cond)? {
                    self.eval(then_branch)
                } else {
                    self.eval(else_branch)
                }
            }

            ExprKind::Field { value, field } => {
                let target = self.eval(value)?;
                match &target {
                    Value::Map(map) => map.get_str(field).cloned().ok_or_else(|| {
                        ExecutionErrorKind::KeyNotFound { key: field.clone() }.into()
                    }),
                    other => Err(
                        ExecutionErrorKind::no_overload(format!(".{}", field), &[other]).into(),
                    ),
                }
            }

            ExprKind::Index { value, index } => {
                let target = self.eval(value)?;
                let index = self.eval(index)?;
                Ok(index_value(&target, &index)?)
            }

            ExprKind::Has { value, field } => {
                let target = self.eval(value)?;
                match &target {
                    Value::Map(map) => Ok(Value::Bool(map.get_str(field).is_some())),
                    other => Err(ExecutionErrorKind::no_overload("has", &[other]).into()),
                }
            }

            ExprKind::Call {
                function,
                target,
                args,
            } => {
                let mut values = Vec::with_capacity(args.len() + 1);
                if let Some(target) = target {
                    values.push(self.eval(target)?);
                }
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                Ok(self.call(function, &values)?)
            }

            ExprKind::Comprehension(comprehension) => self.eval_comprehension(comprehension),
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, ExecutionErrorKind> {
        if let Some((_, value)) = self.scopes.iter().rev().find(|(var, _)| *var == name) {
            return Ok(value.clone());
        }
        if let Some(value) = self.bindings.variable(name) {
            return Ok(value.clone());
        }
        if let Some(function) = self.bindings.function(name) {
            return Ok(Value::function_ref(name, Some(function.arity())));
        }
        if let Some(builtin) = self.runtime.builtin(name) {
            return Ok(Value::function_ref(name, builtin.fixed_arity()));
        }
        Err(ExecutionErrorKind::UnknownIdentifier {
            name: name.to_string(),
        })
    }

    /// Invoke a bound function or builtin. For member calls the receiver is
    /// already the first argument.
    fn call(&self, name: &str, args: &[Value]) -> Result<Value, ExecutionErrorKind> {
        if let Some(function) = self.bindings.function(name) {
            if function.arity() != args.len() {
                return Err(ExecutionErrorKind::ArityMismatch {
                    name: name.to_string(),
                    expected: function.arity().to_string(),
                    got: args.len(),
                });
            }
            trace!(function = name, args = args.len(), "calling bound function");
            let failed = |message: String| ExecutionErrorKind::FunctionFailed {
                name: name.to_string(),
                message,
            };
            return match panic::catch_unwind(AssertUnwindSafe(|| function.call(args))) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(error)) => Err(failed(error.message)),
                Err(payload) => Err(failed(panic_message(payload.as_ref()))),
            };
        }

        if let Some(builtin) = self.runtime.builtin(name) {
            if !builtin.accepts(args.len()) {
                return Err(ExecutionErrorKind::ArityMismatch {
                    name: name.to_string(),
                    expected: builtin.arity_description(),
                    got: args.len(),
                });
            }
            trace!(function = name, args = args.len(), "calling builtin");
            return (builtin.function)(args);
        }

        Err(ExecutionErrorKind::UnknownFunction {
            name: name.to_string(),
        })
    }

    /// `&&` and `||`. Either side may decide the result, so an error on one
    /// side is discarded when the other side is decisive. Resource limits are
    /// never discarded.
    fn eval_boolean(
        &mut self,
        op: BoolOp,
        left: &'a Expr,
        right: &'a Expr,
    ) -> Result<Value, ExecutionError> {
        let (name, decisive) = match op {
            BoolOp::And => ("_&&_", false),
            BoolOp::Or => ("_||_", true),
        };

        let left = self.eval_bool(name, left);
        match &left {
            Ok(b) if *b == decisive => return Ok(Value::Bool(decisive)),
            Err(e) if e.is_resource_exceeded() => return left.map(Value::Bool),
            _ => {}
        }

        let right = self.eval_bool(name, right);
        match (left, right) {
            (_, Ok(b)) if b == decisive => Ok(Value::Bool(decisive)),
            (_, Err(e)) if e.is_resource_exceeded() => Err(e),
            (Err(e), _) | (_, Err(e)) => Err(e),
            (Ok(_), Ok(b)) => Ok(Value::Bool(b)),
        }
    }

    fn eval_bool(&mut self, operation: &str, expr: &'a Expr) -> Result<bool, ExecutionError> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(ExecutionError::new(
                ExecutionErrorKind::no_overload(operation, &[&other]),
                Some(expr.span.clone()),
            )),
        }
    }

    /// Evaluate `body` with `var` bound to `item`.
    fn eval_with(
        &mut self,
        var: &'a str,
        item: Value,
        body: &'a Expr,
    ) -> Result<Value, ExecutionError> {
        self.scopes.push((var, item));
        let result = self.eval(body);
        self.scopes.pop();
        result
    }

    fn eval_bool_with(
        &mut self,
        operation: &str,
        var: &'a str,
        item: Value,
        body: &'a Expr,
    ) -> Result<bool, ExecutionError> {
        self.scopes.push((var, item));
        let result = self.eval_bool(operation, body);
        self.scopes.pop();
        result
    }

    fn tick(&mut self, span: &crate::parser::Span) -> Result<(), ExecutionError> {
        self.iterations += 1;
        match self.options.max_iterations {
            Some(limit) if self.iterations > limit => Err(ExecutionError::new(
                ExecutionErrorKind::IterationLimitExceeded { limit },
                Some(span.clone()),
            )),
            _ => Ok(()),
        }
    }

    fn eval_comprehension(
        &mut self,
        comprehension: &'a Comprehension,
    ) -> Result<Value, ExecutionError> {
        let Comprehension {
            kind,
            range,
            var,
            filter,
            body,
        } = comprehension;
        let name = kind.name();

        let items: Vec<Value> = match self.eval(range)? {
            Value::List(items) => items.to_vec(),
            // Maps iterate over their keys.
            Value::Map(map) => map.keys().map(MapKey::to_value).collect(),
            other => {
                return Err(ExecutionError::new(
                    ExecutionErrorKind::no_overload(name, &[&other]),
                    Some(range.span.clone()),
                ));
            }
        };

        match kind {
            ComprehensionKind::All | ComprehensionKind::Exists => {
                // `all` stops at the first false, `exists` at the first true.
                // Errors only surface when no element decides the result.
                let decisive = *kind == ComprehensionKind::Exists;
                let mut deferred = None;
                for item in items {
                    self.tick(&body.span)?;
                    match self.eval_bool_with(name, var, item, body) {
                        Ok(b) if b == decisive => return Ok(Value::Bool(decisive)),
                        Ok(_) => {}
                        Err(e) if e.is_resource_exceeded() => return Err(e),
                        Err(e) => {
                            deferred.get_or_insert(e);
                        }
                    }
                }
                match deferred {
                    Some(e) => Err(e),
                    None => Ok(Value::Bool(!decisive)),
                }
            }

            ComprehensionKind::ExistsOne => {
                let mut count = 0usize;
                for item in items {
                    self.tick(&body.span)?;
                    if self.eval_bool_with(name, var, item, body)? {
                        count += 1;
                    }
                }
                Ok(Value::Bool(count == 1))
            }

            ComprehensionKind::Map => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    self.tick(&body.span)?;
                    if let Some(filter) = filter {
                        if !self.eval_bool_with(name, var, item.clone(), filter)? {
                            continue;
                        }
                    }
                    out.push(self.eval_with(var, item, body)?);
                }
                Ok(Value::from(out))
            }

            ComprehensionKind::Filter => {
                let mut out = Vec::new();
                for item in items {
                    self.tick(&body.span)?;
                    if self.eval_bool_with(name, var, item.clone(), body)? {
                        out.push(item);
                    }
                }
                Ok(Value::from(out))
            }
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
        Literal::Uint(u) => Value::Uint(*u),
        Literal::Float(f) => Value::Float(*f),
        Literal::Str(s) => Value::string(s.as_str()),
        Literal::Bytes(b) => Value::bytes(b.as_slice()),
    }
}

/// `target[index]` for lists and maps.
fn index_value(target: &Value, index: &Value) -> Result<Value, ExecutionErrorKind> {
    match target {
        Value::List(items) => {
            let position = match index {
                Value::Int(i) => usize::try_from(*i).ok(),
                Value::Uint(u) => usize::try_from(*u).ok(),
                Value::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Some(*f as usize),
                _ => return Err(ExecutionErrorKind::no_overload("_[_]", &[target, index])),
            };
            position
                .and_then(|p| items.get(p))
                .cloned()
                .ok_or_else(|| ExecutionErrorKind::IndexOutOfBounds {
                    index: index.to_string(),
                    len: items.len(),
                })
        }
        Value::Map(map) => {
            if MapKey::from_value(index).is_none() && !matches!(index, Value::Float(_)) {
                return Err(ExecutionErrorKind::no_overload("_[_]", &[target, index]));
            }
            operators::lookup(map, index)
                .cloned()
                .ok_or_else(|| ExecutionErrorKind::KeyNotFound {
                    key: index.to_string(),
                })
        }
        _ => Err(ExecutionErrorKind::no_overload("_[_]", &[target, index])),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "function panicked".to_string()
    }
}
