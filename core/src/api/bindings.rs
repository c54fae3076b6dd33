//! Per-execution bindings: named values and named host functions.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use tracing::trace;

use crate::api::FunctionError;
use crate::host::{CodecError, HostFunction, HostValue, decode, encode};
use crate::values::Value;

/// Trait for host functions callable from expressions.
///
/// Implementors are shared between threads, so they must be `Send + Sync`.
/// The evaluator checks the argument count against [`arity`](Function::arity)
/// before calling; for member calls the receiver is the first argument.
pub trait Function: Send + Sync {
    /// Number of arguments the function takes.
    fn arity(&self) -> usize;

    /// Call the function with already evaluated arguments.
    fn call(&self, args: &[Value]) -> Result<Value, FunctionError>;
}

type NativeCallback = dyn Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync;

/// Wrapper for Rust closures working on [`Value`]s.
///
/// # Example
///
/// ```
/// use celhost_core::api::{Function, NativeFunction};
/// use celhost_core::values::Value;
///
/// let double = NativeFunction::new(1, |args| match &args[0] {
///     Value::Int(i) => Ok(Value::Int(i * 2)),
///     other => Err(format!("expected int, got {}", other.type_name()).into()),
/// });
/// assert_eq!(double.call(&[Value::Int(4)]).unwrap(), Value::Int(8));
/// ```
pub struct NativeFunction {
    arity: usize,
    callback: Box<NativeCallback>,
}

impl NativeFunction {
    pub fn new<F>(arity: usize, callback: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        Self {
            arity,
            callback: Box::new(callback),
        }
    }
}

impl Function for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, args: &[Value]) -> Result<Value, FunctionError> {
        (self.callback)(args)
    }
}

/// Adapts a [`HostFunction`] to the [`Function`] trait: arguments are
/// encoded to host values and the result is decoded back.
pub struct HostFunctionAdapter {
    function: HostFunction,
}

impl HostFunctionAdapter {
    pub fn new(function: HostFunction) -> Self {
        Self { function }
    }
}

impl Function for HostFunctionAdapter {
    fn arity(&self) -> usize {
        self.function.arity()
    }

    fn call(&self, args: &[Value]) -> Result<Value, FunctionError> {
        let host_args: Vec<HostValue> = args.iter().map(encode).collect();
        let result = self.function.call(&host_args)?;
        decode(&result).map_err(|e| FunctionError::new(format!("invalid return value: {}", e)))
    }
}

/// Named values and functions supplied to one execution.
///
/// A name may hold a variable and a function at the same time: identifiers
/// resolve to the variable, calls to the function. Binding a name again
/// replaces the previous binding of the same sort.
///
/// # Example
///
/// ```
/// use celhost_core::api::BindingSet;
/// use celhost_core::host::HostValue;
/// use celhost_core::values::Value;
///
/// let mut bindings = BindingSet::new();
/// bindings.bind_value("limit", 10);
/// bindings.bind_param("ratio", HostValue::cel_float(4.0)).unwrap();
/// bindings.bind_func("twice", 1, |args| Ok(args[0].clone()));
///
/// assert_eq!(bindings.variable("ratio"), Some(&Value::Float(4.0)));
/// assert!(bindings.function("twice").is_some());
/// ```
#[derive(Clone, Default)]
pub struct BindingSet {
    variables: HashMap<String, Value>,
    functions: HashMap<String, Arc<dyn Function>>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to a runtime value.
    pub fn bind_value(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Bind a variable to a host value, converted through the codec.
    ///
    /// Fails when the host value cannot be represented, e.g. a malformed
    /// type pun. Nothing is bound on failure.
    pub fn bind_param(
        &mut self,
        name: impl Into<String>,
        value: HostValue,
    ) -> Result<&mut Self, CodecError> {
        let name = name.into();
        let value = decode(&value)?;
        trace!(name = %name, kind = value.type_name(), "bound parameter");
        self.variables.insert(name, value);
        Ok(self)
    }

    /// Bind a variable to a JSON document.
    pub fn bind_json(
        &mut self,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<&mut Self, CodecError> {
        self.bind_param(name, HostValue::from(value))
    }

    /// Bind a function working on runtime values.
    pub fn bind_func<F>(&mut self, name: impl Into<String>, arity: usize, callback: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.bind_function(name, NativeFunction::new(arity, callback))
    }

    /// Bind a function working on host values.
    pub fn bind_host_func<F>(
        &mut self,
        name: impl Into<String>,
        arity: usize,
        callback: F,
    ) -> &mut Self
    where
        F: Fn(&[HostValue]) -> Result<HostValue, FunctionError> + Send + Sync + 'static,
    {
        self.bind_function(
            name,
            HostFunctionAdapter::new(HostFunction::new(arity, callback)),
        )
    }

    /// Bind any [`Function`] implementation.
    pub fn bind_function(
        &mut self,
        name: impl Into<String>,
        function: impl Function + 'static,
    ) -> &mut Self {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions.get(name)
    }

    /// Names of bound variables, sorted.
    pub fn variable_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.variables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Names of bound functions, sorted.
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.functions.is_empty()
    }
}

impl fmt::Debug for BindingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingSet")
            .field("variables", &self.variables)
            .field("functions", &self.function_names())
            .finish()
    }
}
