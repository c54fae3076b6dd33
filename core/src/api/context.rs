//! Named program storage and execution.

use std::sync::Arc;

use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::api::{
    BindingSet, CompileError, ContextOptions, DetailResult, EvalError, EvalResult, Program,
    ProgramDetails, Runtime,
};

/// A set of named, compiled programs.
///
/// Compiling or adding programs needs `&mut self`; executing only needs
/// `&self`. Contexts are independent of each other: programs, bindings and
/// results are never shared between them.
///
/// # Example
///
/// ```
/// use celhost_core::api::{BindingSet, ExecutionContext};
/// use celhost_core::values::Value;
///
/// let mut context = ExecutionContext::new();
/// context.compile("total", "price * qty").unwrap();
///
/// let mut bindings = BindingSet::new();
/// bindings.bind_value("price", 3).bind_value("qty", 4);
///
/// let result = context.exec("total", bindings);
/// assert_eq!(result.unwrap_value(), Value::Int(12));
/// ```
#[derive(Debug)]
pub struct ExecutionContext {
    runtime: &'static Runtime,
    options: ContextOptions,
    programs: HashMap<String, Arc<Program>>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::with_options(ContextOptions::default())
    }

    pub fn with_options(options: ContextOptions) -> Self {
        Self {
            runtime: Runtime::initialize(),
            options,
            programs: HashMap::new(),
        }
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    pub fn runtime(&self) -> &'static Runtime {
        self.runtime
    }

    /// Compile `source` and store it under `name`, replacing any program
    /// already stored there. On failure nothing is stored.
    pub fn compile(&mut self, name: impl Into<String>, source: &str) -> Result<(), CompileError> {
        let name = name.into();
        let program = self.compile_anonymous(source)?;
        self.add_program(name, program);
        Ok(())
    }

    /// Store an already compiled program under `name`.
    pub fn add_program(&mut self, name: impl Into<String>, program: impl Into<Arc<Program>>) {
        let name = name.into();
        let program = program.into();
        debug!(name = %name, params = ?program.params(), "adding program");
        if self.programs.insert(name.clone(), program).is_some() {
            warn!(name = %name, "replaced existing program");
        }
    }

    /// Load a program serialized with [`Program::to_json`] and store it
    /// under `name`. The context's depth limit applies to the loaded tree.
    pub fn add_serialized(
        &mut self,
        name: impl Into<String>,
        json: &str,
    ) -> Result<(), CompileError> {
        let program = Program::from_json_with_options(json, &self.options.compile)
            .inspect_err(|error| debug!(error = %error.message(), "loading program failed"))?;
        self.add_program(name, program);
        Ok(())
    }

    /// Compile without storing.
    pub fn compile_anonymous(&self, source: &str) -> Result<Program, CompileError> {
        let result = Program::compile_with_options(source, &self.options.compile);
        if let Err(error) = &result {
            debug!(error = %error.message(), "compilation failed");
        }
        result
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<Program>> {
        self.programs.remove(name)
    }

    pub fn program(&self, name: &str) -> Option<&Arc<Program>> {
        self.programs.get(name)
    }

    /// Names of stored programs, sorted.
    pub fn program_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.programs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn program_details(&self, name: &str) -> Option<ProgramDetails> {
        self.programs.get(name).map(|program| program.details())
    }

    /// Execute the program stored under `name`.
    pub fn exec(&self, name: &str, bindings: BindingSet) -> EvalResult {
        match self.programs.get(name) {
            Some(program) => {
                debug!(name, "executing program");
                self.exec_program(program, bindings)
            }
            None => {
                debug!(name, "unknown program");
                EvalResult::Failure(EvalError::unknown_program(name))
            }
        }
    }

    /// Execute a program that is not stored in this context.
    pub fn exec_program(&self, program: &Program, bindings: BindingSet) -> EvalResult {
        let result = program
            .execute(&bindings, &self.options.execution)
            .map_err(EvalError::from);
        if let Err(error) = &result {
            debug!(source = program.source(), error = %error, "execution failed");
        }
        result.into()
    }

    /// Compile and execute `source` in one step.
    pub fn eval(&self, source: &str, bindings: BindingSet) -> EvalResult {
        match self.compile_anonymous(source) {
            Ok(program) => self.exec_program(&program, bindings),
            Err(error) => EvalResult::Failure(error.into()),
        }
    }

    /// Compile `source` and report its free variables. Nothing is executed.
    pub fn analyze(&self, source: &str) -> DetailResult {
        self.compile_anonymous(source)
            .map(|program| program.details())
            .map_err(EvalError::from)
            .into()
    }
}
