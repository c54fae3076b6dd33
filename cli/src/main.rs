use celhost::{
    BindingSet, CodecError, CompileOptions, ContextOptions, ExecutionContext, ExecutionOptions,
    encode, render_error, render_runtime_error,
};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::io::BufRead;
use std::io::BufReader;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// celhost - Evaluate CEL-like expressions against JSON bindings
#[derive(Parser, Debug)]
#[command(name = "celhost")]
#[command(about = "Evaluate expressions with JSON bindings", long_about = None)]
struct Args {
    /// Bind a variable, e.g. `--bind 'user={"age": 42}'` (repeatable)
    #[arg(long = "bind", value_name = "NAME=JSON")]
    binds: Vec<String>,

    /// Read bindings from a JSON object file; each key becomes a variable
    #[arg(long, value_name = "FILE")]
    bindings: Option<PathBuf>,

    /// Print the referenced parameters instead of evaluating
    #[arg(long)]
    analyze: bool,

    /// Print the parsed AST (for debugging)
    #[arg(long)]
    debug_parse: bool,

    /// Maximum expression nesting accepted by the parser
    #[arg(long)]
    max_depth: Option<usize>,

    /// Maximum number of comprehension iterations per evaluation
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Expression to evaluate (if not provided, reads one per line from stdin)
    expression: Option<String>,
}

#[derive(Debug, Error)]
enum BindingError {
    #[error("invalid binding '{0}', expected NAME=JSON")]
    Syntax(String),

    #[error("invalid JSON for binding '{name}': {source}")]
    Json {
        name: String,
        source: serde_json::Error,
    },

    #[error("cannot read bindings file {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("bindings file {0} must contain a JSON object")]
    NotAnObject(PathBuf),

    #[error("cannot bind '{name}': {source}")]
    Codec { name: String, source: CodecError },
}

fn bind(bindings: &mut BindingSet, name: &str, json: serde_json::Value) -> Result<(), BindingError> {
    bindings
        .bind_json(name, json)
        .map_err(|source| BindingError::Codec {
            name: name.to_string(),
            source,
        })?;
    Ok(())
}

fn load_bindings(args: &Args) -> Result<BindingSet, BindingError> {
    let mut bindings = BindingSet::new();

    if let Some(path) = &args.bindings {
        let text = std::fs::read_to_string(path).map_err(|source| BindingError::File {
            path: path.clone(),
            source,
        })?;
        let json: serde_json::Value =
            serde_json::from_str(&text).map_err(|source| BindingError::Json {
                name: path.display().to_string(),
                source,
            })?;
        let serde_json::Value::Object(entries) = json else {
            return Err(BindingError::NotAnObject(path.clone()));
        };
        for (name, value) in entries {
            bind(&mut bindings, &name, value)?;
        }
    }

    // Command line bindings override the file.
    for binding in &args.binds {
        let (name, json) = binding
            .split_once('=')
            .ok_or_else(|| BindingError::Syntax(binding.clone()))?;
        let json = serde_json::from_str(json).map_err(|source| BindingError::Json {
            name: name.to_string(),
            source,
        })?;
        bind(&mut bindings, name, json)?;
    }

    debug!(variables = ?bindings.variable_names(), "loaded bindings");
    Ok(bindings)
}

/// Evaluate one expression. Returns false if it failed.
fn interpret_input(
    context: &ExecutionContext,
    bindings: &BindingSet,
    input: &str,
    args: &Args,
) -> Result<bool> {
    let program = match context.compile_anonymous(input) {
        Ok(program) => program,
        Err(e) => {
            render_error(&e);
            return Ok(false);
        }
    };

    if args.debug_parse {
        println!("=== Parsed AST ===");
        println!("{:#?}", program.expr());
        println!();
    }

    if args.analyze {
        let details = serde_json::to_string_pretty(&program.details()).into_diagnostic()?;
        println!("{}", details);
        return Ok(true);
    }

    match program.execute(bindings, &context.options().execution) {
        Ok(value) => {
            let json = serde_json::Value::from(encode(&value));
            println!("{}", json);
            Ok(true)
        }
        Err(e) => {
            render_runtime_error(input, &e);
            Ok(false)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use RUST_LOG to control log level, defaulting to WARN
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut options = ContextOptions::default();
    if let Some(max_depth) = args.max_depth {
        options.compile = CompileOptions { max_depth };
    }
    options.execution = ExecutionOptions {
        max_iterations: args.max_iterations,
        ..ExecutionOptions::default()
    };
    let context = ExecutionContext::with_options(options);
    let bindings = load_bindings(&args).into_diagnostic()?;

    let mut all_ok = true;
    if let Some(expr) = &args.expression {
        all_ok = interpret_input(&context, &bindings, expr, &args)?;
    } else {
        let stdin = std::io::stdin();
        let reader = BufReader::new(stdin.lock());

        for line in reader.lines() {
            let line = line.into_diagnostic()?;
            if line.trim().is_empty() {
                continue;
            }
            all_ok &= interpret_input(&context, &bindings, &line, &args)?;
        }
    }

    if !all_ok {
        std::process::exit(1);
    }
    Ok(())
}
