use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::api::CompileOptions;
use crate::host::HostValue;
use crate::test_utils::init_test_logging;
use crate::values::Value;

#[test]
fn test_compile_and_exec() {
    init_test_logging();
    let mut context = ExecutionContext::new();
    context.compile("sum", "3+3").unwrap();
    assert_eq!(context.exec("sum", BindingSet::new()), EvalResult::Success(Value::Int(6)));
}

#[test]
fn test_exec_unknown_program() {
    let context = ExecutionContext::new();
    let error = context.exec("nothing", BindingSet::new()).unwrap_error();
    assert_eq!(error.kind(), ErrorKind::UnknownProgram);
    assert_eq!(error.to_string(), "UnknownProgram: no program named 'nothing'");
}

#[test]
fn test_compile_failure_stores_nothing() {
    let mut context = ExecutionContext::new();
    let error = context.compile("broken", "3 +").unwrap_err();
    assert_eq!(error.error_count(), 1);
    assert!(context.program("broken").is_none());
    assert_eq!(
        context.exec("broken", BindingSet::new()).unwrap_error().kind(),
        ErrorKind::UnknownProgram
    );
}

#[test]
fn test_recompile_replaces_program() {
    let mut context = ExecutionContext::new();
    context.compile("p", "1").unwrap();
    context.compile("p", "2").unwrap();
    assert_eq!(context.program_names(), ["p"]);
    assert_eq!(context.exec("p", BindingSet::new()).unwrap_value(), Value::Int(2));
}

#[test]
fn test_add_program_shares_ownership() {
    let program = Arc::new(Program::compile("x * 2").unwrap());
    let mut context = ExecutionContext::new();
    context.add_program("double", Arc::clone(&program));
    context.add_program("also_double", Program::compile("x * 2").unwrap());

    assert!(Arc::ptr_eq(context.program("double").unwrap(), &program));
    assert_eq!(context.program_names(), ["also_double", "double"]);

    let mut bindings = BindingSet::new();
    bindings.bind_value("x", 21);
    assert_eq!(context.exec("double", bindings).unwrap_value(), Value::Int(42));
}

#[test]
fn test_remove_program() {
    let mut context = ExecutionContext::new();
    context.compile("p", "1").unwrap();
    let removed = context.remove("p").unwrap();
    assert_eq!(removed.source(), "1");
    assert!(context.remove("p").is_none());
    assert!(context.program_names().is_empty());
}

#[test]
fn test_compile_anonymous_and_exec_program() {
    let context = ExecutionContext::new();
    let program = context.compile_anonymous("a + b").unwrap();
    assert!(context.program_names().is_empty());

    let mut bindings = BindingSet::new();
    bindings.bind_value("a", "x").bind_value("b", "y");
    assert_eq!(
        context.exec_program(&program, bindings).unwrap_value(),
        Value::from("xy")
    );
}

#[test]
fn test_eval_one_shot() {
    let context = ExecutionContext::new();
    assert_eq!(
        context.eval("[1, 2, 3].map(x, x * x)", BindingSet::new()).unwrap_value(),
        Value::list([Value::Int(1), Value::Int(4), Value::Int(9)])
    );
    assert_eq!(
        context.eval("(", BindingSet::new()).unwrap_error().kind(),
        ErrorKind::SyntaxError
    );
}

#[test]
fn test_exec_with_different_bindings_do_not_interfere() {
    let mut context = ExecutionContext::new();
    context.compile("p", "foo.bar").unwrap();

    let mut first = BindingSet::new();
    first
        .bind_param("foo", HostValue::record([("bar", HostValue::Number(4.0))]))
        .unwrap();
    let mut second = BindingSet::new();
    second
        .bind_param(
            "foo",
            HostValue::record([("bar", HostValue::record([("baz", HostValue::Number(3.0))]))]),
        )
        .unwrap();

    assert_eq!(context.exec("p", first).unwrap_value(), Value::Int(4));
    assert_eq!(
        context.exec("p", second).unwrap_value(),
        Value::record([("baz", Value::Int(3))])
    );
}

#[test]
fn test_error_kinds() {
    let context = ExecutionContext::new();
    let kind = |source: &str| context.eval(source, BindingSet::new()).unwrap_error().kind();

    assert_eq!(kind("1 + 'a'"), ErrorKind::TypeError);
    assert_eq!(kind("missing"), ErrorKind::UnknownIdentifier);
    assert_eq!(kind("missing()"), ErrorKind::UnknownFunction);
    assert_eq!(kind("size(1, 2)"), ErrorKind::ArityMismatch);
    assert_eq!(kind("int('x')"), ErrorKind::ValueError);
    assert_eq!(kind("1 / 0"), ErrorKind::RuntimeError);
    assert_eq!(kind("[1][5]"), ErrorKind::RuntimeError);
}

#[test]
fn test_function_errors() {
    let context = ExecutionContext::new();

    let mut bindings = BindingSet::new();
    bindings.bind_func("fail", 0, |_| Err(FunctionError::new("no luck")));
    let error = context.eval("fail()", bindings).unwrap_error();
    assert_eq!(error.kind(), ErrorKind::FunctionError);
    assert!(error.message().contains("no luck"), "{}", error);

    let mut bindings = BindingSet::new();
    bindings.bind_func("pair", 2, |args| Ok(args[0].clone()));
    let error = context.eval("pair(1)", bindings).unwrap_error();
    assert_eq!(error.kind(), ErrorKind::ArityMismatch);
}

#[test]
fn test_analyze() {
    let context = ExecutionContext::new();
    let details = context.analyze("3 + foo").unwrap_details();
    assert_eq!(details.params, ["foo"]);
    assert_eq!(details.source, "3 + foo");

    let error = context.analyze("3 +").unwrap_error();
    assert_eq!(error.kind(), ErrorKind::SyntaxError);
}

#[test]
fn test_analyze_does_not_execute() {
    let context = ExecutionContext::new();
    let details = context.analyze("1 / 0 + undefined_fn(x)").unwrap_details();
    assert_eq!(details.params, ["x"]);
}

#[test]
fn test_program_details() {
    let mut context = ExecutionContext::new();
    context.compile("p", "a + b + a").unwrap();
    assert_eq!(
        context.program_details("p"),
        Some(ProgramDetails {
            source: "a + b + a".to_string(),
            params: vec!["a".to_string(), "b".to_string()],
        })
    );
    assert_eq!(context.program_details("q"), None);
}

#[test]
fn test_compile_depth_limit() {
    let mut context = ExecutionContext::with_options(ContextOptions {
        compile: CompileOptions { max_depth: 3 },
        ..ContextOptions::default()
    });
    assert!(context.compile("ok", "[[1]]").is_ok());
    let error = context.compile("deep", "[[[[1]]]]").unwrap_err();
    assert_eq!(error.diagnostics[0].code.as_deref(), Some("P004"));
}

#[test]
fn test_long_chains_fail_to_compile() {
    let context = ExecutionContext::new();
    let sources = [
        format!("1{}", "+1".repeat(10_000)),
        format!("a{}", ".b".repeat(10_000)),
    ];
    for source in &sources {
        let error = context.analyze(source).unwrap_error();
        assert_eq!(error.kind(), ErrorKind::SyntaxError);
        assert_eq!(
            context.eval(source, BindingSet::new()).unwrap_error().kind(),
            ErrorKind::SyntaxError
        );
    }
}

#[test]
fn test_execution_depth_limit() {
    let context = ExecutionContext::with_options(ContextOptions {
        execution: ExecutionOptions {
            max_depth: 3,
            max_iterations: None,
        },
        ..ContextOptions::default()
    });
    let error = context.eval("1 + 2 + 3 + 4", BindingSet::new()).unwrap_error();
    assert_eq!(error.kind(), ErrorKind::ResourceExceeded);
}

#[test]
fn test_add_serialized_program() {
    init_test_logging();
    let mut source_context = ExecutionContext::new();
    source_context.compile("rule", "user.age >= min").unwrap();
    let json = source_context.program("rule").unwrap().to_json().unwrap();

    let mut context = ExecutionContext::new();
    context.add_serialized("rule", &json).unwrap();
    assert_eq!(
        context.program_details("rule").unwrap().params,
        ["user", "min"]
    );

    let mut bindings = BindingSet::new();
    bindings.bind_value("min", 18);
    bindings
        .bind_json("user", serde_json::json!({"age": 42}))
        .unwrap();
    assert_eq!(
        context.exec("rule", bindings),
        EvalResult::Success(Value::Bool(true))
    );
}

#[test]
fn test_add_serialized_rejects_bad_input() {
    let mut context = ExecutionContext::with_options(ContextOptions {
        compile: CompileOptions { max_depth: 2 },
        ..ContextOptions::default()
    });
    let json = Program::compile("[[[1]]]").unwrap().to_json().unwrap();

    assert!(context.add_serialized("deep", &json).is_err());
    assert!(context.add_serialized("broken", "{").is_err());
    assert!(context.program_names().is_empty());
}

#[test]
fn test_context_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<ExecutionContext>();
    assert_send::<Program>();
}

#[test]
fn test_independent_contexts_on_threads() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let mut context = ExecutionContext::new();
                context.compile("p", "n * n").unwrap();
                let mut bindings = BindingSet::new();
                bindings.bind_value("n", i as i64);
                context.exec("p", bindings).unwrap_value()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Value::Int((i * i) as i64));
    }
}
