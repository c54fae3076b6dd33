//! Expression language behavior, table driven.

use celhost_core::api::{BindingSet, ErrorKind, ExecutionContext};
use celhost_core::values::Value;

fn eval(source: &str) -> Result<Value, ErrorKind> {
    ExecutionContext::new()
        .eval(source, BindingSet::new())
        .into_result()
        .map_err(|e| e.kind())
}

#[test]
fn expressions_evaluate_to_true() {
    let cases = [
        "1 + 2 * 3 == 7",
        "-(2 + 3) == -5",
        "!false",
        "0x10 == 16",
        "10u / 3u == 3u",
        "1e3 == 1000.0",
        "'a' + \"b\" == 'ab'",
        "r'\\n' == '\\\\n'",
        "'''multi\nline''' == 'multi\\nline'",
        "b'\\xff' != b'\\x00'",
        "'\\u00e9' == 'é'",
        "size('é') == 1 && size(b'\\xc3\\xa9') == 2",
        "[1, 2, 3][1] == 2",
        "{'k': [1, {'n': true}]}['k'][1].n",
        "2 in [1, 2] && 'a' in {'a': 0}",
        "1 < 2 ? true : false",
        "(false ? 1 : true ? 2 : 3) == 2",
        "int('42') == 42 && uint(42) == 42u && double(1) == 1.0",
        "string(12) == '12' && bool('true')",
        "type(1) == 'int' && type('') == 'string' && type([]) == 'list'",
        "'abc'.contains('b') && 'abc'.startsWith('a') && 'abc'.endsWith('c')",
        "' x '.trim() == 'x' && 'Ab'.toLower() == 'ab' && 'Ab'.toUpper() == 'AB'",
        "'a,b'.split(',') == ['a', 'b']",
        "abs(-3) == 3 && floor(1.5) == 1.0 && ceil(1.5) == 2.0 && round(1.5) == 2.0",
        "sqrt(9) == 3.0 && pow(2, 3) == 8.0",
        "min(3, 1, 2) == 1 && max([3, 1, 2]) == 3",
        "duration('1h30m') == duration('90m')",
        "duration('1.5s') == duration('1500ms')",
        "timestamp('2024-01-01T00:00:00Z') + duration('24h') == timestamp('2024-01-02T00:00:00Z')",
        "timestamp('2024-01-02T00:00:00Z') - timestamp('2024-01-01T00:00:00Z') == duration('24h')",
        "timestamp('2024-07-04T10:00:00Z').getMonth() == 6",
        "duration('3h').getMinutes() == 180",
        "[1, 2, 3].all(x, x > 0) && [1, 2, 3].exists(x, x == 3)",
        "[1, 2, 3].exists_one(x, x == 2)",
        "[1, 2, 3].filter(x, x != 2) == [1, 3]",
        "[1, 2, 3].map(x, x * 2) == [2, 4, 6]",
        "{'a': 1, 'b': 2}.all(k, k in ['a', 'b'])",
        "has({'a': 1}.a) && !has({'a': 1}.b)",
        "[] == [] && {} == {}",
        "null == null",
        "-9223372036854775808 == -9223372036854775807 - 1",
        "1 == 1u && 1u == 1.0",
        "// comment\n true",
    ];
    for source in cases {
        assert_eq!(
            eval(source),
            Ok(Value::Bool(true)),
            "expression should be true: {}",
            source
        );
    }
}

#[test]
fn expressions_fail_with_kind() {
    let cases = [
        ("1 +", ErrorKind::SyntaxError),
        ("(1", ErrorKind::SyntaxError),
        ("'unterminated", ErrorKind::SyntaxError),
        ("'\\q'", ErrorKind::SyntaxError),
        ("99999999999999999999", ErrorKind::SyntaxError),
        ("9223372036854775808", ErrorKind::SyntaxError),
        ("-9223372036854775808 - 1", ErrorKind::RuntimeError),
        ("[1].all(1, true)", ErrorKind::SyntaxError),
        ("1 + true", ErrorKind::TypeError),
        ("-'a'", ErrorKind::TypeError),
        ("!1", ErrorKind::TypeError),
        ("1.0 % 2.0", ErrorKind::TypeError),
        ("x", ErrorKind::UnknownIdentifier),
        ("f()", ErrorKind::UnknownFunction),
        ("size()", ErrorKind::ArityMismatch),
        ("duration('soon')", ErrorKind::ValueError),
        ("uint(-1)", ErrorKind::ValueError),
        ("-9223372036854775807 - 2", ErrorKind::RuntimeError),
        ("{'a': 1}.b", ErrorKind::RuntimeError),
        ("{'a': 1, 'a': 2}", ErrorKind::RuntimeError),
    ];
    for (source, kind) in cases {
        assert_eq!(eval(source), Err(kind), "unexpected result for: {}", source);
    }
}

#[test]
fn deep_nesting_is_rejected_at_compile_time() {
    let source = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
    assert_eq!(eval(&source), Err(ErrorKind::SyntaxError));

    let source = format!("{}true", "!".repeat(10_000));
    assert_eq!(eval(&source), Err(ErrorKind::SyntaxError));

    let source = format!("1{}", " + 1".repeat(10_000));
    assert_eq!(eval(&source), Err(ErrorKind::SyntaxError));

    let source = format!("{}0", "true ? 1 : ".repeat(10_000));
    assert_eq!(eval(&source), Err(ErrorKind::SyntaxError));
}
