use pretty_assertions::assert_eq;

use crate::parser::{
    DEFAULT_MAX_DEPTH, Literal, PostorderNode, Span, from_postorder, parse, to_postorder,
};

fn rebuild(source: &str) {
    let expr = parse(source).unwrap();
    let nodes = to_postorder(&expr);
    let rebuilt = from_postorder(nodes, DEFAULT_MAX_DEPTH).unwrap();
    assert_eq!(rebuilt, expr, "{}", source);
    assert_eq!(rebuilt.span, expr.span, "{}", source);
}

#[test]
fn test_rebuilds_every_node_kind() {
    for source in [
        "null",
        "x",
        "[1, 2u, 3.5]",
        "{'a': b'x', 1: true}",
        "-x",
        "!x",
        "a + b * c",
        "a && b || c",
        "a < b",
        "x in [1]",
        "a ? b : c",
        "a.b.c",
        "a[0]",
        "size(a)",
        "a.startsWith('x')",
        "has(a.b)",
        "[1, 2].all(x, x > 0)",
        "[1, 2].map(x, x > 1, x * 2)",
        "[]",
        "{}",
    ] {
        rebuild(source);
    }
}

#[test]
fn test_operands_precede_their_node() {
    let nodes = to_postorder(&parse("1 + x").unwrap());
    assert_eq!(
        nodes,
        vec![
            PostorderNode::Literal {
                value: Literal::Int(1),
                span: Span::new(0, 1),
            },
            PostorderNode::Ident {
                name: "x".to_string(),
                span: Span::new(4, 5),
            },
            PostorderNode::Binary {
                op: crate::parser::BinaryOp::Add,
                span: Span::new(0, 5),
            },
        ]
    );
}

#[test]
fn test_rejects_missing_and_leftover_operands() {
    let missing = vec![PostorderNode::Ternary {
        span: Span::default(),
    }];
    assert!(from_postorder(missing, DEFAULT_MAX_DEPTH).is_err());

    let leftover = vec![
        PostorderNode::Ident {
            name: "a".to_string(),
            span: Span::default(),
        },
        PostorderNode::Ident {
            name: "b".to_string(),
            span: Span::default(),
        },
    ];
    assert!(from_postorder(leftover, DEFAULT_MAX_DEPTH).is_err());

    assert!(from_postorder(vec![], DEFAULT_MAX_DEPTH).is_err());

    let huge_map = vec![PostorderNode::Map {
        len: usize::MAX,
        span: Span::default(),
    }];
    assert!(from_postorder(huge_map, DEFAULT_MAX_DEPTH).is_err());
}

#[test]
fn test_rejects_trees_deeper_than_max_depth() {
    let mut nodes = vec![PostorderNode::Ident {
        name: "x".to_string(),
        span: Span::default(),
    }];
    for _ in 0..10_000 {
        nodes.push(PostorderNode::Field {
            field: "b".to_string(),
            span: Span::default(),
        });
    }

    let error = from_postorder(nodes.clone(), DEFAULT_MAX_DEPTH).unwrap_err();
    assert!(error.contains("nesting"), "{}", error);
    assert!(from_postorder(nodes[..4].to_vec(), 3).is_ok());
    assert!(from_postorder(nodes[..5].to_vec(), 3).is_err());
}
