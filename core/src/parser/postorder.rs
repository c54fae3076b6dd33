//! Flat encoding of expression trees.
//!
//! A tree is written as a list of nodes in postorder, each node after its
//! operands, so the serialized form nests a fixed number of levels however
//! deep the tree is. Decoding rebuilds the tree with an explicit stack and
//! applies the same depth bound as the parser.

use serde::{Deserialize, Serialize};

use crate::parser::{
    BinaryOp, BoolOp, ComparisonOp, Comprehension, ComprehensionKind, Expr, ExprKind, Literal,
    Span, UnaryOp,
};

/// One node of a postorder encoded tree. Operands are the nodes left on the
/// stack by the preceding entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum PostorderNode {
    Literal {
        value: Literal,
        span: Span,
    },
    Ident {
        name: String,
        span: Span,
    },
    List {
        len: usize,
        span: Span,
    },
    /// Operands are `len` key and value pairs.
    Map {
        len: usize,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        span: Span,
    },
    Boolean {
        op: BoolOp,
        span: Span,
    },
    Comparison {
        op: ComparisonOp,
        span: Span,
    },
    Ternary {
        span: Span,
    },
    Field {
        field: String,
        span: Span,
    },
    Index {
        span: Span,
    },
    /// Operands are the target, when present, followed by the arguments.
    Call {
        function: String,
        has_target: bool,
        args: usize,
        span: Span,
    },
    Has {
        field: String,
        span: Span,
    },
    /// Operands are the range, the filter when present, then the body.
    Comprehension {
        kind: ComprehensionKind,
        var: String,
        has_filter: bool,
        span: Span,
    },
}

/// Flatten `expr` into postorder.
pub fn to_postorder(expr: &Expr) -> Vec<PostorderNode> {
    let mut nodes = Vec::new();
    push_postorder(expr, &mut nodes);
    nodes
}

// Trees only come from the parser or `from_postorder`, so the recursion is
// bounded by their depth limit.
fn push_postorder(expr: &Expr, out: &mut Vec<PostorderNode>) {
    let span = expr.span.clone();
    let node = match &expr.kind {
        ExprKind::Literal(value) => PostorderNode::Literal {
            value: value.clone(),
            span,
        },
        ExprKind::Ident(name) => PostorderNode::Ident {
            name: name.clone(),
            span,
        },
        ExprKind::List(items) => {
            items.iter().for_each(|item| push_postorder(item, out));
            PostorderNode::List {
                len: items.len(),
                span,
            }
        }
        ExprKind::Map(entries) => {
            for (key, value) in entries {
                push_postorder(key, out);
                push_postorder(value, out);
            }
            PostorderNode::Map {
                len: entries.len(),
                span,
            }
        }
        ExprKind::Unary { op, expr } => {
            push_postorder(expr, out);
            PostorderNode::Unary { op: *op, span }
        }
        ExprKind::Binary { op, left, right } => {
            push_postorder(left, out);
            push_postorder(right, out);
            PostorderNode::Binary { op: *op, span }
        }
        ExprKind::Boolean { op, left, right } => {
            push_postorder(left, out);
            push_postorder(right, out);
            PostorderNode::Boolean { op: *op, span }
        }
        ExprKind::Comparison { op, left, right } => {
            push_postorder(left, out);
            push_postorder(right, out);
            PostorderNode::Comparison { op: *op, span }
        }
        ExprKind::Ternary {
            cond,
            then_branch,
            else_branch,
        } => {
            push_postorder(cond, out);
            push_postorder(then_branch, out);
            push_postorder(else_branch, out);
            PostorderNode::Ternary { span }
        }
        ExprKind::Field { value, field } => {
            push_postorder(value, out);
            PostorderNode::Field {
                field: field.clone(),
                span,
            }
        }
        ExprKind::Index { value, index } => {
            push_postorder(value, out);
            push_postorder(index, out);
            PostorderNode::Index { span }
        }
        ExprKind::Call {
            function,
            target,
            args,
        } => {
            if let Some(target) = target {
                push_postorder(target, out);
            }
            args.iter().for_each(|arg| push_postorder(arg, out));
            PostorderNode::Call {
                function: function.clone(),
                has_target: target.is_some(),
                args: args.len(),
                span,
            }
        }
        ExprKind::Has { value, field } => {
            push_postorder(value, out);
            PostorderNode::Has {
                field: field.clone(),
                span,
            }
        }
        ExprKind::Comprehension(comprehension) => {
            let Comprehension {
                kind,
                range,
                var,
                filter,
                body,
            } = comprehension.as_ref();
            push_postorder(range, out);
            if let Some(filter) = filter {
                push_postorder(filter, out);
            }
            push_postorder(body, out);
            PostorderNode::Comprehension {
                kind: *kind,
                var: var.clone(),
                has_filter: filter.is_some(),
                span,
            }
        }
    };
    out.push(node);
}

/// Rebuild a tree from postorder nodes.
///
/// Fails when a node is missing operands, when nodes are left over, or when
/// the tree is deeper than `max_depth`.
pub fn from_postorder(nodes: Vec<PostorderNode>, max_depth: usize) -> Result<Expr, String> {
    // Each entry carries the height of its subtree; leaves have height 0.
    let mut stack: Vec<(Expr, usize)> = Vec::new();

    for node in nodes {
        let (kind, span, child_height) = match node {
            PostorderNode::Literal { value, span } => {
                stack.push((Expr::new(ExprKind::Literal(value), span), 0));
                continue;
            }
            PostorderNode::Ident { name, span } => {
                stack.push((Expr::new(ExprKind::Ident(name), span), 0));
                continue;
            }
            PostorderNode::List { len, span } => {
                let (items, height) = pop_n(&mut stack, len)?;
                (ExprKind::List(items), span, height)
            }
            PostorderNode::Map { len, span } => {
                let operands = len
                    .checked_mul(2)
                    .ok_or_else(|| format!("map with {} entries is too large", len))?;
                let (items, height) = pop_n(&mut stack, operands)?;
                let mut items = items.into_iter();
                let mut entries = Vec::with_capacity(len);
                while let (Some(key), Some(value)) = (items.next(), items.next()) {
                    entries.push((key, value));
                }
                (ExprKind::Map(entries), span, height)
            }
            PostorderNode::Unary { op, span } => {
                let ([expr], height) = pop_array(&mut stack)?;
                let kind = ExprKind::Unary {
                    op,
                    expr: Box::new(expr),
                };
                (kind, span, height)
            }
            PostorderNode::Binary { op, span } => {
                let ([left, right], height) = pop_array(&mut stack)?;
                let kind = ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                };
                (kind, span, height)
            }
            PostorderNode::Boolean { op, span } => {
                let ([left, right], height) = pop_array(&mut stack)?;
                let kind = ExprKind::Boolean {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                };
                (kind, span, height)
            }
            PostorderNode::Comparison { op, span } => {
                let ([left, right], height) = pop_array(&mut stack)?;
                let kind = ExprKind::Comparison {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                };
                (kind, span, height)
            }
            PostorderNode::Ternary { span } => {
                let ([cond, then_branch, else_branch], height) = pop_array(&mut stack)?;
                let kind = ExprKind::Ternary {
                    cond: Box::new(cond),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                };
                (kind, span, height)
            }
            PostorderNode::Field { field, span } => {
                let ([value], height) = pop_array(&mut stack)?;
                let kind = ExprKind::Field {
                    value: Box::new(value),
                    field,
                };
                (kind, span, height)
            }
            PostorderNode::Index { span } => {
                let ([value, index], height) = pop_array(&mut stack)?;
                let kind = ExprKind::Index {
                    value: Box::new(value),
                    index: Box::new(index),
                };
                (kind, span, height)
            }
            PostorderNode::Call {
                function,
                has_target,
                args,
                span,
            } => {
                let operands = args
                    .checked_add(usize::from(has_target))
                    .ok_or_else(|| format!("call to '{}' has too many arguments", function))?;
                let (items, height) = pop_n(&mut stack, operands)?;
                let mut items = items.into_iter();
                let target = if has_target {
                    items.next().map(Box::new)
                } else {
                    None
                };
                let kind = ExprKind::Call {
                    function,
                    target,
                    args: items.collect(),
                };
                (kind, span, height)
            }
            PostorderNode::Has { field, span } => {
                let ([value], height) = pop_array(&mut stack)?;
                let kind = ExprKind::Has {
                    value: Box::new(value),
                    field,
                };
                (kind, span, height)
            }
            PostorderNode::Comprehension {
                kind,
                var,
                has_filter,
                span,
            } => {
                let (comprehension, height) = if has_filter {
                    let ([range, filter, body], height) = pop_array(&mut stack)?;
                    (build_comprehension(kind, range, var, Some(filter), body), height)
                } else {
                    let ([range, body], height) = pop_array(&mut stack)?;
                    (build_comprehension(kind, range, var, None, body), height)
                };
                (ExprKind::Comprehension(Box::new(comprehension)), span, height)
            }
        };

        let height = child_height + 1;
        if height > max_depth {
            return Err(format!(
                "expression nesting exceeds maximum of {} levels",
                max_depth
            ));
        }
        stack.push((Expr::new(kind, span), height));
    }

    match (stack.pop(), stack.is_empty()) {
        (Some((expr, _)), true) => Ok(expr),
        (None, _) => Err("expression is empty".to_string()),
        (Some(_), false) => Err(format!("{} nodes have no parent", stack.len() + 1)),
    }
}

fn build_comprehension(
    kind: ComprehensionKind,
    range: Expr,
    var: String,
    filter: Option<Expr>,
    body: Expr,
) -> Comprehension {
    Comprehension {
        kind,
        range,
        var,
        filter,
        body,
    }
}

/// Pop the last `n` subtrees in order, with the greatest of their heights.
fn pop_n(stack: &mut Vec<(Expr, usize)>, n: usize) -> Result<(Vec<Expr>, usize), String> {
    let start = stack
        .len()
        .checked_sub(n)
        .ok_or_else(|| format!("node expects {} operands, found {}", n, stack.len()))?;
    let mut height = 0;
    let exprs = stack
        .drain(start..)
        .map(|(expr, h)| {
            height = height.max(h);
            expr
        })
        .collect();
    Ok((exprs, height))
}

fn pop_array<const N: usize>(
    stack: &mut Vec<(Expr, usize)>,
) -> Result<([Expr; N], usize), String> {
    let (exprs, height) = pop_n(stack, N)?;
    let exprs = <[Expr; N]>::try_from(exprs)
        .map_err(|rest| format!("node expects {} operands, found {}", N, rest.len()))?;
    Ok((exprs, height))
}
