use lazy_static::lazy_static;
use pest::Parser;
use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;
use tracing::trace;

use crate::parser::error::convert_pest_error;
use crate::parser::parsed_expr::{Comprehension, ComprehensionKind, Literal};
use crate::parser::{
    BinaryOp, BoolOp, ComparisonOp, Expr, ExprKind, ParseError, ParseErrorKind, Span, UnaryOp,
};
use crate::syntax::{unescape_bytes, unescape_string};

lazy_static! {
    // Note: precedence is defined lowest to highest.
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        // (lowest precedence)
        .op(Op::infix(Rule::ternary_op, Assoc::Right))   // `c ? a : b`
        .op(Op::infix(Rule::or_op, Assoc::Left))         // `||`
        .op(Op::infix(Rule::and_op, Assoc::Left))        // `&&`

        // Relations.
        .op(
            Op::infix(Rule::eq, Assoc::Left) |
            Op::infix(Rule::ne, Assoc::Left) |
            Op::infix(Rule::lt, Assoc::Left) |
            Op::infix(Rule::le, Assoc::Left) |
            Op::infix(Rule::gt, Assoc::Left) |
            Op::infix(Rule::ge, Assoc::Left) |
            Op::infix(Rule::in_op, Assoc::Left)
        )                                                // `==`, `<`, `in`, ...

        // Arithmetic operators.
        .op(
            Op::infix(Rule::add, Assoc::Left) |
            Op::infix(Rule::sub, Assoc::Left)
        )                                                // `+`, `-`
        .op(
            Op::infix(Rule::mul, Assoc::Left) |
            Op::infix(Rule::div, Assoc::Left) |
            Op::infix(Rule::rem, Assoc::Left)
        )                                                // `*`, `/`, `%`
        .op(Op::prefix(Rule::neg) | Op::prefix(Rule::not)) // `-`, `!`

        // Postfix operators.
        .op(Op::postfix(Rule::member_op) | Op::postfix(Rule::index_op)) // `.`, `[]`
        // (highest precedence)
        ;
}

#[derive(Parser)]
#[grammar = "parser/expression.pest"]
pub struct ExpressionParser;

/// Default bound on expression nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

pub fn parse(source: &str) -> Result<Expr, ParseError> {
    parse_with_max_depth(source, DEFAULT_MAX_DEPTH)
}

pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<Expr, ParseError> {
    check_nesting(source, max_depth)?;

    let mut pairs =
        ExpressionParser::parse(Rule::main, source).map_err(|e| convert_pest_error(e, source))?;
    let expression = pairs
        .next()
        .and_then(|main| main.into_inner().next())
        .ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::Other {
                    message: "empty expression".to_string(),
                },
                source,
                Span::new(0, source.len()),
            )
        })?;

    let builder = Builder { source, max_depth };
    let (expr, _) = builder.operand(builder.build(expression)?)?;
    trace!(source, "Parsed expression");
    Ok(expr)
}

/// Scan delimiters before handing the source to pest, so that unbalanced
/// input gets a precise error and pathological nesting never reaches the
/// recursive descent.
///
/// Brackets, runs of prefix operators and ternaries all nest. Ternaries are
/// right associative, so every `?` at one bracket level nests inside the
/// previous one until a `,` starts a sibling expression.
fn check_nesting(source: &str, max_depth: usize) -> Result<(), ParseError> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    // Ternaries per open bracket level; the first entry is the top level.
    let mut ternaries: Vec<usize> = vec![0];
    let mut total_ternaries = 0usize;
    let mut prefix_run = 0usize;
    let bytes = source.as_bytes();
    let mut pos = 0;

    let too_deep = |depth: usize, pos: usize| {
        ParseError::new(
            ParseErrorKind::MaxDepthExceeded { depth, max_depth },
            source,
            Span::new(pos, pos + 1),
        )
    };

    while pos < bytes.len() {
        let c = bytes[pos];
        match c {
            b'"' | b'\'' => {
                pos = skip_quoted(bytes, pos);
                prefix_run = 0;
                continue;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
                continue;
            }
            b'(' | b'[' | b'{' => {
                stack.push((c as char, pos));
                ternaries.push(0);
                let depth = stack.len() + total_ternaries + prefix_run;
                if depth > max_depth {
                    return Err(too_deep(depth, pos));
                }
                prefix_run = 0;
            }
            b')' | b']' | b'}' => {
                let expected = match c {
                    b')' => '(',
                    b']' => '[',
                    _ => '{',
                };
                match stack.last() {
                    Some((open, _)) if *open == expected => {
                        stack.pop();
                        total_ternaries -= ternaries.pop().unwrap_or(0);
                    }
                    // Mismatched closers are reported by the grammar.
                    _ => return Ok(()),
                }
                prefix_run = 0;
            }
            b'?' => {
                if let Some(level) = ternaries.last_mut() {
                    *level += 1;
                }
                total_ternaries += 1;
                let depth = stack.len() + total_ternaries;
                if depth > max_depth {
                    return Err(too_deep(depth, pos));
                }
                prefix_run = 0;
            }
            b',' => {
                if let Some(level) = ternaries.last_mut() {
                    total_ternaries -= *level;
                    *level = 0;
                }
                prefix_run = 0;
            }
            b'!' | b'-' => {
                prefix_run += 1;
                let depth = stack.len() + total_ternaries + prefix_run;
                if depth > max_depth {
                    return Err(too_deep(depth, pos));
                }
            }
            b' ' | b'\t' | b'\r' | b'\n' => {}
            _ => prefix_run = 0,
        }
        pos += 1;
    }

    match stack.pop() {
        Some((delimiter, start)) => Err(ParseError::new(
            ParseErrorKind::UnclosedDelimiter { delimiter },
            source,
            Span::new(start, start + 1),
        )),
        None => Ok(()),
    }
}

/// Returns the position just past the string literal starting at `start`.
fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let triple = bytes.get(start..start + 3) == Some(&[quote, quote, quote][..]);
    let mut pos = if triple { start + 3 } else { start + 1 };
    while pos < bytes.len() {
        let c = bytes[pos];
        if c == b'\\' {
            pos += 2;
            continue;
        }
        if triple {
            if bytes.get(pos..pos + 3) == Some(&[quote, quote, quote][..]) {
                return pos + 3;
            }
        } else if c == quote || c == b'\n' {
            return pos + 1;
        }
        pos += 1;
    }
    bytes.len()
}

struct Builder<'s> {
    source: &'s str,
    max_depth: usize,
}

/// A built subtree with its height; leaves have height 0.
struct Node {
    expr: Expr,
    height: usize,
    /// Set on the int literal `9223372036854775808`, which is only valid
    /// as the operand of a unary minus.
    min_int_magnitude: bool,
}

impl<'s> Builder<'s> {
    fn error(&self, kind: ParseErrorKind, span: Span) -> ParseError {
        ParseError::new(kind, self.source, span)
    }

    fn missing(&self, what: &str, span: Span) -> ParseError {
        self.error(
            ParseErrorKind::Other {
                message: format!("missing {}", what),
            },
            span,
        )
    }

    fn leaf(&self, kind: ExprKind, span: Span) -> Node {
        Node {
            expr: Expr::new(kind, span),
            height: 0,
            min_int_magnitude: false,
        }
    }

    /// An inner node above children of at most `child_height`. The tree is
    /// never allowed to grow past `max_depth`, so walking or dropping it
    /// cannot exhaust the stack.
    fn node(&self, kind: ExprKind, span: Span, child_height: usize) -> Result<Node, ParseError> {
        let height = child_height + 1;
        if height > self.max_depth {
            return Err(self.error(
                ParseErrorKind::MaxDepthExceeded {
                    depth: height,
                    max_depth: self.max_depth,
                },
                span,
            ));
        }
        Ok(Node {
            expr: Expr::new(kind, span),
            height,
            min_int_magnitude: false,
        })
    }

    fn operand(&self, node: Node) -> Result<(Expr, usize), ParseError> {
        if node.min_int_magnitude {
            let span = node.expr.span;
            return Err(self.invalid_number(span.str_of(self.source), span.clone()));
        }
        Ok((node.expr, node.height))
    }

    fn operands(&self, nodes: Vec<Node>) -> Result<(Vec<Expr>, usize), ParseError> {
        let mut height = 0;
        let mut exprs = Vec::with_capacity(nodes.len());
        for node in nodes {
            let (expr, node_height) = self.operand(node)?;
            height = height.max(node_height);
            exprs.push(expr);
        }
        Ok((exprs, height))
    }

    fn build(&self, pair: Pair<Rule>) -> Result<Node, ParseError> {
        let span = Span::from(pair.as_span());

        match pair.as_rule() {
            Rule::expression => self.build_expression(pair),

            Rule::grouped => {
                let inner = pair
                    .into_inner()
                    .next()
                    .ok_or_else(|| self.missing("grouped expression", span.clone()))?;
                // `-(9223372036854775808)` is out of range like the bare literal.
                let (expr, height) = self.operand(self.build(inner)?)?;
                Ok(Node {
                    expr,
                    height,
                    min_int_magnitude: false,
                })
            }

            Rule::list => {
                let items = pair
                    .into_inner()
                    .map(|item| self.build(item))
                    .collect::<Result<Vec<_>, _>>()?;
                let (items, height) = self.operands(items)?;
                self.node(ExprKind::List(items), span, height)
            }

            Rule::map => {
                let mut entries = Vec::new();
                let mut height = 0;
                for entry in pair.into_inner() {
                    let (key, value, entry_height) = self.build_map_entry(entry)?;
                    height = height.max(entry_height);
                    entries.push((key, value));
                }
                self.node(ExprKind::Map(entries), span, height)
            }

            Rule::global_call => {
                let mut inner = pair.into_inner();
                let name = inner
                    .next()
                    .ok_or_else(|| self.missing("function name", span.clone()))?
                    .as_str()
                    .to_string();
                let (args, height) = match inner.next() {
                    Some(args) => self.operands(self.build_args(args)?)?,
                    None => (Vec::new(), 0),
                };
                self.build_call(name, None, args, span, height)
            }

            Rule::ident => Ok(self.leaf(ExprKind::Ident(pair.as_str().to_string()), span)),

            Rule::int => {
                let text = pair.as_str();
                let magnitude = match strip_hex(text) {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => text.parse(),
                }
                .map_err(|_| self.invalid_number(text, span.clone()))?;
                match i64::try_from(magnitude) {
                    Ok(value) => Ok(self.leaf(ExprKind::Literal(Literal::Int(value)), span)),
                    Err(_) if magnitude == 1u64 << 63 => Ok(Node {
                        expr: literal(Literal::Int(i64::MIN), span),
                        height: 0,
                        min_int_magnitude: true,
                    }),
                    Err(_) => Err(self.invalid_number(text, span)),
                }
            }

            Rule::uint => {
                let text = pair.as_str();
                let digits = &text[..text.len() - 1];
                let value = match strip_hex(digits) {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => digits.parse(),
                }
                .map_err(|_| self.invalid_number(text, span.clone()))?;
                Ok(self.leaf(ExprKind::Literal(Literal::Uint(value)), span))
            }

            Rule::float => {
                let text = pair.as_str();
                let value: f64 = text
                    .parse()
                    .ok()
                    .filter(|f: &f64| f.is_finite())
                    .ok_or_else(|| self.invalid_number(text, span.clone()))?;
                Ok(self.leaf(ExprKind::Literal(Literal::Float(value)), span))
            }

            Rule::boolean => Ok(self.leaf(
                ExprKind::Literal(Literal::Bool(pair.as_str() == "true")),
                span,
            )),

            Rule::null => Ok(self.leaf(ExprKind::Literal(Literal::Null), span)),

            Rule::string => {
                let (raw, body) = split_quoted(pair.as_str());
                let value = if raw {
                    body.to_string()
                } else {
                    unescape_string(body).map_err(|e| {
                        self.error(
                            ParseErrorKind::InvalidLiteral {
                                message: e.to_string(),
                            },
                            span.clone(),
                        )
                    })?
                };
                Ok(self.leaf(ExprKind::Literal(Literal::Str(value)), span))
            }

            Rule::bytes => {
                let (raw, body) = split_quoted(pair.as_str());
                let value = if raw {
                    body.as_bytes().to_vec()
                } else {
                    unescape_bytes(body).map_err(|e| {
                        self.error(
                            ParseErrorKind::InvalidLiteral {
                                message: e.to_string(),
                            },
                            span.clone(),
                        )
                    })?
                };
                Ok(self.leaf(ExprKind::Literal(Literal::Bytes(value)), span))
            }

            other => Err(self.error(
                ParseErrorKind::Other {
                    message: format!("Unhandled rule: {:?}", other),
                },
                span,
            )),
        }
    }

    fn build_expression(&self, pair: Pair<Rule>) -> Result<Node, ParseError> {
        PRATT_PARSER
            .map_primary(|primary| self.build(primary))
            .map_prefix(|op, rhs| {
                let rhs = rhs?;
                let span = Span::new(op.as_span().start(), rhs.expr.span.0.end);
                let op = match op.as_rule() {
                    Rule::neg => UnaryOp::Neg,
                    _ => UnaryOp::Not,
                };
                if op == UnaryOp::Neg && rhs.min_int_magnitude {
                    return Ok(self.leaf(ExprKind::Literal(Literal::Int(i64::MIN)), span));
                }
                let (rhs, height) = self.operand(rhs)?;
                self.node(
                    ExprKind::Unary {
                        op,
                        expr: Box::new(rhs),
                    },
                    span,
                    height,
                )
            })
            .map_infix(|lhs, op, rhs| {
                let (lhs, lhs_height) = self.operand(lhs?)?;
                let (rhs, rhs_height) = self.operand(rhs?)?;
                let mut height = lhs_height.max(rhs_height);
                let span = Span::combine(&lhs.span, &rhs.span);
                let (left, right) = (Box::new(lhs), Box::new(rhs));
                let kind = match op.as_rule() {
                    Rule::ternary_op => {
                        let op_span = Span::from(op.as_span());
                        let middle = op
                            .into_inner()
                            .next()
                            .ok_or_else(|| self.missing("ternary branch", op_span))?;
                        let (middle, middle_height) = self.operand(self.build(middle)?)?;
                        height = height.max(middle_height);
                        ExprKind::Ternary {
                            cond: left,
                            then_branch: Box::new(middle),
                            else_branch: right,
                        }
                    }
                    Rule::or_op => boolean(BoolOp::Or, left, right),
                    Rule::and_op => boolean(BoolOp::And, left, right),
                    Rule::eq => comparison(ComparisonOp::Eq, left, right),
                    Rule::ne => comparison(ComparisonOp::Neq, left, right),
                    Rule::lt => comparison(ComparisonOp::Lt, left, right),
                    Rule::le => comparison(ComparisonOp::Le, left, right),
                    Rule::gt => comparison(ComparisonOp::Gt, left, right),
                    Rule::ge => comparison(ComparisonOp::Ge, left, right),
                    Rule::in_op => comparison(ComparisonOp::In, left, right),
                    Rule::add => binary(BinaryOp::Add, left, right),
                    Rule::sub => binary(BinaryOp::Sub, left, right),
                    Rule::mul => binary(BinaryOp::Mul, left, right),
                    Rule::div => binary(BinaryOp::Div, left, right),
                    Rule::rem => binary(BinaryOp::Rem, left, right),
                    other => {
                        return Err(self.error(
                            ParseErrorKind::Other {
                                message: format!("Unknown binary operator: {:?}", other),
                            },
                            span,
                        ));
                    }
                };
                self.node(kind, span, height)
            })
            .map_postfix(|lhs, op| {
                let (lhs, lhs_height) = self.operand(lhs?)?;
                let span = Span::new(lhs.span.0.start, op.as_span().end());
                match op.as_rule() {
                    Rule::index_op => {
                        let index = op
                            .into_inner()
                            .next()
                            .ok_or_else(|| self.missing("index", span.clone()))?;
                        let (index, index_height) = self.operand(self.build(index)?)?;
                        self.node(
                            ExprKind::Index {
                                value: Box::new(lhs),
                                index: Box::new(index),
                            },
                            span,
                            lhs_height.max(index_height),
                        )
                    }
                    _ => {
                        let mut inner = op.into_inner();
                        let name = inner
                            .next()
                            .ok_or_else(|| self.missing("member name", span.clone()))?
                            .as_str()
                            .to_string();
                        match inner.next() {
                            Some(args) => {
                                let (args, args_height) = self.operands(self.build_args(args)?)?;
                                let height = lhs_height.max(args_height);
                                self.build_call(name, Some(lhs), args, span, height)
                            }
                            None => self.node(
                                ExprKind::Field {
                                    value: Box::new(lhs),
                                    field: name,
                                },
                                span,
                                lhs_height,
                            ),
                        }
                    }
                }
            })
            .parse(pair.into_inner())
    }

    fn build_args(&self, pair: Pair<Rule>) -> Result<Vec<Node>, ParseError> {
        pair.into_inner().map(|arg| self.build(arg)).collect()
    }

    fn build_map_entry(&self, pair: Pair<Rule>) -> Result<(Expr, Expr, usize), ParseError> {
        let span = Span::from(pair.as_span());
        let mut inner = pair.into_inner();
        let key = inner
            .next()
            .ok_or_else(|| self.missing("map key", span.clone()))?;
        let value = inner
            .next()
            .ok_or_else(|| self.missing("map value", span))?;
        let (key, key_height) = self.operand(self.build(key)?)?;
        let (value, value_height) = self.operand(self.build(value)?)?;
        Ok((key, value, key_height.max(value_height)))
    }

    /// Build a call, expanding `has` and the iteration macros.
    /// `child_height` covers the target and the arguments.
    fn build_call(
        &self,
        function: String,
        target: Option<Expr>,
        mut args: Vec<Expr>,
        span: Span,
        child_height: usize,
    ) -> Result<Node, ParseError> {
        let macro_error = |message: &str| {
            self.error(
                ParseErrorKind::InvalidMacro {
                    name: function.clone(),
                    message: message.to_string(),
                },
                span.clone(),
            )
        };

        let target = match target {
            None if function == "has" => {
                let arg = match args.pop() {
                    Some(arg) if args.is_empty() => arg,
                    _ => return Err(macro_error("expects exactly one argument")),
                };
                return match arg.kind {
                    ExprKind::Field { value, field } => {
                        self.node(ExprKind::Has { value, field }, span, child_height)
                    }
                    _ => Err(macro_error("argument must be a field selection like a.b")),
                };
            }
            None => {
                return self.node(
                    ExprKind::Call {
                        function,
                        target: None,
                        args,
                    },
                    span,
                    child_height,
                );
            }
            Some(target) => target,
        };

        let Some(kind) = ComprehensionKind::from_name(&function) else {
            return self.node(
                ExprKind::Call {
                    function,
                    target: Some(Box::new(target)),
                    args,
                },
                span,
                child_height,
            );
        };

        let arity_ok = match kind {
            ComprehensionKind::Map => args.len() == 2 || args.len() == 3,
            _ => args.len() == 2,
        };
        if !arity_ok {
            let expected = if kind == ComprehensionKind::Map {
                "expects 2 or 3 arguments"
            } else {
                "expects 2 arguments"
            };
            return Err(macro_error(expected));
        }

        let mut args = args.into_iter();
        let var = match args.next().map(|arg| arg.kind) {
            Some(ExprKind::Ident(name)) => name,
            _ => return Err(macro_error("first argument must be a simple identifier")),
        };
        let (filter, body) = match (args.next(), args.next()) {
            (Some(filter), Some(body)) => (Some(filter), body),
            (Some(body), None) => (None, body),
            _ => return Err(macro_error("missing macro body")),
        };

        self.node(
            ExprKind::Comprehension(Box::new(Comprehension {
                kind,
                range: target,
                var,
                filter,
                body,
            })),
            span,
            child_height,
        )
    }

    fn invalid_number(&self, text: &str, span: Span) -> ParseError {
        self.error(
            ParseErrorKind::InvalidNumber {
                text: text.to_string(),
            },
            span,
        )
    }
}

fn literal(value: Literal, span: Span) -> Expr {
    Expr::new(ExprKind::Literal(value), span)
}

fn binary(op: BinaryOp, left: Box<Expr>, right: Box<Expr>) -> ExprKind {
    ExprKind::Binary { op, left, right }
}

fn boolean(op: BoolOp, left: Box<Expr>, right: Box<Expr>) -> ExprKind {
    ExprKind::Boolean { op, left, right }
}

fn comparison(op: ComparisonOp, left: Box<Expr>, right: Box<Expr>) -> ExprKind {
    ExprKind::Comparison { op, left, right }
}

fn strip_hex(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}

/// Split a quoted literal into (is_raw, body without prefix and quotes).
fn split_quoted(text: &str) -> (bool, &str) {
    let prefix_len = text.find(['"', '\'']).unwrap_or(0);
    let raw = text[..prefix_len].contains(['r', 'R']);
    let quoted = &text[prefix_len..];
    let quote_len = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
        3
    } else {
        1
    };
    let body = quoted
        .get(quote_len..quoted.len().saturating_sub(quote_len))
        .unwrap_or("");
    (raw, body)
}
