pub mod error;
mod parsed_expr;
pub mod parser;
pub mod postorder;
mod syntax;

// Re-export the parser and rule enum for external use
pub use parser::ExpressionParser;
pub use parser::Rule;
pub use parser::{DEFAULT_MAX_DEPTH, parse, parse_with_max_depth};

pub use error::{ParseError, ParseErrorKind};
pub use postorder::{PostorderNode, from_postorder, to_postorder};
pub use parsed_expr::{Comprehension, ComprehensionKind, Expr, ExprKind, Literal};
pub use syntax::{BinaryOp, BoolOp, ComparisonOp, Span, UnaryOp};


#[cfg(test)]
mod postorder_test;
