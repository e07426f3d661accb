// src/mathexpr/mod.rs
//
// Math-expression pipeline used by the question authoring endpoints:
// tokenize -> parse (precedence climbing) -> LaTeX render / numeric eval.

pub mod eval;
pub mod latex;
pub mod parser;
pub mod token;

use std::fmt;

use serde::Serialize;

use crate::error::AppError;

pub use eval::evaluate;
pub use latex::to_latex;
pub use parser::{BinOp, Constant, Expr, UnaryOp};
pub use token::{Token, tokenize};

/// Error raised anywhere in the tokenize/parse pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    UnexpectedChar { ch: char, pos: usize },
    InvalidNumber(String),
    UnexpectedEnd,
    UnexpectedToken(String),
    UnclosedBracket,
    MissingArgumentList(String),
    TrailingTokens(String),
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::UnexpectedChar { ch, pos } => {
                write!(f, "Unexpected character '{}' at position {}", ch, pos)
            }
            ExprError::InvalidNumber(s) => write!(f, "Invalid number literal '{}'", s),
            ExprError::UnexpectedEnd => write!(f, "Unexpected end of expression"),
            ExprError::UnexpectedToken(s) => write!(f, "Unexpected token '{}'", s),
            ExprError::UnclosedBracket => write!(f, "Bracket is not closed"),
            ExprError::MissingArgumentList(name) => {
                write!(f, "Function '{}' requires parentheses", name)
            }
            ExprError::TrailingTokens(s) => write!(f, "Unconsumed token '{}'", s),
        }
    }
}

impl std::error::Error for ExprError {}

/// Malformed expressions are a client problem, not a server one.
impl From<ExprError> for AppError {
    fn from(err: ExprError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Fully analyzed expression: AST plus the derived artifacts the
/// authoring UI consumes.
#[derive(Debug, Serialize)]
pub struct ParsedExpression {
    #[serde(skip)]
    pub ast: Expr,
    pub latex: String,
    pub variables: Vec<String>,
    pub functions: Vec<String>,
}

/// Runs the whole pipeline on one input string.
pub fn parse_expression(input: &str) -> Result<ParsedExpression, ExprError> {
    let tokens = tokenize(input)?;
    let ast = parser::parse(tokens)?;
    let latex = to_latex(&ast);
    let variables = parser::variables(&ast);
    let functions = parser::functions(&ast);
    Ok(ParsedExpression {
        ast,
        latex,
        variables,
        functions,
    })
}
