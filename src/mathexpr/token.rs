// src/mathexpr/token.rs

use super::ExprError;
use super::parser::{BinOp, Constant};

/// Function names the tokenizer recognizes. Anything else alphabetic
/// becomes a variable.
pub const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "sec", "csc", "cot", "asin", "acos", "atan", "sinh", "cosh", "tanh",
    "ln", "log", "exp", "sqrt", "cbrt", "abs", "floor", "ceil", "round", "sign", "gamma",
];

pub fn is_function(name: &str) -> bool {
    FUNCTIONS.contains(&name)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Function(String),
    Constant(Constant),
    Variable(String),
    Operator(BinOp),
    Bracket(char),
    Comma,
}

impl Token {
    /// Human-readable form for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Function(name) | Token::Variable(name) => name.clone(),
            Token::Constant(c) => c.name().to_string(),
            Token::Operator(op) => op.symbol().to_string(),
            Token::Bracket(ch) => ch.to_string(),
            Token::Comma => ",".to_string(),
        }
    }
}

fn constant_for(name: &str) -> Option<Constant> {
    match name {
        "pi" | "π" => Some(Constant::Pi),
        "e" => Some(Constant::E),
        "infinity" | "∞" => Some(Constant::Infinity),
        _ => None,
    }
}

fn operator_for(sym: &str) -> Option<BinOp> {
    let op = match sym {
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        "^" => BinOp::Pow,
        "=" => BinOp::Eq,
        "≠" | "!=" => BinOp::Ne,
        "<" => BinOp::Lt,
        ">" => BinOp::Gt,
        "≤" | "<=" => BinOp::Le,
        "≥" | ">=" => BinOp::Ge,
        "&&" => BinOp::And,
        "||" => BinOp::Or,
        _ => return None,
    };
    Some(op)
}

/// Splits the input into NUMBER / FUNCTION / CONSTANT / VARIABLE / OPERATOR /
/// BRACKET / COMMA tokens. Whitespace is skipped; any other character is an
/// error with its position.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut current = 0;

    while current < chars.len() {
        let ch = chars[current];

        if ch.is_whitespace() {
            current += 1;
            continue;
        }

        // Number literal: digits and a decimal point.
        if ch.is_ascii_digit() {
            let start = current;
            while current < chars.len()
                && (chars[current].is_ascii_digit() || chars[current] == '.')
            {
                current += 1;
            }
            let raw: String = chars[start..current].iter().collect();
            let value = raw
                .parse::<f64>()
                .map_err(|_| ExprError::InvalidNumber(raw))?;
            tokens.push(Token::Number(value));
            continue;
        }

        // Identifier: function, constant, or variable.
        if ch.is_ascii_alphabetic() {
            let start = current;
            while current < chars.len()
                && (chars[current].is_ascii_alphanumeric() || chars[current] == '_')
            {
                current += 1;
            }
            let name: String = chars[start..current].iter().collect();

            if is_function(&name) {
                tokens.push(Token::Function(name));
            } else if let Some(c) = constant_for(&name) {
                tokens.push(Token::Constant(c));
            } else {
                tokens.push(Token::Variable(name));
            }
            continue;
        }

        // Two-character operators first (&&, ||, <=, >=, !=).
        if current + 1 < chars.len() {
            let two: String = chars[current..current + 2].iter().collect();
            if let Some(op) = operator_for(&two) {
                tokens.push(Token::Operator(op));
                current += 2;
                continue;
            }
        }

        if let Some(op) = operator_for(&ch.to_string()) {
            tokens.push(Token::Operator(op));
            current += 1;
            continue;
        }

        if "()[]{}".contains(ch) {
            tokens.push(Token::Bracket(ch));
            current += 1;
            continue;
        }

        // Unicode constants outside the identifier path.
        if let Some(c) = constant_for(&ch.to_string()) {
            tokens.push(Token::Constant(c));
            current += 1;
            continue;
        }

        if ch == ',' {
            tokens.push(Token::Comma);
            current += 1;
            continue;
        }

        return Err(ExprError::UnexpectedChar { ch, pos: current });
    }

    Ok(tokens)
}
