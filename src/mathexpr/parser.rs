// src/mathexpr/parser.rs

use std::collections::BTreeSet;

use super::ExprError;
use super::token::Token;

/// Named mathematical constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
    Infinity,
}

impl Constant {
    pub fn name(&self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "e",
            Constant::Infinity => "infinity",
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Constant::Pi => std::f64::consts::PI,
            Constant::E => std::f64::consts::E,
            Constant::Infinity => f64::INFINITY,
        }
    }
}

/// Binary operators, lowest precedence first: comparison/logical,
/// additive, multiplicative, power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
            BinOp::Eq => "=",
            BinOp::Ne => "≠",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "≤",
            BinOp::Ge => "≥",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge
                | BinOp::And
                | BinOp::Or
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
}

/// Expression AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Constant(Constant),
    Variable(String),
    Unary {
        op: UnaryOp,
        arg: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

/// Parses a token stream into an AST. Errors if tokens remain after the
/// top-level expression.
pub fn parse(tokens: Vec<Token>) -> Result<Expr, ExprError> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression()?;

    if let Some(extra) = parser.peek() {
        return Err(ExprError::TrailingTokens(extra.describe()));
    }

    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expression(&mut self) -> Result<Expr, ExprError> {
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ExprError> {
        let mut node = self.addition()?;

        while let Some(Token::Operator(op)) = self.peek() {
            if !op.is_comparison() {
                break;
            }
            let op = *op;
            self.pos += 1;
            let rhs = self.addition()?;
            node = Expr::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }

        Ok(node)
    }

    fn addition(&mut self) -> Result<Expr, ExprError> {
        let mut node = self.multiplication()?;

        while let Some(Token::Operator(op @ (BinOp::Add | BinOp::Sub))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.multiplication()?;
            node = Expr::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }

        Ok(node)
    }

    /// Multiplication level also handles implicit multiplication: a value
    /// token directly following another value ("2x", "3sin(x)", "2(x+1)")
    /// is treated as `*`.
    fn multiplication(&mut self) -> Result<Expr, ExprError> {
        let mut node = self.power()?;

        loop {
            let op = match self.peek() {
                Some(Token::Operator(op @ (BinOp::Mul | BinOp::Div))) => {
                    let op = *op;
                    self.pos += 1;
                    op
                }
                Some(
                    Token::Variable(_)
                    | Token::Number(_)
                    | Token::Function(_)
                    | Token::Constant(_),
                )
                | Some(Token::Bracket('(')) => BinOp::Mul,
                _ => break,
            };

            let rhs = self.power()?;
            node = Expr::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }

        Ok(node)
    }

    fn power(&mut self) -> Result<Expr, ExprError> {
        let mut node = self.unary()?;

        while let Some(Token::Operator(BinOp::Pow)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            node = Expr::Binary {
                op: BinOp::Pow,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }

        Ok(node)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if let Some(Token::Operator(op @ (BinOp::Add | BinOp::Sub))) = self.peek() {
            let op = if *op == BinOp::Sub {
                UnaryOp::Neg
            } else {
                UnaryOp::Plus
            };
            self.pos += 1;
            let arg = self.unary()?;
            return Ok(Expr::Unary {
                op,
                arg: Box::new(arg),
            });
        }

        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let token = self.advance().ok_or(ExprError::UnexpectedEnd)?;

        match token {
            Token::Number(value) => Ok(Expr::Number(value)),
            Token::Constant(c) => Ok(Expr::Constant(c)),
            Token::Variable(name) => Ok(Expr::Variable(name)),
            Token::Function(name) => self.call(name),
            Token::Bracket('(') => {
                let node = self.expression()?;
                match self.advance() {
                    Some(Token::Bracket(')')) => Ok(node),
                    _ => Err(ExprError::UnclosedBracket),
                }
            }
            other => Err(ExprError::UnexpectedToken(other.describe())),
        }
    }

    fn call(&mut self, name: String) -> Result<Expr, ExprError> {
        match self.advance() {
            Some(Token::Bracket('(')) => {}
            _ => return Err(ExprError::MissingArgumentList(name)),
        }

        let mut args = Vec::new();

        if self.peek() != Some(&Token::Bracket(')')) {
            args.push(self.expression()?);
            while self.peek() == Some(&Token::Comma) {
                self.pos += 1;
                args.push(self.expression()?);
            }
        }

        match self.advance() {
            Some(Token::Bracket(')')) => Ok(Expr::Call { name, args }),
            _ => Err(ExprError::UnclosedBracket),
        }
    }
}

/// Collects all distinct variable names in the AST, sorted.
pub fn variables(expr: &Expr) -> Vec<String> {
    let mut found = BTreeSet::new();
    walk(expr, &mut |node| {
        if let Expr::Variable(name) = node {
            found.insert(name.clone());
        }
    });
    found.into_iter().collect()
}

/// Collects all distinct function names in the AST, sorted.
pub fn functions(expr: &Expr) -> Vec<String> {
    let mut found = BTreeSet::new();
    walk(expr, &mut |node| {
        if let Expr::Call { name, .. } = node {
            found.insert(name.clone());
        }
    });
    found.into_iter().collect()
}

fn walk(expr: &Expr, visit: &mut impl FnMut(&Expr)) {
    visit(expr);
    match expr {
        Expr::Unary { arg, .. } => walk(arg, visit),
        Expr::Binary { lhs, rhs, .. } => {
            walk(lhs, visit);
            walk(rhs, visit);
        }
        Expr::Call { args, .. } => {
            for arg in args {
                walk(arg, visit);
            }
        }
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => {}
    }
}
