// src/mathexpr/eval.rs

use std::collections::HashMap;

use super::parser::{BinOp, Expr, UnaryOp};

/// Direct recursive numeric interpretation of the AST.
///
/// Unbound variables default to 1.0 so a plot preview of `2x` still draws
/// something; division by zero yields infinity instead of an error, and
/// comparison/logical operators evaluate to 1.0 / 0.0.
pub fn evaluate(expr: &Expr, variables: &HashMap<String, f64>) -> f64 {
    match expr {
        Expr::Number(value) => *value,
        Expr::Constant(c) => c.value(),
        Expr::Variable(name) => variables.get(name).copied().unwrap_or(1.0),
        Expr::Unary { op, arg } => {
            let value = evaluate(arg, variables);
            match op {
                UnaryOp::Plus => value,
                UnaryOp::Neg => -value,
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let left = evaluate(lhs, variables);
            let right = evaluate(rhs, variables);
            match op {
                BinOp::Add => left + right,
                BinOp::Sub => left - right,
                BinOp::Mul => left * right,
                BinOp::Div => {
                    if right == 0.0 {
                        f64::INFINITY
                    } else {
                        left / right
                    }
                }
                BinOp::Pow => left.powf(right),
                BinOp::Eq => bool_to_f64(left == right),
                BinOp::Ne => bool_to_f64(left != right),
                BinOp::Lt => bool_to_f64(left < right),
                BinOp::Gt => bool_to_f64(left > right),
                BinOp::Le => bool_to_f64(left <= right),
                BinOp::Ge => bool_to_f64(left >= right),
                BinOp::And => bool_to_f64(left != 0.0 && right != 0.0),
                BinOp::Or => bool_to_f64(left != 0.0 || right != 0.0),
            }
        }
        Expr::Call { name, args } => {
            let values: Vec<f64> = args.iter().map(|a| evaluate(a, variables)).collect();
            apply_function(name, &values)
        }
    }
}

fn bool_to_f64(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

fn apply_function(name: &str, args: &[f64]) -> f64 {
    let x = args.first().copied().unwrap_or(0.0);
    match name {
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "sec" => 1.0 / x.cos(),
        "csc" => 1.0 / x.sin(),
        "cot" => 1.0 / x.tan(),
        "asin" => x.asin(),
        "acos" => x.acos(),
        "atan" => x.atan(),
        "sinh" => x.sinh(),
        "cosh" => x.cosh(),
        "tanh" => x.tanh(),
        "ln" => x.ln(),
        "log" => x.log10(),
        "exp" => x.exp(),
        "sqrt" => x.sqrt(),
        "cbrt" => x.cbrt(),
        "abs" => x.abs(),
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        "round" => x.round(),
        "sign" => {
            if x == 0.0 {
                0.0
            } else {
                x.signum()
            }
        }
        // Functions without a numeric interpretation evaluate to zero.
        _ => 0.0,
    }
}
