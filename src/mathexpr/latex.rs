// src/mathexpr/latex.rs

use super::parser::{BinOp, Constant, Expr, UnaryOp};

/// Renders an AST to LaTeX.
///
/// Division becomes `\frac`, powers use braced exponents, and a handful of
/// functions get dedicated forms (sqrt, abs, floor/ceil, inverse trig).
/// Unknown function names fall back to `\text{name}(...)`.
pub fn to_latex(expr: &Expr) -> String {
    match expr {
        Expr::Number(value) => format_number(*value),
        Expr::Variable(name) => name.clone(),
        Expr::Constant(c) => constant_latex(*c).to_string(),
        Expr::Unary { op, arg } => {
            let sign = match op {
                UnaryOp::Plus => "+",
                UnaryOp::Neg => "-",
            };
            format!("{}{}", sign, to_latex(arg))
        }
        Expr::Binary { op, lhs, rhs } => {
            let left = to_latex(lhs);
            let right = to_latex(rhs);
            match op {
                BinOp::Pow => format!("{}^{{{}}}", left, right),
                BinOp::Div => format!("\\frac{{{}}}{{{}}}", left, right),
                BinOp::Mul => format!("{} \\cdot {}", left, right),
                other => format!("{} {} {}", left, operator_latex(*other), right),
            }
        }
        Expr::Call { name, args } => call_latex(name, args),
    }
}

fn format_number(value: f64) -> String {
    if value.is_infinite() {
        "\\infty".to_string()
    } else {
        value.to_string()
    }
}

fn constant_latex(c: Constant) -> &'static str {
    match c {
        Constant::Pi => "\\pi",
        Constant::E => "e",
        Constant::Infinity => "\\infty",
    }
}

fn operator_latex(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Eq => "=",
        BinOp::Ne => "\\neq",
        BinOp::Lt => "<",
        BinOp::Gt => ">",
        BinOp::Le => "\\leq",
        BinOp::Ge => "\\geq",
        BinOp::And => "\\land",
        BinOp::Or => "\\lor",
        // Handled by dedicated arms in `to_latex`.
        BinOp::Mul => "\\cdot",
        BinOp::Div => "/",
        BinOp::Pow => "^",
    }
}

fn call_latex(name: &str, args: &[Expr]) -> String {
    let rendered: Vec<String> = args.iter().map(to_latex).collect();
    let joined = rendered.join(", ");
    let first = rendered.first().map(String::as_str).unwrap_or("");

    match name {
        "sqrt" => format!("\\sqrt{{{}}}", first),
        "cbrt" => format!("\\sqrt[3]{{{}}}", first),
        "abs" => format!("\\left|{}\\right|", first),
        "floor" => format!("\\lfloor {} \\rfloor", first),
        "ceil" => format!("\\lceil {} \\rceil", first),
        "exp" => format!("e^{{{}}}", first),
        "asin" | "acos" | "atan" => format!("\\arc{}({})", &name[1..], first),
        "sin" | "cos" | "tan" | "sec" | "csc" | "cot" | "sinh" | "cosh" | "tanh" | "ln"
        | "log" => format!("\\{}({})", name, joined),
        "sign" => format!("\\text{{sgn}}({})", first),
        "gamma" => format!("\\Gamma({})", first),
        "round" => format!("\\text{{round}}({})", first),
        _ => format!("\\text{{{}}}({})", name, joined),
    }
}
