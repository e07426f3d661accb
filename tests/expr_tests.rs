// tests/expr_tests.rs
//
// Library-level tests for the expression pipeline: tokenizing, parsing,
// LaTeX rendering, and numeric evaluation.

use std::collections::HashMap;

use questa::mathexpr::{ExprError, evaluate, parse_expression};

fn latex(input: &str) -> String {
    parse_expression(input).unwrap().latex
}

fn eval(input: &str, vars: &[(&str, f64)]) -> f64 {
    let parsed = parse_expression(input).unwrap();
    let bindings: HashMap<String, f64> =
        vars.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    evaluate(&parsed.ast, &bindings)
}

#[test]
fn renders_function_calls_with_plain_parentheses() {
    assert_eq!(latex("sin(x)+2"), "\\sin(x) + 2");
}

#[test]
fn renders_fractions_powers_and_roots() {
    assert_eq!(latex("x^2/2"), "\\frac{x^{2}}{2}");
    assert_eq!(latex("sqrt(x+1)"), "\\sqrt{x + 1}");
    assert_eq!(latex("cbrt(8)"), "\\sqrt[3]{8}");
    assert_eq!(latex("abs(x)"), "\\left|x\\right|");
    assert_eq!(latex("asin(x)"), "\\arcsin(x)");
}

#[test]
fn renders_constants_and_comparisons() {
    assert_eq!(latex("2pi"), "2 \\cdot \\pi");
    assert_eq!(latex("x <= 3"), "x \\leq 3");
    assert_eq!(latex("x != y"), "x \\neq y");
}

#[test]
fn implicit_multiplication_is_inserted() {
    assert_eq!(latex("2x"), "2 \\cdot x");
    assert_eq!(latex("3sin(x)"), "3 \\cdot \\sin(x)");
    assert_eq!(latex("2(x+1)"), "2 \\cdot x + 1");

    assert_eq!(eval("2x", &[("x", 4.0)]), 8.0);
    assert_eq!(eval("2pi", &[]), 2.0 * std::f64::consts::PI);
}

#[test]
fn collects_variables_and_functions_sorted() {
    let parsed = parse_expression("b*a + sin(c) + cos(a)").unwrap();
    assert_eq!(parsed.variables, vec!["a", "b", "c"]);
    assert_eq!(parsed.functions, vec!["cos", "sin"]);
}

#[test]
fn evaluates_with_defaults_and_bindings() {
    assert_eq!(eval("3+4*2", &[]), 11.0);
    assert_eq!(eval("x+1", &[("x", 2.0)]), 3.0);
    // Unbound variables default to 1.
    assert_eq!(eval("y*3", &[]), 3.0);
    assert_eq!(eval("sin(0)", &[]), 0.0);
    assert_eq!(eval("2^10", &[]), 1024.0);
}

#[test]
fn division_by_zero_yields_infinity() {
    assert!(eval("1/0", &[]).is_infinite());
}

#[test]
fn comparison_operators_evaluate_to_unit_booleans() {
    assert_eq!(eval("2 < 3", &[]), 1.0);
    assert_eq!(eval("2 > 3", &[]), 0.0);
    assert_eq!(eval("1 && 0", &[]), 0.0);
    assert_eq!(eval("1 || 0", &[]), 1.0);
}

#[test]
fn unary_minus_binds_tighter_than_addition() {
    assert_eq!(eval("-2^2+1", &[]), 5.0);
    assert_eq!(latex("-x + 1"), "-x + 1");
}

#[test]
fn reports_parse_errors() {
    assert!(matches!(
        parse_expression("2 +"),
        Err(ExprError::UnexpectedEnd)
    ));
    assert!(matches!(
        parse_expression("(x+1"),
        Err(ExprError::UnclosedBracket)
    ));
    assert!(matches!(
        parse_expression("sin x"),
        Err(ExprError::MissingArgumentList(_))
    ));
    assert!(matches!(
        parse_expression("1 $ 2"),
        Err(ExprError::UnexpectedChar { ch: '$', .. })
    ));
}
