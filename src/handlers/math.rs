// src/handlers/math.rs

use std::collections::HashMap;

use axum::{Json, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::AppError,
    mathexpr::{evaluate, parse_expression},
};

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub expression: String,
}

/// Parses a math expression and returns its LaTeX form plus the
/// variables and functions it references.
pub async fn parse(Json(payload): Json<ParseRequest>) -> Result<impl IntoResponse, AppError> {
    let parsed = parse_expression(&payload.expression)?;
    Ok(Json(parsed))
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub expression: String,
    /// Variable bindings; unbound variables evaluate as 1.0.
    pub variables: Option<HashMap<String, f64>>,
}

/// Numerically evaluates a math expression with optional bindings.
pub async fn eval(Json(payload): Json<EvaluateRequest>) -> Result<impl IntoResponse, AppError> {
    let parsed = parse_expression(&payload.expression)?;
    let bindings = payload.variables.unwrap_or_default();
    let value = evaluate(&parsed.ast, &bindings);

    Ok(Json(json!({
        "expression": payload.expression,
        "latex": parsed.latex,
        "value": value,
    })))
}
