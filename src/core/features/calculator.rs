//! Calculator tool with AST-based math evaluation
//!
//! Expressions are parsed by meval, never evaluated as code.

use meval::Expr;
use serde_json::json;
use std::str::FromStr;

use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::AppSettings;
use crate::shared::types::{ToolRequest, ToolResponse};
use super::unit_converter::format_result;
use super::Tool;

#[derive(Clone)]
pub struct CalculatorTool;

impl Tool for CalculatorTool {
    fn id(&self) -> &'static str {
        "calculator"
    }

    fn handles(&self, request: &ToolRequest) -> bool {
        matches!(request, ToolRequest::Evaluate(_))
    }

    fn execute(&self, request: &ToolRequest, _settings: &AppSettings) -> AppResult<ToolResponse> {
        let ToolRequest::Evaluate(req) = request else {
            return Err(AppError::UnsupportedAction(request.kind().to_string()));
        };

        let value = evaluate_expression(&req.expression)?;
        Ok(ToolResponse {
            tool_id: self.id().to_string(),
            summary: format!("{} = {}", req.expression.trim(), format_result(value)),
            data: json!({ "expression": req.expression, "result": value }),
        })
    }
}

fn normalize(expression: &str) -> String {
    let cleaned = expression
        .trim()
        .replace('×', "*")
        .replace('÷', "/")
        .replace('−', "-");

    // "15%" reads as a fraction of one
    match cleaned.strip_suffix('%') {
        Some(body) => format!("({})/100", body.trim_end()),
        None => cleaned,
    }
}

/// Evaluate a mathematical expression.
///
/// Accepts the usual typographic operators (×, ÷, −) and a trailing percent sign.
/// Results that are NaN or infinite are rejected.
pub fn evaluate_expression(expression: &str) -> AppResult<f64> {
    let cleaned = normalize(expression);
    if cleaned.is_empty() {
        return Err(AppError::Calculation("Expression is empty".to_string()));
    }

    let expr = Expr::from_str(&cleaned)
        .map_err(|e| AppError::Calculation(format!("Failed to parse expression '{}': {}", cleaned, e)))?;

    let result = expr
        .eval()
        .map_err(|e| AppError::Calculation(format!("Failed to evaluate expression '{}': {}", cleaned, e)))?;

    if result.is_nan() {
        return Err(AppError::Calculation("Result is NaN (Not a Number)".to_string()));
    }

    if result.is_infinite() {
        return Err(AppError::Calculation("Result is infinite".to_string()));
    }

    tracing::trace!(expression = %cleaned, result, "evaluated expression");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::EvaluateRequest;

    #[test]
    fn test_simple_addition() {
        assert_eq!(evaluate_expression("2 + 2").unwrap(), 4.0);
    }

    #[test]
    fn test_complex_expression() {
        assert_eq!(evaluate_expression("(2 + 3) * 4").unwrap(), 20.0);
    }

    #[test]
    fn test_typographic_operators() {
        assert_eq!(evaluate_expression("6 × 7").unwrap(), 42.0);
        assert_eq!(evaluate_expression("10 ÷ 4").unwrap(), 2.5);
        assert_eq!(evaluate_expression("5 − 8").unwrap(), -3.0);
    }

    #[test]
    fn test_trailing_percent() {
        assert_eq!(evaluate_expression("50%").unwrap(), 0.5);
        assert_eq!(evaluate_expression("200 * 15 %").unwrap(), 30.0);
    }

    #[test]
    fn test_invalid_expression() {
        assert!(matches!(evaluate_expression("2 +"), Err(AppError::Calculation(_))));
        assert!(matches!(evaluate_expression("   "), Err(AppError::Calculation(_))));
    }

    #[test]
    fn test_non_finite_results_rejected() {
        assert!(matches!(evaluate_expression("1 / 0"), Err(AppError::Calculation(_))));
        assert!(matches!(evaluate_expression("sqrt(-1)"), Err(AppError::Calculation(_))));
    }

    #[test]
    fn test_tool_summary() {
        let request = ToolRequest::Evaluate(EvaluateRequest { expression: "1.5 * 4".into() });
        let response = CalculatorTool.execute(&request, &AppSettings::default()).unwrap();
        assert_eq!(response.summary, "1.5 * 4 = 6");
        assert_eq!(response.data["result"], 6.0);
    }
}
