//! Tool plugin system with enum dispatch
//!
//! Every tool is a unit struct behind the `AppTool` enum; enum_dispatch turns
//! calls on the enum into static dispatch.

use enum_dispatch::enum_dispatch;

use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::AppSettings;
use crate::shared::types::{ToolRequest, ToolResponse};

pub mod calculator;
pub mod currency;
pub mod investment;
pub mod loan;
pub mod unit_converter;

use calculator::CalculatorTool;
use currency::CurrencyTool;
use investment::InvestmentTool;
use loan::LoanTool;
use unit_converter::UnitConverterTool;

#[enum_dispatch]
pub trait Tool: Send + Sync {
    /// Unique identifier, matches the catalog entry id
    fn id(&self) -> &'static str;

    /// Whether this tool accepts the request kind
    fn handles(&self, request: &ToolRequest) -> bool;

    /// Run the request.
    ///
    /// Returns `AppError::UnsupportedAction` for requests the tool does not
    /// handle, so callers can keep looking.
    fn execute(&self, request: &ToolRequest, settings: &AppSettings) -> AppResult<ToolResponse>;
}

#[enum_dispatch(Tool)]
#[derive(Clone)]
pub enum AppTool {
    UnitConverter(UnitConverterTool),
    Currency(CurrencyTool),
    Loan(LoanTool),
    Investment(InvestmentTool),
    Calculator(CalculatorTool),
}

impl AppTool {
    pub fn all() -> Vec<Self> {
        vec![
            AppTool::UnitConverter(UnitConverterTool),
            AppTool::Currency(CurrencyTool),
            AppTool::Loan(LoanTool),
            AppTool::Investment(InvestmentTool),
            AppTool::Calculator(CalculatorTool),
        ]
    }

    pub fn by_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|tool| tool.id() == id)
    }
}

pub(crate) fn require_finite_non_negative(name: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::Validation(format!("{} must be a finite number", name)));
    }
    if value < 0.0 {
        return Err(AppError::Validation(format!("{} must not be negative", name)));
    }
    Ok(())
}

/// Route a request to the first tool that accepts it
pub fn execute_tool_request(request: &ToolRequest, settings: &AppSettings) -> AppResult<ToolResponse> {
    for tool in AppTool::all() {
        if !tool.handles(request) {
            continue;
        }
        match tool.execute(request, settings) {
            Ok(response) => {
                tracing::debug!(tool = tool.id(), kind = request.kind(), "request handled");
                return Ok(response);
            }
            Err(AppError::UnsupportedAction(_)) => continue,
            Err(e) => {
                tracing::warn!(tool = tool.id(), kind = request.kind(), error = %e, "tool failed");
                return Err(e);
            }
        }
    }

    Err(AppError::UnsupportedAction(request.kind().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::{ConvertUnitsRequest, EmiRequest, EvaluateRequest};
    use std::collections::HashSet;

    #[test]
    fn test_tool_ids_are_unique() {
        let ids: HashSet<&str> = AppTool::all().iter().map(|t| t.id()).collect();
        assert_eq!(ids.len(), AppTool::all().len());
    }

    #[test]
    fn test_by_id() {
        assert!(matches!(AppTool::by_id("calculator"), Some(AppTool::Calculator(_))));
        assert!(AppTool::by_id("translator").is_none());
    }

    #[test]
    fn test_dispatch_routes_to_owner() {
        let settings = AppSettings::default();
        let request = ToolRequest::ConvertUnit(ConvertUnitsRequest {
            amount: 1.0,
            from_unit: "km".into(),
            to_unit: "m".into(),
            category: Some("length".into()),
        });
        let response = execute_tool_request(&request, &settings).unwrap();
        assert_eq!(response.tool_id, "unit_converter");

        let request = ToolRequest::Evaluate(EvaluateRequest { expression: "2 * 21".into() });
        let response = execute_tool_request(&request, &settings).unwrap();
        assert_eq!(response.tool_id, "calculator");
    }

    #[test]
    fn test_dispatch_surfaces_tool_errors() {
        let request = ToolRequest::CalculateEmi(EmiRequest {
            principal: 1000.0,
            annual_rate_percent: 5.0,
            tenure_years: 0.0,
        });
        assert!(matches!(
            execute_tool_request(&request, &AppSettings::default()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_every_request_kind_has_a_tool() {
        let tools = AppTool::all();
        let requests = [
            ToolRequest::Evaluate(EvaluateRequest { expression: "1".into() }),
            ToolRequest::CalculateEmi(EmiRequest { principal: 1.0, annual_rate_percent: 1.0, tenure_years: 1.0 }),
        ];
        for request in &requests {
            assert_eq!(tools.iter().filter(|t| t.handles(request)).count(), 1, "{}", request.kind());
        }
    }

    #[test]
    fn test_require_finite_non_negative() {
        assert!(require_finite_non_negative("x", 0.0).is_ok());
        assert!(require_finite_non_negative("x", -0.1).is_err());
        assert!(require_finite_non_negative("x", f64::NAN).is_err());
    }
}
