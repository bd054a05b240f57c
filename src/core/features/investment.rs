//! Growth calculators: SIP (monthly contributions) and lump-sum compound interest

use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::AppSettings;
use crate::shared::types::{
    CompoundInterestResult, CompoundYearRow, SipCalculationResult, SipYearRow, ToolRequest, ToolResponse,
};
use super::{require_finite_non_negative, Tool};
use serde_json::json;

// Annuity-due future value: each contribution is made at the start of its month.
fn sip_future_value(monthly_investment: f64, monthly_rate: f64, months: f64) -> f64 {
    if monthly_rate == 0.0 {
        return monthly_investment * months;
    }
    monthly_investment * ((1.0 + monthly_rate).powf(months) - 1.0) / monthly_rate * (1.0 + monthly_rate)
}

/// Future value of a fixed monthly contribution over `years`.
///
/// The yearly projection recomputes the closed form for each elapsed year
/// rather than accumulating, so every row is independent of rounding in
/// earlier rows.
pub fn calculate_sip(monthly_investment: f64, annual_return_percent: f64, years: u32) -> AppResult<SipCalculationResult> {
    require_finite_non_negative("monthly investment", monthly_investment)?;
    require_finite_non_negative("annual return", annual_return_percent)?;

    let monthly_rate = annual_return_percent / 100.0 / 12.0;
    let months = f64::from(years) * 12.0;

    let future_value = sip_future_value(monthly_investment, monthly_rate, months);
    let invested = monthly_investment * months;

    let yearly_data = (1..=years)
        .map(|year| {
            let elapsed = f64::from(year) * 12.0;
            let value = sip_future_value(monthly_investment, monthly_rate, elapsed);
            let invested = monthly_investment * elapsed;
            SipYearRow {
                year,
                invested,
                value,
                returns: value - invested,
            }
        })
        .collect();

    tracing::debug!(monthly_investment, annual_return_percent, years, future_value, "computed SIP");

    Ok(SipCalculationResult {
        future_value,
        invested,
        returns: future_value - invested,
        yearly_data,
    })
}

/// Lump sum compounded `frequency` times per year
pub fn calculate_compound_interest(
    principal: f64,
    annual_rate_percent: f64,
    years: u32,
    frequency: u32,
) -> AppResult<CompoundInterestResult> {
    require_finite_non_negative("principal", principal)?;
    require_finite_non_negative("annual rate", annual_rate_percent)?;
    if frequency == 0 {
        return Err(AppError::Validation("Compounding frequency must be at least 1".to_string()));
    }

    let rate = annual_rate_percent / 100.0;
    let periodic = 1.0 + rate / f64::from(frequency);
    let value_after = |elapsed_years: u32| principal * periodic.powf(f64::from(frequency) * f64::from(elapsed_years));

    let future_value = value_after(years);
    let yearly_data = (1..=years)
        .map(|year| {
            let value = value_after(year);
            CompoundYearRow {
                year,
                value,
                interest: value - principal,
            }
        })
        .collect();

    Ok(CompoundInterestResult {
        future_value,
        compound_interest: future_value - principal,
        yearly_data,
    })
}

#[derive(Clone)]
pub struct InvestmentTool;

impl Tool for InvestmentTool {
    fn id(&self) -> &'static str {
        "investment_calculator"
    }

    fn handles(&self, request: &ToolRequest) -> bool {
        matches!(request, ToolRequest::CalculateSip(_) | ToolRequest::CalculateCompoundInterest(_))
    }

    fn execute(&self, request: &ToolRequest, _settings: &AppSettings) -> AppResult<ToolResponse> {
        let (summary, data) = match request {
            ToolRequest::CalculateSip(req) => {
                let result = calculate_sip(req.monthly_investment, req.annual_return_percent, req.years)?;
                (
                    format!("Future value {:.2} (invested {:.2})", result.future_value, result.invested),
                    json!(result),
                )
            }
            ToolRequest::CalculateCompoundInterest(req) => {
                let result = calculate_compound_interest(
                    req.principal,
                    req.annual_rate_percent,
                    req.years,
                    req.compounding_frequency,
                )?;
                (
                    format!("Future value {:.2} (interest {:.2})", result.future_value, result.compound_interest),
                    json!(result),
                )
            }
            other => return Err(AppError::UnsupportedAction(other.kind().to_string())),
        };

        Ok(ToolResponse {
            tool_id: self.id().to_string(),
            summary,
            data,
        })
    }
}
