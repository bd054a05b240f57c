//! Default inputs registry
//!
//! Maps catalog entries to the prefilled request a tool opens with.

use rust_decimal::Decimal;

use crate::core::catalog::{self, ToolKind};
use crate::shared::settings::AppSettings;
use crate::shared::types::{
    CompoundInterestRequest, ConvertCurrencyRequest, ConvertUnitsRequest, EmiRequest, EvaluateRequest, SipRequest,
    ToolRequest,
};

/// Starting (amount, from, to) for a unit category
pub fn unit_defaults(unit_category: &str) -> (f64, &'static str, &'static str) {
    match unit_category {
        "length" => (1.0, "m", "ft"),
        "weight" => (1.0, "kg", "lb"),
        "time" => (1.0, "h", "min"),
        "speed" => (100.0, "kmh", "mph"),
        "area" => (1.0, "ac", "m2"),
        "volume" => (1.0, "gal", "l"),
        "data" => (1.0, "GB", "MB"),
        "power" => (1.0, "hp", "kW"),
        "pressure" => (1.0, "atm", "psi"),
        "temperature" => (100.0, "C", "F"),
        _ => (1.0, "", ""), // Unknown category
    }
}

/// Prefilled request for a catalog entry, or `None` for unknown ids
pub fn default_request(entry_id: &str, settings: &AppSettings) -> Option<ToolRequest> {
    let entry = catalog::find(entry_id)?;
    let request = match entry.kind {
        ToolKind::UnitConverter { unit_category } => {
            let (amount, from, to) = unit_defaults(unit_category);
            ToolRequest::ConvertUnit(ConvertUnitsRequest {
                amount,
                from_unit: from.to_string(),
                to_unit: to.to_string(),
                category: Some(unit_category.to_string()),
            })
        }
        ToolKind::Currency => ToolRequest::ConvertCurrency(ConvertCurrencyRequest {
            amount: Decimal::ONE_HUNDRED,
            from: settings.preferences.default_currency_from.clone(),
            to: settings.preferences.default_currency_to.clone(),
        }),
        ToolKind::Emi => ToolRequest::CalculateEmi(EmiRequest {
            principal: 500_000.0,
            annual_rate_percent: 8.5,
            tenure_years: 20.0,
        }),
        ToolKind::Sip => ToolRequest::CalculateSip(SipRequest {
            monthly_investment: 10_000.0,
            annual_return_percent: 12.0,
            years: 10,
        }),
        ToolKind::CompoundInterest => ToolRequest::CalculateCompoundInterest(CompoundInterestRequest {
            principal: 100_000.0,
            annual_rate_percent: 10.0,
            years: 5,
            compounding_frequency: 12,
        }),
        ToolKind::Expression => ToolRequest::Evaluate(EvaluateRequest {
            expression: "0".to_string(),
        }),
    };
    Some(request)
}
