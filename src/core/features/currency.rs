//! Currency converter over a static USD-based rate snapshot
//!
//! Rates are `Decimal` end to end; cross rates are triangulated through USD.

use std::collections::HashMap;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::json;

use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::AppSettings;
use crate::shared::types::{ConvertCurrencyRequest, ConvertCurrencyResponse, ToolRequest, ToolResponse};
use super::Tool;

const BASE_CURRENCY: &str = "USD";

/// Units of currency per 1 USD, as (code, mantissa, scale)
const RATE_SNAPSHOT: &[(&str, i64, u32)] = &[
    ("USD", 1, 0),
    ("EUR", 92, 2),
    ("GBP", 79, 2),
    ("JPY", 14950, 2),
    ("AUD", 153, 2),
    ("CAD", 136, 2),
    ("CHF", 88, 2),
    ("CNY", 724, 2),
    ("INR", 8312, 2),
    ("MXN", 1705, 2),
    ("BRL", 497, 2),
    ("KRW", 133250, 2),
    ("SGD", 134, 2),
    ("AED", 3673, 3),
];

/// Immutable rate table keyed by ISO code
#[derive(Debug, Clone)]
pub struct RateTable {
    rates: HashMap<String, Decimal>,
}

static DEFAULT_RATES: Lazy<RateTable> = Lazy::new(|| {
    RateTable::from_pairs(
        RATE_SNAPSHOT
            .iter()
            .map(|(code, mantissa, scale)| (code.to_string(), Decimal::new(*mantissa, *scale))),
    )
});

impl RateTable {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Decimal)>) -> Self {
        Self {
            rates: pairs
                .into_iter()
                .map(|(code, rate)| (code.to_ascii_uppercase(), rate))
                .collect(),
        }
    }

    /// Bundled snapshot
    pub fn snapshot() -> &'static RateTable {
        &DEFAULT_RATES
    }

    pub fn rate(&self, code: &str) -> AppResult<Decimal> {
        self.rates
            .get(&code.trim().to_ascii_uppercase())
            .copied()
            .ok_or_else(|| AppError::UnsupportedCurrency(code.to_string()))
    }

    /// Supported codes, sorted with the base currency first
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.rates.keys().cloned().collect();
        codes.sort_by(|a, b| (a != BASE_CURRENCY).cmp(&(b != BASE_CURRENCY)).then_with(|| a.cmp(b)));
        codes
    }

    pub fn convert(&self, amount: Decimal, from: &str, to: &str) -> AppResult<ConvertCurrencyResponse> {
        let from_code = from.trim().to_ascii_uppercase();
        let to_code = to.trim().to_ascii_uppercase();
        let from_rate = self.rate(&from_code)?;
        let to_rate = self.rate(&to_code)?;

        // Cross-rate relative to USD: (Amount / Rate_From) * Rate_To
        let rate = triangulate(Decimal::ONE, from_rate, to_rate)?;
        let result = triangulate(amount, from_rate, to_rate)?;

        tracing::debug!(%amount, from = %from_code, to = %to_code, %result, "converted currency");

        Ok(ConvertCurrencyResponse {
            result,
            rate,
            from: from_code,
            to: to_code,
        })
    }
}

fn triangulate(amount: Decimal, from_rate: Decimal, to_rate: Decimal) -> AppResult<Decimal> {
    if amount.is_zero() || from_rate == to_rate {
        return Ok(amount);
    }

    if from_rate.is_zero() {
        return Err(AppError::Calculation("Division by zero".into()));
    }

    amount
        .checked_div(from_rate)
        .ok_or_else(|| AppError::Calculation("Division overflow".into()))?
        .checked_mul(to_rate)
        .ok_or_else(|| AppError::Calculation("Multiplication overflow".into()))
}

fn is_valid_code(code: &str) -> bool {
    let code = code.trim();
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Parse inputs like "$10", "1,250.50 eur" or "jpy 500" into amount and code.
/// A bare number is taken as `default_code`.
pub fn parse_money(input: &str, default_code: &str) -> Option<(Decimal, String)> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^([^\d\.,]*)([\d\.,]+)([^\d\.,]*)$").expect("money pattern")
    });

    let caps = RE.captures(input.trim())?;
    let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("").trim();
    let number_raw = caps.get(2)?.as_str().replace(',', "");
    let suffix = caps.get(3).map(|m| m.as_str()).unwrap_or("").trim();

    let amount = Decimal::from_str(&number_raw).ok()?;

    let map_token = |raw: &str| -> Option<String> {
        let token = raw.trim().to_ascii_lowercase();
        match token.as_str() {
            "" => None,
            "$" | "usd" | "dollar" | "dollars" => Some("USD".to_string()),
            "€" | "eur" | "euro" | "euros" => Some("EUR".to_string()),
            "£" | "gbp" | "pound" | "pounds" => Some("GBP".to_string()),
            "¥" | "jpy" | "yen" => Some("JPY".to_string()),
            "₹" | "inr" | "rupee" | "rupees" => Some("INR".to_string()),
            _ if is_valid_code(&token) => Some(token.to_ascii_uppercase()),
            _ => None,
        }
    };

    let code = map_token(suffix)
        .or_else(|| map_token(prefix))
        .or_else(|| (prefix.is_empty() && suffix.is_empty()).then(|| default_code.to_ascii_uppercase()))?;

    Some((amount, code))
}

#[derive(Clone)]
pub struct CurrencyTool;

impl Tool for CurrencyTool {
    fn id(&self) -> &'static str {
        "currency_converter"
    }

    fn handles(&self, request: &ToolRequest) -> bool {
        matches!(request, ToolRequest::ConvertCurrency(_))
    }

    fn execute(&self, request: &ToolRequest, _settings: &AppSettings) -> AppResult<ToolResponse> {
        let ToolRequest::ConvertCurrency(ConvertCurrencyRequest { amount, from, to }) = request else {
            return Err(AppError::UnsupportedAction(request.kind().to_string()));
        };

        let response = RateTable::snapshot().convert(*amount, from, to)?;
        Ok(ToolResponse {
            tool_id: self.id().to_string(),
            summary: format!("{} {}", response.result.round_dp(2), response.to),
            data: json!(response),
        })
    }
}
