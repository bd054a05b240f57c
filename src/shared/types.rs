use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ts_rs::TS;

// ===== Requests =====

/// Every operation the front end can ask a tool to run.
/// Adjacently tagged so the TypeScript side can switch on `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload")]
#[ts(export)]
pub enum ToolRequest {
    ConvertUnit(ConvertUnitsRequest),
    /// Free text such as "12 km" converted into `target_unit`
    ConvertText(ConvertTextRequest),
    ConvertCurrency(ConvertCurrencyRequest),
    CalculateEmi(EmiRequest),
    CalculateSip(SipRequest),
    CalculateCompoundInterest(CompoundInterestRequest),
    Evaluate(EvaluateRequest),
}

impl ToolRequest {
    /// Stable name of the request kind, used in logs and history
    pub fn kind(&self) -> &'static str {
        match self {
            ToolRequest::ConvertUnit(_) => "convert_unit",
            ToolRequest::ConvertText(_) => "convert_text",
            ToolRequest::ConvertCurrency(_) => "convert_currency",
            ToolRequest::CalculateEmi(_) => "calculate_emi",
            ToolRequest::CalculateSip(_) => "calculate_sip",
            ToolRequest::CalculateCompoundInterest(_) => "calculate_compound_interest",
            ToolRequest::Evaluate(_) => "evaluate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConvertUnitsRequest {
    pub amount: f64,
    pub from_unit: String,
    pub to_unit: String,
    /// Category id; inferred from `from_unit` when absent
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConvertTextRequest {
    pub text: String,
    pub target_unit: String,
}

/// Amount accepts either a JSON number or a string to avoid JS float
/// precision loss; it is parsed into `Decimal` for all calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConvertCurrencyRequest {
    #[ts(type = "string")]
    #[serde(serialize_with = "serialize_decimal", deserialize_with = "deserialize_decimal")]
    pub amount: Decimal,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmiRequest {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub tenure_years: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SipRequest {
    pub monthly_investment: f64,
    pub annual_return_percent: f64,
    pub years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompoundInterestRequest {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub years: u32,
    /// Compounding periods per year (12 = monthly)
    pub compounding_frequency: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EvaluateRequest {
    pub expression: String,
}

// ===== Responses =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ToolResponse {
    pub tool_id: String,
    /// One-line human readable result, e.g. "0.3048 m"
    pub summary: String,
    #[ts(type = "any")]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConvertUnitsResponse {
    pub result: f64,
    pub formatted_result: String,
    pub from_unit: String,
    pub to_unit: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ParseUnitResponse {
    pub amount: f64,
    pub unit: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnitDto {
    pub id: String,      // e.g. "m", "kg"
    pub label: String,   // e.g. "Meter"
    pub symbol: String,  // e.g. "m", "°C"
    pub category: String,
}

/// Decimal fields are serialized as strings to protect precision across IPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConvertCurrencyResponse {
    #[ts(type = "string")]
    #[serde(serialize_with = "serialize_decimal", deserialize_with = "deserialize_decimal")]
    pub result: Decimal,
    #[ts(type = "string")]
    #[serde(serialize_with = "serialize_decimal", deserialize_with = "deserialize_decimal")]
    pub rate: Decimal,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AmortizationRow {
    pub month: u32,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoanCalculationResult {
    pub monthly_payment: f64,
    pub total_interest: f64,
    pub total_amount: f64,
    pub schedule: Vec<AmortizationRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SipYearRow {
    pub year: u32,
    pub invested: f64,
    pub value: f64,
    pub returns: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SipCalculationResult {
    pub future_value: f64,
    pub invested: f64,
    pub returns: f64,
    pub yearly_data: Vec<SipYearRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompoundYearRow {
    pub year: u32,
    pub value: f64,
    pub interest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompoundInterestResult {
    pub future_value: f64,
    pub compound_interest: f64,
    pub yearly_data: Vec<CompoundYearRow>,
}

// ---- Serde helpers ----

fn serialize_decimal<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(f64),
        Str(String),
    }

    match NumOrString::deserialize(deserializer)? {
        NumOrString::Num(n) => Decimal::try_from(n).map_err(serde::de::Error::custom),
        NumOrString::Str(s) => Decimal::from_str_exact(s.trim()).map_err(serde::de::Error::custom),
    }
}
