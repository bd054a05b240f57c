//! Tool catalog: browsing, search and ranking
//!
//! The catalog is a static table. Every entry names the dispatch tool that
//! executes it, so a search hit can be turned straight into a `ToolRequest`.

use serde::Serialize;
use std::collections::HashMap;

use crate::core::features::unit_converter::{category, locate_unit, parse_quantity};
use crate::shared::types::ToolRequest;

pub mod ranking;

pub use ranking::{rank_entries, UsageMetrics};

/// Top-level grouping shown when browsing
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Financial,
    UnitConversion,
    Currency,
    Math,
}

impl ToolCategory {
    pub const ALL: [ToolCategory; 4] = [
        ToolCategory::Financial,
        ToolCategory::UnitConversion,
        ToolCategory::Currency,
        ToolCategory::Math,
    ];

    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "financial" | "finance" => Some(ToolCategory::Financial),
            "unit_conversion" | "units" | "converters" => Some(ToolCategory::UnitConversion),
            "currency" => Some(ToolCategory::Currency),
            "math" => Some(ToolCategory::Math),
            _ => None,
        }
    }
}

/// What an entry does, with the fields that kind needs
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolKind {
    UnitConverter { unit_category: &'static str },
    Currency,
    Emi,
    Sip,
    CompoundInterest,
    Expression,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ToolEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: ToolCategory,
    #[serde(flatten)]
    pub kind: ToolKind,
    /// `AppTool` id that executes this entry
    pub tool_id: &'static str,
    pub keywords: &'static [&'static str],
    pub popular: bool,
}

const fn unit_entry(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    unit_category: &'static str,
    keywords: &'static [&'static str],
    popular: bool,
) -> ToolEntry {
    ToolEntry {
        id,
        name,
        description,
        category: ToolCategory::UnitConversion,
        kind: ToolKind::UnitConverter { unit_category },
        tool_id: "unit_converter",
        keywords,
        popular,
    }
}

pub static CATALOG: &[ToolEntry] = &[
    ToolEntry {
        id: "emi-calculator",
        name: "EMI Calculator",
        description: "Monthly installment, total interest and amortization schedule for a loan",
        category: ToolCategory::Financial,
        kind: ToolKind::Emi,
        tool_id: "emi_calculator",
        keywords: &["loan", "mortgage", "emi", "installment", "amortization", "home loan"],
        popular: true,
    },
    ToolEntry {
        id: "sip-calculator",
        name: "SIP Calculator",
        description: "Future value of a fixed monthly investment",
        category: ToolCategory::Financial,
        kind: ToolKind::Sip,
        tool_id: "investment_calculator",
        keywords: &["sip", "mutual fund", "investment", "monthly", "returns"],
        popular: true,
    },
    ToolEntry {
        id: "compound-interest-calculator",
        name: "Compound Interest Calculator",
        description: "Growth of a lump sum with periodic compounding",
        category: ToolCategory::Financial,
        kind: ToolKind::CompoundInterest,
        tool_id: "investment_calculator",
        keywords: &["interest", "compound", "savings", "deposit", "growth"],
        popular: false,
    },
    ToolEntry {
        id: "currency-converter",
        name: "Currency Converter",
        description: "Convert amounts between major currencies",
        category: ToolCategory::Currency,
        kind: ToolKind::Currency,
        tool_id: "currency_converter",
        keywords: &["money", "exchange", "forex", "usd", "eur", "inr"],
        popular: true,
    },
    ToolEntry {
        id: "calculator",
        name: "Calculator",
        description: "Evaluate arithmetic expressions",
        category: ToolCategory::Math,
        kind: ToolKind::Expression,
        tool_id: "calculator",
        keywords: &["math", "arithmetic", "percent", "expression"],
        popular: false,
    },
    unit_entry("length-converter", "Length Converter", "Meters, feet, miles and more", "length", &["distance", "meter", "feet", "inch", "mile"], true),
    unit_entry("weight-converter", "Weight Converter", "Kilograms, pounds, ounces and more", "weight", &["mass", "kg", "pound", "gram"], true),
    unit_entry("temperature-converter", "Temperature Converter", "Celsius, Fahrenheit, Kelvin, Rankine and Réaumur", "temperature", &["celsius", "fahrenheit", "kelvin", "heat"], true),
    unit_entry("time-converter", "Time Converter", "Seconds to years", "time", &["duration", "hours", "minutes", "seconds"], false),
    unit_entry("speed-converter", "Speed Converter", "km/h, mph, knots and more", "speed", &["velocity", "kmh", "mph", "knots"], false),
    unit_entry("area-converter", "Area Converter", "Square meters, acres, hectares and more", "area", &["acre", "hectare", "square"], false),
    unit_entry("volume-converter", "Volume Converter", "Liters, gallons, cups and more", "volume", &["liter", "gallon", "cup", "capacity"], false),
    unit_entry("data-converter", "Data Size Converter", "Bits and bytes up to petabytes", "data", &["storage", "bytes", "megabyte", "gigabyte"], false),
    unit_entry("power-converter", "Power Converter", "Watts, horsepower and BTU/h", "power", &["watt", "horsepower", "energy"], false),
    unit_entry("pressure-converter", "Pressure Converter", "Pascal, bar, psi and more", "pressure", &["psi", "bar", "atmosphere", "pascal"], false),
];

pub fn all_entries() -> &'static [ToolEntry] {
    CATALOG
}

pub fn find(id: &str) -> Option<&'static ToolEntry> {
    CATALOG.iter().find(|entry| entry.id == id)
}

pub fn by_category(category: ToolCategory) -> Vec<&'static ToolEntry> {
    CATALOG.iter().filter(|entry| entry.category == category).collect()
}

pub fn popular() -> Vec<&'static ToolEntry> {
    CATALOG.iter().filter(|entry| entry.popular).collect()
}

/// Catalog entry a request belongs to
pub fn entry_for_request(request: &ToolRequest) -> Option<&'static ToolEntry> {
    let wanted = match request {
        ToolRequest::ConvertUnit(req) => {
            let unit_category = match req.category.as_deref() {
                Some(id) => category(id).ok()?.id,
                None => locate_unit(&req.from_unit)?.0.id,
            };
            ToolKind::UnitConverter { unit_category }
        }
        ToolRequest::ConvertText(req) => {
            let parsed = parse_quantity(&req.text).ok()?;
            ToolKind::UnitConverter {
                unit_category: category(&parsed.category).ok()?.id,
            }
        }
        ToolRequest::ConvertCurrency(_) => ToolKind::Currency,
        ToolRequest::CalculateEmi(_) => ToolKind::Emi,
        ToolRequest::CalculateSip(_) => ToolKind::Sip,
        ToolRequest::CalculateCompoundInterest(_) => ToolKind::CompoundInterest,
        ToolRequest::Evaluate(_) => ToolKind::Expression,
    };
    CATALOG.iter().find(|entry| entry.kind == wanted)
}

// Score one lowercase term against an entry; 0 means no match
fn term_score(entry: &ToolEntry, term: &str) -> f64 {
    let name = entry.name.to_lowercase();
    if name == term {
        return 100.0;
    }
    if name.split_whitespace().any(|word| word.starts_with(term)) {
        return 60.0;
    }
    if entry.keywords.iter().any(|k| k.starts_with(term)) {
        return 40.0;
    }
    if name.contains(term) || entry.id.contains(term) {
        return 30.0;
    }
    if entry.description.to_lowercase().contains(term) {
        return 20.0;
    }
    0.0
}

/// Match score per entry id. Every term of the query must match.
pub fn match_scores(query: &str) -> HashMap<&'static str, f64> {
    let query = query.trim().to_lowercase();
    let terms: Vec<&str> = query.split_whitespace().collect();

    CATALOG
        .iter()
        .filter_map(|entry| {
            if terms.is_empty() {
                return Some((entry.id, 0.0));
            }
            let mut total = 0.0;
            for term in &terms {
                let score = term_score(entry, term);
                if score == 0.0 {
                    return None;
                }
                total += score;
            }
            // Whole-query name match beats the per-term sum
            if entry.name.to_lowercase() == query {
                total += 100.0;
            }
            Some((entry.id, total))
        })
        .collect()
}

/// Entries matching `query`, best match first. An empty query lists the
/// whole catalog in table order.
pub fn search(query: &str) -> Vec<&'static ToolEntry> {
    let scores = match_scores(query);
    let mut hits: Vec<(&'static ToolEntry, f64)> = CATALOG
        .iter()
        .filter_map(|entry| scores.get(entry.id).map(|score| (entry, *score)))
        .collect();

    hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    tracing::debug!(query, hits = hits.len(), "catalog search");
    hits.into_iter().map(|(entry, _)| entry).collect()
}

/// Search, then let usage history reorder the hits
pub fn search_with_usage(query: &str, metrics: &UsageMetrics) -> Vec<&'static ToolEntry> {
    let boost: HashMap<String, f64> = match_scores(query)
        .into_iter()
        .map(|(id, score)| (id.to_string(), score))
        .collect();
    rank_entries(search(query), |entry| entry.id.to_string(), metrics, Some(boost))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::unit_converter::all_categories;
    use crate::core::features::AppTool;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<&str> = CATALOG.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn test_every_entry_has_a_tool() {
        for entry in CATALOG {
            assert!(AppTool::by_id(entry.tool_id).is_some(), "{}", entry.id);
        }
    }

    #[test]
    fn test_every_unit_category_is_listed() {
        for category in all_categories() {
            assert!(
                CATALOG.iter().any(|e| e.kind == ToolKind::UnitConverter { unit_category: category.id }),
                "{}",
                category.id
            );
        }
    }

    #[test]
    fn test_search_by_name() {
        let hits = search("emi calculator");
        assert_eq!(hits[0].id, "emi-calculator");
    }

    #[test]
    fn test_search_by_keyword() {
        let hits = search("mortgage");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "emi-calculator");

        let hits = search("fahrenheit");
        assert_eq!(hits[0].id, "temperature-converter");
    }

    #[test]
    fn test_search_requires_every_term() {
        assert!(search("length mortgage").is_empty());
        assert!(search("zzz").is_empty());
    }

    #[test]
    fn test_empty_query_lists_everything() {
        assert_eq!(search("  ").len(), CATALOG.len());
    }

    #[test]
    fn test_by_category_and_popular() {
        let financial = by_category(ToolCategory::Financial);
        assert_eq!(financial.len(), 3);
        assert!(financial.iter().all(|e| e.category == ToolCategory::Financial));

        let total: usize = ToolCategory::ALL.iter().map(|c| by_category(*c).len()).sum();
        assert_eq!(total, CATALOG.len());

        assert!(popular().iter().any(|e| e.id == "currency-converter"));
        assert!(popular().iter().all(|e| e.popular));
    }

    #[test]
    fn test_category_from_id() {
        assert_eq!(ToolCategory::from_id("unit-conversion"), Some(ToolCategory::UnitConversion));
        assert_eq!(ToolCategory::from_id("Finance"), Some(ToolCategory::Financial));
        assert_eq!(ToolCategory::from_id("media"), None);
    }

    #[test]
    fn test_entry_serializes_kind_tag() {
        let json = serde_json::to_value(find("length-converter").unwrap()).unwrap();
        assert_eq!(json["kind"], "unit_converter");
        assert_eq!(json["unit_category"], "length");
        assert_eq!(json["category"], "unit_conversion");
    }

    #[test]
    fn test_entry_for_request() {
        use crate::shared::types::{ConvertTextRequest, ConvertUnitsRequest, EvaluateRequest};

        let by_symbol = ToolRequest::ConvertUnit(ConvertUnitsRequest {
            amount: 1.0,
            from_unit: "psi".into(),
            to_unit: "bar".into(),
            category: None,
        });
        assert_eq!(entry_for_request(&by_symbol).map(|e| e.id), Some("pressure-converter"));

        let text = ToolRequest::ConvertText(ConvertTextRequest {
            text: "5 km".into(),
            target_unit: "mi".into(),
        });
        assert_eq!(entry_for_request(&text).map(|e| e.id), Some("length-converter"));

        let eval = ToolRequest::Evaluate(EvaluateRequest { expression: "1".into() });
        assert_eq!(entry_for_request(&eval).map(|e| e.id), Some("calculator"));
    }

    #[test]
    fn test_usage_reorders_hits() {
        let metrics = UsageMetrics::new();
        let plain = search("converter");
        let last = plain.last().unwrap().id;
        for _ in 0..50 {
            metrics.record_usage(last);
        }
        let ranked = search_with_usage("converter", &metrics);
        assert_eq!(ranked[0].id, last);
        assert_eq!(ranked.len(), plain.len());
    }
}
