//! Free-text quantity parsing ("12 km", "km 12", "100°F", "3,5 feet")
//!
//! Extracts the first number/unit pair and resolves the unit through the
//! alias table built from the unit registry.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Unit, UnitCategory, CATEGORIES};
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::ParseUnitResponse;

// Spelled-out forms not derivable from the registry names
const EXTRA_ALIASES: &[(&str, &str)] = &[
    ("meters", "m"), ("metre", "m"), ("metres", "m"),
    ("kilometres", "km"), ("centimetres", "cm"), ("millimetres", "mm"),
    ("inches", "in"), ("\"", "in"), ("feet", "ft"), ("'", "ft"),
    ("miles", "mi"), ("yards", "yd"),
    ("grams", "g"), ("kilograms", "kg"), ("kgs", "kg"), ("lbs", "lb"), ("pounds", "lb"),
    ("ounces", "oz"), ("tons", "t"), ("tonnes", "t"),
    ("sec", "s"), ("secs", "s"), ("seconds", "s"), ("minutes", "min"), ("mins", "min"),
    ("hr", "h"), ("hrs", "h"), ("hours", "h"), ("days", "d"), ("weeks", "wk"),
    ("months", "mo"), ("years", "yr"),
    ("kph", "kmh"), ("kmph", "kmh"), ("kilometers per hour", "kmh"), ("miles per hour", "mph"),
    ("knots", "kn"),
    ("liters", "l"), ("litre", "l"), ("litres", "l"), ("milliliters", "ml"),
    ("gallons", "gal"), ("cups", "cup"), ("pints", "pt"), ("quarts", "qt"),
    ("fluid ounces", "floz"), ("fl-oz", "floz"),
    ("bytes", "B"), ("bits", "bit"), ("kib", "KB"), ("mib", "MB"), ("gib", "GB"),
    ("watts", "W"), ("kilowatts", "kW"),
    ("°c", "C"), ("celsius", "C"), ("°f", "F"), ("fahrenheit", "F"), ("kelvin", "K"),
];

/// Lower-cased alias → (category, unit)
static ALIASES: Lazy<HashMap<String, (&'static UnitCategory, &'static Unit)>> = Lazy::new(|| {
    let mut aliases = HashMap::new();
    for category in CATEGORIES {
        for unit in category.units {
            let name = unit.name.to_lowercase();
            for alias in [unit.id.to_lowercase(), unit.symbol.to_lowercase(), format!("{}s", name), name] {
                aliases.entry(alias).or_insert((category, unit));
            }
        }
    }
    for (alias, id) in EXTRA_ALIASES {
        if let Some(entry) = CATEGORIES
            .iter()
            .find_map(|c| c.units.iter().find(|u| u.id == *id).map(|u| (c, u)))
        {
            aliases.entry(alias.to_string()).or_insert(entry);
        }
    }
    aliases
});

static RE_NUMBER_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([+-]?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)\s*(.*)").expect("number-first pattern")
});

static RE_UNIT_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([^\d+\-.]+?)\s*([+-]?\d+(?:\.\d+)?)\s*$").expect("unit-first pattern")
});

/// Resolve a unit alias (case-insensitive); multi-word aliases are tried
/// longest first so "miles per hour" wins over "miles".
pub fn resolve_alias(text: &str) -> Option<(&'static UnitCategory, &'static Unit)> {
    let words: Vec<&str> = text.split_whitespace().collect();
    (1..=words.len())
        .rev()
        .find_map(|n| ALIASES.get(&words[..n].join(" ").to_lowercase()).copied())
}

/// Parse amount and unit from text (e.g. "100m", "12 km to miles", "lb 3")
pub fn parse_quantity(text: &str) -> AppResult<ParseUnitResponse> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Parse("Empty text".to_string()));
    }
    let normalized = text.replace(',', ".");

    let found = RE_NUMBER_FIRST
        .captures(&normalized)
        .and_then(|caps| {
            let amount = caps[1].parse::<f64>().ok()?;
            resolve_alias(&caps[2]).map(|hit| (amount, hit))
        })
        .or_else(|| {
            let caps = RE_UNIT_FIRST.captures(&normalized)?;
            let amount = caps[2].parse::<f64>().ok()?;
            resolve_alias(&caps[1]).map(|hit| (amount, hit))
        });

    match found {
        Some((amount, (category, unit))) => {
            tracing::debug!(text, amount, unit = unit.id, "parsed quantity");
            Ok(ParseUnitResponse {
                amount,
                unit: unit.id.to_string(),
                category: category.id.to_string(),
            })
        }
        None => Err(AppError::Parse(format!("Could not parse unit from text: {}", text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(text: &str) -> (f64, String, String) {
        let r = parse_quantity(text).unwrap();
        (r.amount, r.unit, r.category)
    }

    #[test]
    fn test_number_then_symbol() {
        assert_eq!(parsed("12km"), (12.0, "km".into(), "length".into()));
        assert_eq!(parsed("12 km"), (12.0, "km".into(), "length".into()));
    }

    #[test]
    fn test_spelled_out_and_plural() {
        assert_eq!(parsed("3.5 meters"), (3.5, "m".into(), "length".into()));
        assert_eq!(parsed("2 Kilograms"), (2.0, "kg".into(), "weight".into()));
        assert_eq!(parsed("60 miles per hour"), (60.0, "mph".into(), "speed".into()));
    }

    #[test]
    fn test_trailing_words_are_ignored() {
        assert_eq!(parsed("2 km to miles"), (2.0, "km".into(), "length".into()));
    }

    #[test]
    fn test_unit_first() {
        assert_eq!(parsed("lb 3"), (3.0, "lb".into(), "weight".into()));
    }

    #[test]
    fn test_comma_decimal_and_degree_symbol() {
        assert_eq!(parsed("3,5 feet"), (3.5, "ft".into(), "length".into()));
        assert_eq!(parsed("100°F"), (100.0, "F".into(), "temperature".into()));
        assert_eq!(parsed("-40 °C"), (-40.0, "C".into(), "temperature".into()));
    }

    #[test]
    fn test_data_sizes_keep_case_insensitive_lookup() {
        assert_eq!(parsed("512 MB"), (512.0, "MB".into(), "data".into()));
        assert_eq!(parsed("4 gb"), (4.0, "GB".into(), "data".into()));
    }

    #[test]
    fn test_failures() {
        assert!(matches!(parse_quantity(""), Err(AppError::Parse(_))));
        assert!(matches!(parse_quantity("hello world"), Err(AppError::Parse(_))));
        assert!(matches!(parse_quantity("12 parsecs"), Err(AppError::Parse(_))));
    }
}
