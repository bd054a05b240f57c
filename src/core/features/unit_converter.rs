use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::AppSettings;
use crate::shared::types::{ConvertUnitsRequest, ConvertUnitsResponse, ToolRequest, ToolResponse, UnitDto};
use super::Tool;
use serde_json::json;

pub mod parsing;

pub use parsing::parse_quantity;

// ============================================================================
// Unit Registry
// ============================================================================

/// How values move between units of one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    /// `value * from.factor / to.factor`
    Linear,
    /// Affine scales, routed through Celsius
    Temperature,
}

/// Unit definition with conversion factor to the category base unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    pub id: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub factor: f64,
    /// Affine shift, temperature only: celsius = (value - offset) * factor
    pub offset: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct UnitCategory {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: ConversionKind,
    pub units: &'static [Unit],
}

impl UnitCategory {
    pub fn contains(&self, unit: &Unit) -> bool {
        self.units.iter().any(|u| u.id == unit.id)
    }

    /// Look a unit up by id, then symbol, then case-insensitive name
    pub fn find_unit(&self, key: &str) -> Option<&'static Unit> {
        let key = key.trim();
        let units: &'static [Unit] = self.units;
        units
            .iter()
            .find(|u| u.id == key)
            .or_else(|| units.iter().find(|u| u.symbol == key))
            .or_else(|| units.iter().find(|u| u.name.eq_ignore_ascii_case(key)))
    }

    pub fn base_unit(&self) -> Option<&'static Unit> {
        let units: &'static [Unit] = self.units;
        units.iter().find(|u| u.factor == 1.0 && u.offset.unwrap_or(0.0) == 0.0)
    }
}

const fn linear(id: &'static str, name: &'static str, symbol: &'static str, factor: f64) -> Unit {
    Unit { id, name, symbol, factor, offset: None }
}

// Length (base: meter)
const LENGTH_UNITS: &[Unit] = &[
    linear("um", "Micrometer", "µm", 1e-6),
    linear("mm", "Millimeter", "mm", 0.001),
    linear("cm", "Centimeter", "cm", 0.01),
    linear("m", "Meter", "m", 1.0),
    linear("km", "Kilometer", "km", 1000.0),
    linear("in", "Inch", "in", 0.0254),
    linear("ft", "Foot", "ft", 0.3048),
    linear("yd", "Yard", "yd", 0.9144),
    linear("mi", "Mile", "mi", 1609.344),
    linear("nmi", "Nautical Mile", "nmi", 1852.0),
];

// Weight (base: kilogram)
const WEIGHT_UNITS: &[Unit] = &[
    linear("mg", "Milligram", "mg", 1e-6),
    linear("g", "Gram", "g", 0.001),
    linear("kg", "Kilogram", "kg", 1.0),
    linear("t", "Metric Ton", "t", 1000.0),
    linear("oz", "Ounce", "oz", 0.028349523125),
    linear("lb", "Pound", "lb", 0.45359237),
    linear("st", "Stone", "st", 6.35029318),
];

// Time (base: second)
const TIME_UNITS: &[Unit] = &[
    linear("ms", "Millisecond", "ms", 0.001),
    linear("s", "Second", "s", 1.0),
    linear("min", "Minute", "min", 60.0),
    linear("h", "Hour", "h", 3600.0),
    linear("d", "Day", "d", 86400.0),
    linear("wk", "Week", "wk", 604800.0),
    linear("mo", "Month", "mo", 2629746.0),
    linear("yr", "Year", "yr", 31556952.0),
];

// Speed (base: meter per second)
const SPEED_UNITS: &[Unit] = &[
    linear("mps", "Meter per Second", "m/s", 1.0),
    linear("kmh", "Kilometer per Hour", "km/h", 1.0 / 3.6),
    linear("mph", "Mile per Hour", "mph", 0.44704),
    linear("fps", "Foot per Second", "ft/s", 0.3048),
    linear("kn", "Knot", "kn", 1852.0 / 3600.0),
];

// Area (base: square meter)
const AREA_UNITS: &[Unit] = &[
    linear("mm2", "Square Millimeter", "mm²", 1e-6),
    linear("cm2", "Square Centimeter", "cm²", 1e-4),
    linear("m2", "Square Meter", "m²", 1.0),
    linear("ha", "Hectare", "ha", 10000.0),
    linear("km2", "Square Kilometer", "km²", 1e6),
    linear("in2", "Square Inch", "in²", 0.00064516),
    linear("ft2", "Square Foot", "ft²", 0.09290304),
    linear("yd2", "Square Yard", "yd²", 0.83612736),
    linear("ac", "Acre", "ac", 4046.8564224),
    linear("mi2", "Square Mile", "mi²", 2589988.110336),
];

// Volume (base: liter)
const VOLUME_UNITS: &[Unit] = &[
    linear("ml", "Milliliter", "mL", 0.001),
    linear("l", "Liter", "L", 1.0),
    linear("m3", "Cubic Meter", "m³", 1000.0),
    linear("tsp", "Teaspoon", "tsp", 0.00492892159375),
    linear("tbsp", "Tablespoon", "tbsp", 0.01478676478125),
    linear("floz", "Fluid Ounce", "fl oz", 0.0295735295625),
    linear("cup", "Cup", "cup", 0.2365882365),
    linear("pt", "Pint", "pt", 0.473176473),
    linear("qt", "Quart", "qt", 0.946352946),
    linear("gal", "Gallon", "gal", 3.785411784),
];

// Data size (base: byte, binary prefixes)
const DATA_UNITS: &[Unit] = &[
    linear("bit", "Bit", "bit", 0.125),
    linear("B", "Byte", "B", 1.0),
    linear("KB", "Kilobyte", "KB", 1024.0),
    linear("MB", "Megabyte", "MB", 1048576.0),
    linear("GB", "Gigabyte", "GB", 1073741824.0),
    linear("TB", "Terabyte", "TB", 1099511627776.0),
    linear("PB", "Petabyte", "PB", 1125899906842624.0),
];

// Power (base: watt)
const POWER_UNITS: &[Unit] = &[
    linear("W", "Watt", "W", 1.0),
    linear("kW", "Kilowatt", "kW", 1000.0),
    linear("MW", "Megawatt", "MW", 1e6),
    linear("hp", "Horsepower", "hp", 745.69987158227022),
    linear("btuh", "BTU per Hour", "BTU/h", 0.29307107017),
];

// Pressure (base: pascal)
const PRESSURE_UNITS: &[Unit] = &[
    linear("Pa", "Pascal", "Pa", 1.0),
    linear("kPa", "Kilopascal", "kPa", 1000.0),
    linear("bar", "Bar", "bar", 100000.0),
    linear("atm", "Atmosphere", "atm", 101325.0),
    linear("psi", "Pound per Square Inch", "psi", 6894.757293168),
    linear("mmHg", "Millimeter of Mercury", "mmHg", 133.322387415),
    linear("torr", "Torr", "Torr", 101325.0 / 760.0),
];

// Temperature (reference: Celsius)
const TEMPERATURE_UNITS: &[Unit] = &[
    Unit { id: "C", name: "Celsius", symbol: "°C", factor: 1.0, offset: Some(0.0) },
    Unit { id: "F", name: "Fahrenheit", symbol: "°F", factor: 5.0 / 9.0, offset: Some(32.0) },
    Unit { id: "K", name: "Kelvin", symbol: "K", factor: 1.0, offset: Some(273.15) },
    Unit { id: "R", name: "Rankine", symbol: "°R", factor: 5.0 / 9.0, offset: Some(491.67) },
    Unit { id: "Re", name: "Réaumur", symbol: "°Ré", factor: 1.25, offset: Some(0.0) },
];

/// Every category, in display order
pub static CATEGORIES: &[UnitCategory] = &[
    UnitCategory { id: "length", name: "Length", kind: ConversionKind::Linear, units: LENGTH_UNITS },
    UnitCategory { id: "weight", name: "Weight", kind: ConversionKind::Linear, units: WEIGHT_UNITS },
    UnitCategory { id: "time", name: "Time", kind: ConversionKind::Linear, units: TIME_UNITS },
    UnitCategory { id: "speed", name: "Speed", kind: ConversionKind::Linear, units: SPEED_UNITS },
    UnitCategory { id: "area", name: "Area", kind: ConversionKind::Linear, units: AREA_UNITS },
    UnitCategory { id: "volume", name: "Volume", kind: ConversionKind::Linear, units: VOLUME_UNITS },
    UnitCategory { id: "data", name: "Data Size", kind: ConversionKind::Linear, units: DATA_UNITS },
    UnitCategory { id: "power", name: "Power", kind: ConversionKind::Linear, units: POWER_UNITS },
    UnitCategory { id: "pressure", name: "Pressure", kind: ConversionKind::Linear, units: PRESSURE_UNITS },
    UnitCategory { id: "temperature", name: "Temperature", kind: ConversionKind::Temperature, units: TEMPERATURE_UNITS },
];

pub fn all_categories() -> &'static [UnitCategory] {
    CATEGORIES
}

pub fn category(id: &str) -> AppResult<&'static UnitCategory> {
    CATEGORIES
        .iter()
        .find(|c| c.id.eq_ignore_ascii_case(id.trim()))
        .ok_or_else(|| AppError::CategoryNotFound(id.to_string()))
}

/// Find the category owning a unit id or symbol; ids are unique across categories
pub fn locate_unit(key: &str) -> Option<(&'static UnitCategory, &'static Unit)> {
    CATEGORIES
        .iter()
        .find_map(|c| c.units.iter().find(|u| u.id == key.trim()).map(|u| (c, u)))
        .or_else(|| {
            CATEGORIES
                .iter()
                .find_map(|c| c.find_unit(key).map(|u| (c, u)))
        })
}

/// All units flattened for the front end, in registry order
pub fn all_units() -> Vec<UnitDto> {
    CATEGORIES
        .iter()
        .flat_map(|c| {
            c.units.iter().map(move |u| UnitDto {
                id: u.id.to_string(),
                label: u.name.to_string(),
                symbol: u.symbol.to_string(),
                category: c.id.to_string(),
            })
        })
        .collect()
}

// ============================================================================
// Conversion
// ============================================================================

/// Convert `value` between two units of `category`.
///
/// Returns `0.0` when either unit does not belong to `category`; callers
/// that need to tell this apart from a real zero use [`try_convert`].
/// Temperatures below absolute zero are converted as-is.
pub fn convert(value: f64, from: &Unit, to: &Unit, category: &UnitCategory) -> f64 {
    if !category.contains(from) || !category.contains(to) {
        tracing::warn!(from = from.id, to = to.id, category = category.id, "unit outside category, returning 0");
        return 0.0;
    }

    match category.kind {
        ConversionKind::Linear => value * from.factor / to.factor,
        ConversionKind::Temperature => convert_temperature(value, from, to),
    }
}

/// Strict form of [`convert`]: unknown units are an error
pub fn try_convert(value: f64, from: &Unit, to: &Unit, category: &UnitCategory) -> AppResult<f64> {
    for unit in [from, to] {
        if !category.contains(unit) {
            return Err(AppError::UnitNotFound {
                unit: unit.id.to_string(),
                category: category.id.to_string(),
            });
        }
    }
    Ok(convert(value, from, to, category))
}

// Source → Celsius → target, using each unit's affine (offset, factor) pair
fn convert_temperature(value: f64, from: &Unit, to: &Unit) -> f64 {
    let celsius = (value - from.offset.unwrap_or(0.0)) * from.factor;
    celsius / to.factor + to.offset.unwrap_or(0.0)
}

/// Convert by unit key inside a named category, or locate the category
/// from `from_key` when none is given.
pub fn convert_by_key(
    value: f64,
    from_key: &str,
    to_key: &str,
    category_id: Option<&str>,
) -> AppResult<ConvertUnitsResponse> {
    let category = match category_id {
        Some(id) => category(id)?,
        None => locate_unit(from_key)
            .map(|(c, _)| c)
            .ok_or_else(|| AppError::UnitNotFound {
                unit: from_key.to_string(),
                category: "any".to_string(),
            })?,
    };

    let not_found = |key: &str| AppError::UnitNotFound {
        unit: key.to_string(),
        category: category.id.to_string(),
    };
    let from = category.find_unit(from_key).ok_or_else(|| not_found(from_key))?;
    let to = category.find_unit(to_key).ok_or_else(|| not_found(to_key))?;

    let result = try_convert(value, from, to, category)?;
    tracing::debug!(value, from = from.id, to = to.id, result, "converted");

    Ok(ConvertUnitsResponse {
        result,
        formatted_result: format_result(result),
        from_unit: from.id.to_string(),
        to_unit: to.id.to_string(),
        category: category.id.to_string(),
    })
}

// ============================================================================
// Formatting
// ============================================================================

/// Display rule for conversion results.
///
/// `|v| >= 1e6` or `|v| < 1e-6` → exponential with 6 significant digits
/// (`1.23457e+6`); otherwise 8 significant digits with trailing zeros dropped.
pub fn format_result(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if magnitude >= 1e6 || magnitude < 1e-6 {
        return format_exponential(value);
    }

    let exponent = magnitude.log10().floor() as i32;
    let decimals = (7 - exponent).max(0) as usize;
    let rounded = format!("{:.*}", decimals, value);
    match rounded.parse::<f64>() {
        Ok(parsed) => parsed.to_string(),
        Err(_) => rounded,
    }
}

// Rust renders `1.23457e6`; the front end expects `1.23457e+6`
fn format_exponential(value: f64) -> String {
    let raw = format!("{:.5e}", value);
    match raw.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        Some((mantissa, exp)) => format!("{}e{}", mantissa, exp),
        None => raw,
    }
}

// ============================================================================
// Tool Implementation
// ============================================================================

#[derive(Clone)]
pub struct UnitConverterTool;

impl UnitConverterTool {
    fn convert_request(&self, request: &ConvertUnitsRequest, settings: &AppSettings) -> AppResult<ConvertUnitsResponse> {
        match convert_by_key(
            request.amount,
            &request.from_unit,
            &request.to_unit,
            request.category.as_deref(),
        ) {
            Err(AppError::UnitNotFound { unit, category }) if !settings.preferences.strict_units => {
                tracing::warn!(unit = %unit, category = %category, "lenient mode: unknown unit converts to 0");
                Ok(ConvertUnitsResponse {
                    result: 0.0,
                    formatted_result: format_result(0.0),
                    from_unit: request.from_unit.clone(),
                    to_unit: request.to_unit.clone(),
                    category,
                })
            }
            other => other,
        }
    }
}

impl Tool for UnitConverterTool {
    fn id(&self) -> &'static str {
        "unit_converter"
    }

    fn handles(&self, request: &ToolRequest) -> bool {
        matches!(request, ToolRequest::ConvertUnit(_) | ToolRequest::ConvertText(_))
    }

    fn execute(&self, request: &ToolRequest, settings: &AppSettings) -> AppResult<ToolResponse> {
        let response = match request {
            ToolRequest::ConvertUnit(req) => self.convert_request(req, settings)?,
            ToolRequest::ConvertText(req) => {
                let parsed = parse_quantity(&req.text)?;
                self.convert_request(
                    &ConvertUnitsRequest {
                        amount: parsed.amount,
                        from_unit: parsed.unit,
                        to_unit: req.target_unit.clone(),
                        category: Some(parsed.category),
                    },
                    settings,
                )?
            }
            other => return Err(AppError::UnsupportedAction(other.kind().to_string())),
        };

        let summary = format!("{} {}", response.formatted_result, response.to_unit);
        Ok(ToolResponse {
            tool_id: self.id().to_string(),
            summary,
            data: json!(response),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit(category_id: &str, key: &str) -> (&'static UnitCategory, &'static Unit) {
        let c = category(category_id).unwrap();
        (c, c.find_unit(key).unwrap())
    }

    #[test]
    fn test_foot_to_meter() {
        let (length, ft) = unit("length", "ft");
        let (_, m) = unit("length", "m");
        assert_relative_eq!(convert(1.0, ft, m, length), 0.3048, max_relative = 1e-12);
    }

    #[test]
    fn test_kilogram_to_pound() {
        let (weight, kg) = unit("weight", "kg");
        let (_, lb) = unit("weight", "lb");
        assert_relative_eq!(convert(1.0, kg, lb, weight), 2.2046, epsilon = 1e-4);
    }

    #[test]
    fn test_linear_round_trip_every_pair() {
        for c in CATEGORIES.iter().filter(|c| c.kind == ConversionKind::Linear) {
            for a in c.units {
                for b in c.units {
                    for x in [1.0, 123.456, -42.5, 1e-3] {
                        let back = convert(convert(x, a, b, c), b, a, c);
                        assert_relative_eq!(back, x, max_relative = 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn test_each_linear_category_has_one_base_unit() {
        for c in CATEGORIES.iter().filter(|c| c.kind == ConversionKind::Linear) {
            let bases = c.units.iter().filter(|u| u.factor == 1.0).count();
            assert_eq!(bases, 1, "category {} has {} base units", c.id, bases);
            assert!(c.base_unit().is_some());
        }
        assert_eq!(category("temperature").unwrap().base_unit().map(|u| u.id), Some("C"));
    }

    #[test]
    fn test_unit_ids_are_globally_unique() {
        let mut seen = std::collections::HashSet::new();
        for c in CATEGORIES {
            for u in c.units {
                assert!(seen.insert(u.id), "duplicate unit id {}", u.id);
            }
        }
    }

    #[test]
    fn test_temperature_fixed_points() {
        let (temp, c) = unit("temperature", "C");
        let (_, f) = unit("temperature", "F");
        let (_, k) = unit("temperature", "K");
        assert_relative_eq!(convert(0.0, c, f, temp), 32.0, epsilon = 1e-9);
        assert_relative_eq!(convert(100.0, c, f, temp), 212.0, epsilon = 1e-9);
        assert_relative_eq!(convert(0.0, c, k, temp), 273.15, epsilon = 1e-9);
        assert_relative_eq!(convert(212.0, f, c, temp), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_temperature_identity() {
        let (temp, c) = unit("temperature", "C");
        for x in [-459.67, -40.0, 0.0, 36.6, 1e6] {
            assert_eq!(convert(x, c, c, temp), x);
        }
    }

    #[test]
    fn test_rankine_and_reaumur() {
        let (temp, c) = unit("temperature", "C");
        let (_, r) = unit("temperature", "R");
        let (_, re) = unit("temperature", "Re");
        let (_, f) = unit("temperature", "F");
        assert_relative_eq!(convert(491.67, r, c, temp), 0.0, epsilon = 1e-9);
        assert_relative_eq!(convert(80.0, re, c, temp), 100.0, epsilon = 1e-9);
        assert_relative_eq!(convert(-40.0, c, f, temp), -40.0, epsilon = 1e-9);
        assert_relative_eq!(convert(100.0, c, re, temp), 80.0, epsilon = 1e-9);
        assert_relative_eq!(convert(0.0, c, r, temp), 491.67, epsilon = 1e-9);
    }

    #[test]
    fn test_temperature_follows_unit_table() {
        let (temp, c) = unit("temperature", "C");
        for u in temp.units {
            let offset = u.offset.unwrap_or(0.0);
            // 10 degrees above each unit's zero point, expressed in Celsius
            assert_relative_eq!(convert(offset + 10.0, u, c, temp), 10.0 * u.factor, epsilon = 1e-9);
            for x in [-40.0, 0.0, 37.0, 1000.0] {
                let there = convert(x, c, u, temp);
                assert_relative_eq!(convert(there, u, c, temp), x, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_below_absolute_zero_is_not_rejected() {
        let (temp, k) = unit("temperature", "K");
        let (_, c) = unit("temperature", "C");
        assert_relative_eq!(convert(-10.0, k, c, temp), -283.15, epsilon = 1e-9);
    }

    #[test]
    fn test_foreign_unit_returns_zero() {
        let (length, m) = unit("length", "m");
        let (_, kg) = unit("weight", "kg");
        assert_eq!(convert(5.0, m, kg, length), 0.0);
        assert!(matches!(
            try_convert(5.0, m, kg, length),
            Err(AppError::UnitNotFound { ref unit, .. }) if unit == "kg"
        ));
    }

    #[test]
    fn test_convert_by_key_infers_category() {
        let response = convert_by_key(1.0, "mi", "km", None).unwrap();
        assert_eq!(response.category, "length");
        assert_relative_eq!(response.result, 1.609344, max_relative = 1e-12);
        assert_eq!(response.formatted_result, "1.609344");
    }

    #[test]
    fn test_convert_by_key_accepts_symbols() {
        let response = convert_by_key(100.0, "°C", "°F", Some("temperature")).unwrap();
        assert_relative_eq!(response.result, 212.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unknown_category() {
        assert!(matches!(category("luminosity"), Err(AppError::CategoryNotFound(_))));
    }

    #[test]
    fn test_format_result_fixed() {
        assert_eq!(format_result(0.3048), "0.3048");
        assert_eq!(format_result(2.2046226218487757), "2.2046226");
        assert_eq!(format_result(3.280839895013123), "3.2808399");
        assert_eq!(format_result(212.0), "212");
        assert_eq!(format_result(-40.0), "-40");
        assert_eq!(format_result(9.999999999), "10");
    }

    #[test]
    fn test_format_result_exponential() {
        assert_eq!(format_result(1234567.0), "1.23457e+6");
        assert_eq!(format_result(1e6), "1.00000e+6");
        assert_eq!(format_result(0.00000012345), "1.23450e-7");
        assert_eq!(format_result(-2.5e9), "-2.50000e+9");
    }

    #[test]
    fn test_format_result_special_values() {
        assert_eq!(format_result(0.0), "0");
        assert_eq!(format_result(f64::NAN), "NaN");
        assert_eq!(format_result(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_tool_lenient_mode_returns_zero() {
        let mut settings = AppSettings::default();
        settings.preferences.strict_units = false;
        let request = ToolRequest::ConvertUnit(ConvertUnitsRequest {
            amount: 3.0,
            from_unit: "m".into(),
            to_unit: "parsec".into(),
            category: Some("length".into()),
        });

        let response = UnitConverterTool.execute(&request, &settings).unwrap();
        assert_eq!(response.data["result"], 0.0);

        settings.preferences.strict_units = true;
        assert!(UnitConverterTool.execute(&request, &settings).is_err());
    }

    #[test]
    fn test_tool_converts_text() {
        let request = ToolRequest::ConvertText(crate::shared::types::ConvertTextRequest {
            text: "5 km".into(),
            target_unit: "m".into(),
        });
        let response = UnitConverterTool.execute(&request, &AppSettings::default()).unwrap();
        assert_eq!(response.summary, "5000 m");
    }

    #[test]
    fn test_all_units_lists_every_category() {
        let units = all_units();
        assert!(units.iter().any(|u| u.id == "psi" && u.category == "pressure"));
        assert!(units.iter().any(|u| u.id == "Re" && u.category == "temperature"));
        assert_eq!(units.len(), CATEGORIES.iter().map(|c| c.units.len()).sum::<usize>());
    }
}
