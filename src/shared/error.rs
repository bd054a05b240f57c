//! Error handling for every tool operation
//!
//! All variants are serializable so they can cross the IPC boundary to the
//! web front end unchanged.

use thiserror::Error;
use serde::Serialize;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    /// Input rejected before any arithmetic ran
    #[error("Validation Error: {0}")]
    Validation(String),

    /// Unit id/symbol is not part of the requested category
    #[error("Unit not found: '{unit}' in category '{category}'")]
    UnitNotFound { unit: String, category: String },

    #[error("Unknown unit category: {0}")]
    CategoryNotFound(String),

    #[error("Currency not supported: {0}")]
    UnsupportedCurrency(String),

    #[error("Calculation Error: {0}")]
    Calculation(String),

    #[error("Parse Error: {0}")]
    Parse(String),

    /// The tool does not handle this request kind; dispatch moves on
    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("Storage Error: {0}")]
    Storage(String),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("I/O Error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(format!("Serialization error: {}", err))
    }
}

impl AppError {
    /// Shorthand for storage failures from the embedded database
    pub fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        AppError::Storage(format!("{}: {}", context, err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_not_found_message() {
        let err = AppError::UnitNotFound {
            unit: "parsec".to_string(),
            category: "length".to_string(),
        };
        assert_eq!(err.to_string(), "Unit not found: 'parsec' in category 'length'");
    }

    #[test]
    fn test_serialized_shape_is_tagged() {
        let json = serde_json::to_value(AppError::Validation("bad".into())).unwrap();
        assert_eq!(json["type"], "Validation");
        assert_eq!(json["message"], "bad");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(AppError::from(io), AppError::Io(msg) if msg.contains("missing")));
    }
}
