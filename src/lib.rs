//! Calculator and converter tools behind a searchable catalog
//!
//! Requests are plain serde types (`shared::types::ToolRequest`) routed by
//! `core::execute_tool_request`; every DTO also exports a TypeScript binding.

pub mod config;
pub mod core;
pub mod shared;

pub use crate::core::features::investment::{calculate_compound_interest, calculate_sip};
pub use crate::core::features::loan::{calculate_emi, calculate_emi_with, ScheduleOptions};
pub use crate::core::features::unit_converter::{
    all_categories, category, convert, format_result, parse_quantity, try_convert, Unit, UnitCategory,
};
pub use crate::core::{execute_tool_request, CalculationHistory};
pub use crate::shared::{AppError, AppResult};
pub use crate::shared::settings::AppSettings;
pub use crate::shared::types::{ToolRequest, ToolResponse};
