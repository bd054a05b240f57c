//! Core tool logic: dispatch, catalog and history

pub mod catalog;
pub mod features;
pub mod history;

pub use catalog::{ToolCategory, ToolEntry, ToolKind, UsageMetrics};
pub use features::{execute_tool_request, AppTool, Tool};
pub use history::{CalculationHistory, HistoryEntry};
