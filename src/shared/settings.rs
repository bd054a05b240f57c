use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;

use crate::shared::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub preferences: UserPreferences,
    pub schedule: ScheduleSettings,
    pub history: HistorySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub default_currency_from: String,
    pub default_currency_to: String,
    /// Unknown units fail with an error instead of converting to 0
    pub strict_units: bool,
}

/// Amortization schedule shape for the EMI tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// `None` renders every month of the tenure
    pub row_cap: Option<usize>,
    pub zero_rate_schedule: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub max_items: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            preferences: UserPreferences::default(),
            schedule: ScheduleSettings::default(),
            history: HistorySettings::default(),
        }
    }
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            default_currency_from: "USD".to_string(),
            default_currency_to: "EUR".to_string(),
            strict_units: true,
        }
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            row_cap: Some(60),
            zero_rate_schedule: false,
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { max_items: 50 }
    }
}

impl AppSettings {
    pub fn get_settings_path() -> AppResult<PathBuf> {
        ProjectDirs::from("com", "antigravity", "tool-hub")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or_else(|| AppError::Config("Failed to determine config directory".to_string()))
    }

    /// Load from the platform config dir, writing defaults on first run
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::get_settings_path()?)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "settings file missing, writing defaults");
            let settings = Self::default();
            settings.save_to(path)?;
            return Ok(settings);
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse settings: {}", e)))
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&Self::get_settings_path()?)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
