//! Viewer settings with persistence.

use serde::{Deserialize, Serialize};

use crate::value::{DEFAULT_DATE_FORMAT, DateZone, is_valid_date_format};

/// Viewer settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ViewerSettings {
    #[serde(default)]
    pub rendering: RenderSettings,
}

/// How values are turned into labels
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderSettings {
    /// strftime pattern for date-time values; must not need a time of day
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Zone in which the calendar day of a date-time is taken
    #[serde(default)]
    pub time_zone: DateZone,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self { date_format: default_date_format(), time_zone: DateZone::default() }
    }
}

impl RenderSettings {
    /// Set the date format, rejecting patterns that cannot format a plain date.
    pub fn set_date_format(&mut self, pattern: &str) -> Result<(), String> {
        if pattern.trim().is_empty() || !is_valid_date_format(pattern) {
            return Err(format!("Unsupported date format: {pattern:?}"));
        }
        self.date_format = pattern.to_string();
        Ok(())
    }
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}
