use serde::{Deserialize, Serialize};

use std::path::Path;

use crate::error::ConfigError;

/// Behavior knobs for [`RichTextEditor`](crate::facade::RichTextEditor) and the tooltip engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Whether highlight phrases are located case-sensitively in the document.
    pub case_sensitive: bool,
    /// Collapse the host's non-breaking-space encoding to plain spaces on extract.
    pub normalize_nbsp: bool,
    /// Tooltip geometry.
    pub tooltip: TooltipConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            normalize_nbsp: true,
            tooltip: TooltipConfig::default(),
        }
    }
}

/// Tooltip placement geometry, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TooltipConfig {
    /// Distance between the anchor edge and the overlay.
    pub gap: f64,
    /// Inset from every viewport edge the overlay must stay inside.
    pub margin: f64,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            gap: 8.0,
            margin: 8.0,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads the configuration from a file, picking the format by extension.
    ///
    /// Supports `.json` and `.toml`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&std::fs::read_to_string(path)?),
            Some("toml") => Self::from_toml_str(&std::fs::read_to_string(path)?),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_owned(),
            )),
        }
    }
}
