//! # Trellis Core Configuration
//!
//! Construction-time settings for the kernel: the render tick rate, the size
//! to fall back on when the terminal cannot be queried, and theme overrides.
//!
//! Configurations can be built in code or loaded from a file. JSON is always
//! available; YAML and TOML sit behind the `yaml-config` and `toml-config`
//! features, both on by default.
pub mod error;
pub mod theme;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kernel::constants::{DEFAULT_FPS, DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_FPS};

pub use error::ConfigError;
pub use theme::Theme;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// Kernel settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Render ticks per second
    pub fps: u32,
    /// Size used when the terminal size query fails
    pub default_size: (u16, u16),
    /// Overrides shallow-merged over the built-in theme
    pub theme: Map<String, Value>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            default_size: (DEFAULT_WIDTH, DEFAULT_HEIGHT),
            theme: Map::new(),
        }
    }
}

impl KernelConfig {
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_default_size(mut self, width: u16, height: u16) -> Self {
        self.default_size = (width, height);
        self
    }

    pub fn with_theme_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.theme.insert(key.into(), value);
        self
    }

    /// Period of the render tick, `floor(1000 / fps)` milliseconds.
    /// fps is clamped to `1..=MAX_FPS`, so the period is never zero.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.fps.clamp(1, MAX_FPS)))
    }

    /// The theme this configuration resolves to
    pub fn resolved_theme(&self) -> Theme {
        Theme::merged(&self.theme)
    }

    /// Parse a configuration from a string in the given format
    pub fn from_str_with_format(
        contents: &str,
        format: ConfigFormat,
    ) -> Result<Self, ConfigError> {
        let deser_err =
            |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::Deserialization {
                format: format.name().to_string(),
                source,
            };
        match format {
            ConfigFormat::Json => {
                serde_json::from_str(contents).map_err(|e| deser_err(Box::new(e)))
            }
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => {
                serde_yaml::from_str(contents).map_err(|e| deser_err(Box::new(e)))
            }
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(contents).map_err(|e| deser_err(Box::new(e))),
        }
    }

    /// Load a configuration file, choosing the format by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_str_with_format(&contents, format)?;
        log::debug!("Loaded kernel configuration from {}", path.display());
        Ok(config)
    }
}
