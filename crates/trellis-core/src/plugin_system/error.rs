//! # Trellis Core Plugin System Errors
//!
//! Defines error types specific to the Trellis Plugin System.
//!
//! [`PluginSystemError`] covers the failures that are surfaced synchronously
//! to the caller of `start()` or `use_plugin()`: a dependency that is not
//! available, a dependency cycle, and an `install` hook that failed. Failures
//! after installation are isolated instead and reported as
//! [`CapturedError`](crate::plugin_system::hooks::CapturedError).
use crate::plugin_system::traits::BoxError;

/// Error code for unsatisfiable `dependencies` entries
pub const PLUGIN_DEPENDENCY: &str = "PLUGIN_DEPENDENCY";
/// Error code for cycles and failed installs
pub const PLUGIN_ERROR: &str = "PLUGIN_ERROR";

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("plugin \"{plugin_id}\" depends on \"{dependency}\" which is not available")]
    MissingDependency {
        plugin_id: String,
        dependency: String,
    },

    #[error("circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency {
        /// Plugin names along the cycle; the first name is repeated at the end
        cycle: Vec<String>,
    },

    #[error("Failed to install plugin \"{plugin_id}\": {source}")]
    InstallFailed {
        plugin_id: String,
        #[source]
        source: BoxError,
    },
}

impl PluginSystemError {
    /// Stable error code for programmatic matching
    pub fn code(&self) -> &'static str {
        match self {
            PluginSystemError::MissingDependency { .. } => PLUGIN_DEPENDENCY,
            PluginSystemError::CircularDependency { .. }
            | PluginSystemError::InstallFailed { .. } => PLUGIN_ERROR,
        }
    }

    /// The plugin the error is attributed to
    pub fn plugin_id(&self) -> Option<&str> {
        match self {
            PluginSystemError::MissingDependency { plugin_id, .. }
            | PluginSystemError::InstallFailed { plugin_id, .. } => Some(plugin_id),
            PluginSystemError::CircularDependency { cycle } => cycle.first().map(String::as_str),
        }
    }
}
