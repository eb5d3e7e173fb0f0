use std::fmt;
use std::sync::Arc;

use crate::plugin_system::dependency::{self, Resolution};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::traits::Plugin;

/// Registry for managing plugins.
///
/// Keeps every known plugin in registration order (the resolver's
/// tie-break) and, separately, the plugins installed during the current run
/// in install order.
#[derive(Default)]
pub struct PluginRegistry {
    /// Every plugin registered so far, keyed by position
    plugins: Vec<Arc<dyn Plugin>>,
    /// Plugins installed in the current run, in install order
    installed: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Create a new, empty plugin registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin. A plugin with the same name replaces the earlier
    /// one in place.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        match self.plugins.iter().position(|p| p.name() == plugin.name()) {
            Some(idx) => {
                log::debug!("Replacing previously registered plugin \"{}\"", plugin.name());
                self.plugins[idx] = plugin;
            }
            None => self.plugins.push(plugin),
        }
    }

    /// Check whether a plugin is registered
    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    /// Get a registered plugin by name
    pub fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.iter().find(|p| p.name() == name).cloned()
    }

    /// Every registered plugin, in registration order
    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    /// Registered plugins that are not currently installed
    pub fn pending(&self) -> Vec<Arc<dyn Plugin>> {
        self.plugins
            .iter()
            .filter(|p| !self.is_installed(p.name()))
            .cloned()
            .collect()
    }

    /// Installed plugins in install order
    pub fn installed(&self) -> &[Arc<dyn Plugin>] {
        &self.installed
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.installed.iter().any(|p| p.name() == name)
    }

    /// Record a successful install
    pub fn mark_installed(&mut self, plugin: Arc<dyn Plugin>) {
        self.installed.push(plugin);
    }

    /// Forget the install order, returning it. Registered plugins are kept
    /// so the next run resolves them again.
    pub fn clear_installed(&mut self) -> Vec<Arc<dyn Plugin>> {
        std::mem::take(&mut self.installed)
    }

    /// Resolve an install order over every registered plugin
    pub fn resolve(&self) -> Result<Resolution, PluginSystemError> {
        dependency::resolve(&self.plugins)
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn installed_count(&self) -> usize {
        self.installed.len()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |list: &[Arc<dyn Plugin>]| -> Vec<String> {
            list.iter().map(|p| p.name().to_string()).collect()
        };
        f.debug_struct("PluginRegistry")
            .field("plugins", &names(&self.plugins))
            .field("installed", &names(&self.installed))
            .finish()
    }
}
