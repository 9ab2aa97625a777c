// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of rotation plugins keyed by provider type.
//!
//! Built explicitly at startup and handed to the [`crate::Rotator`]; there is
//! no process-global table.

use std::collections::HashMap;
use std::sync::Arc;

use credvault_core::{RotatedField, RotationPlugin, VaultError};
use tracing::warn;

/// Name → plugin table.
#[derive(Default)]
pub struct RotationRegistry {
    plugins: HashMap<String, Arc<dyn RotationPlugin>>,
}

impl std::fmt::Debug for RotationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

/// Summary of a registered plugin for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: String,
    pub rotatable_fields: Vec<RotatedField>,
    pub required_config: Vec<&'static str>,
}

impl RotationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under its own name. A later registration with the
    /// same name replaces the earlier one.
    pub fn register(&mut self, plugin: impl RotationPlugin) {
        self.register_shared(Arc::new(plugin));
    }

    pub fn register_shared(&mut self, plugin: Arc<dyn RotationPlugin>) {
        let name = plugin.name().to_string();
        if self.plugins.insert(name.clone(), plugin).is_some() {
            warn!(plugin = %name, "rotation plugin registration replaced");
        }
    }

    /// Resolve a credential's provider type to its plugin.
    pub fn get(&self, provider_type: &str) -> Result<Arc<dyn RotationPlugin>, VaultError> {
        self.plugins
            .get(provider_type)
            .cloned()
            .ok_or_else(|| VaultError::PluginNotFound {
                provider_type: provider_type.to_string(),
            })
    }

    pub fn contains(&self, provider_type: &str) -> bool {
        self.plugins.contains_key(provider_type)
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.keys().cloned().collect();
        names.sort();
        names
    }

    /// Plugin summaries, sorted by name.
    pub fn list(&self) -> Vec<PluginInfo> {
        let mut infos: Vec<PluginInfo> = self
            .plugins
            .values()
            .map(|plugin| PluginInfo {
                name: plugin.name().to_string(),
                rotatable_fields: plugin.rotatable_fields().to_vec(),
                required_config: plugin.config_schema().required().map(|f| f.name).collect(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
