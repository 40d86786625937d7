//! System class configuration.
//!
//! Loaded from a TOML file, with a few environment overrides:
//!
//! ```toml
//! virtual_fallback = true
//!
//! [[plugin_locations]]
//! folder = "/usr/lib/paramfw"
//! plugins = ["libAudio-subsystem.so", "libTuner-subsystem.so"]
//!
//! [[subsystems]]
//! name = "audio"
//! type = "AUDIO"
//! attributes = { card = "0" }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::library::LibraryNaming;
use crate::naming::PluginNaming;
use crate::subsystem::SubsystemDescriptor;

/// A folder and the plugin files to load from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginLocation {
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub plugins: Vec<String>,
}

impl PluginLocation {
    pub fn new(folder: impl Into<String>, plugins: Vec<String>) -> Self {
        Self {
            folder: folder.into(),
            plugins,
        }
    }

    /// Candidate file paths. An empty folder, or one already ending in `/`,
    /// contributes no separator.
    pub fn plugin_files(&self) -> impl Iterator<Item = String> + '_ {
        self.plugins.iter().map(move |plugin| {
            if self.folder.is_empty() || self.folder.ends_with('/') {
                format!("{}{}", self.folder, plugin)
            } else {
                format!("{}/{}", self.folder, plugin)
            }
        })
    }
}

/// Flatten plugin locations into one worklist, in declaration order.
pub fn plugin_worklist(locations: &[PluginLocation]) -> Vec<String> {
    locations
        .iter()
        .flat_map(|location| location.plugin_files())
        .collect()
}

/// Configuration of one system class instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Build unknown subsystem types as virtual, and accept partial plugin loads.
    #[serde(default)]
    pub virtual_fallback: bool,

    /// Override of the platform library naming.
    #[serde(default)]
    pub library: Option<LibraryNaming>,

    /// Override of the plugin naming convention.
    #[serde(default)]
    pub naming: Option<PluginNaming>,

    #[serde(default)]
    pub plugin_locations: Vec<PluginLocation>,

    #[serde(default)]
    pub subsystems: Vec<SubsystemDescriptor>,
}

impl SystemConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(category = "config", "Loading config from: {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Check subsystem declarations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();

        for subsystem in &self.subsystems {
            if subsystem.name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "subsystem of type '{}' has no name",
                    subsystem.type_name
                )));
            }
            if subsystem.type_name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "subsystem '{}' has no type",
                    subsystem.name
                )));
            }
            if !names.insert(subsystem.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate subsystem name '{}'",
                    subsystem.name
                )));
            }
        }

        Ok(())
    }

    /// Apply `PARAMFW_*` environment overrides.
    pub fn apply_env(mut self) -> Self {
        if let Some(fallback) = env_vars::virtual_fallback() {
            self.virtual_fallback = fallback;
        }
        if let Some(location) = env_vars::plugin_location() {
            self.plugin_locations.push(location);
        }
        self
    }

    pub fn library_naming(&self) -> LibraryNaming {
        self.library.clone().unwrap_or_default()
    }

    pub fn plugin_naming(&self) -> PluginNaming {
        self.naming.clone().unwrap_or_default()
    }

    pub fn plugin_worklist(&self) -> Vec<String> {
        plugin_worklist(&self.plugin_locations)
    }
}

/// Environment variable names and readers.
pub mod env_vars {
    use super::PluginLocation;

    pub const VIRTUAL_FALLBACK: &str = "PARAMFW_VIRTUAL_FALLBACK";
    pub const PLUGIN_PATH: &str = "PARAMFW_PLUGIN_PATH";
    /// Comma separated plugin file names, loaded from `PARAMFW_PLUGIN_PATH`.
    pub const PLUGINS: &str = "PARAMFW_PLUGINS";

    pub fn virtual_fallback() -> Option<bool> {
        std::env::var(VIRTUAL_FALLBACK)
            .ok()
            .and_then(|s| parse_bool(&s))
    }

    /// Extra plugin location from the environment, if any plugins are named.
    pub fn plugin_location() -> Option<PluginLocation> {
        let plugins = std::env::var(PLUGINS).ok()?;
        let folder = std::env::var(PLUGIN_PATH).unwrap_or_default();
        location_from(&folder, &plugins)
    }

    pub(crate) fn location_from(folder: &str, plugins: &str) -> Option<PluginLocation> {
        let plugins: Vec<String> = plugins
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        if plugins.is_empty() {
            None
        } else {
            // A bare "/" stays the root folder rather than becoming relative.
            let trimmed = folder.trim_end_matches('/');
            let folder = if trimmed.is_empty() && !folder.is_empty() {
                "/"
            } else {
                trimmed
            };
            Some(PluginLocation::new(folder, plugins))
        }
    }

    pub(crate) fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}
