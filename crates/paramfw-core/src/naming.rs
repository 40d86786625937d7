//! Plugin file and factory symbol naming.
//!
//! A plugin file is named `lib<type>-subsystem.so` (or `lib<type>-subsystem_host.so`)
//! and exports `get<TYPE>SubsystemBuilder`.

use serde::{Deserialize, Serialize};

/// Literals of the plugin naming convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginNaming {
    pub file_prefix: String,
    pub file_suffix: String,
    pub symbol_prefix: String,
    pub symbol_suffix: String,
}

impl Default for PluginNaming {
    fn default() -> Self {
        Self {
            file_prefix: "lib".to_string(),
            file_suffix: "-subsystem".to_string(),
            symbol_prefix: "get".to_string(),
            symbol_suffix: "SubsystemBuilder".to_string(),
        }
    }
}

impl PluginNaming {
    /// Extract the upper-cased subsystem type from a plugin path.
    ///
    /// The directory part and `file_prefix.len()` bytes are skipped without
    /// checking them; the type runs up to the first `file_suffix` after that
    /// point, or to the end of the path when there is none.
    pub fn plugin_type(&self, plugin_path: &str) -> String {
        let file_start = plugin_path.rfind('/').map(|pos| pos + 1).unwrap_or(0);
        let type_start = file_start + self.file_prefix.len();

        let rest = plugin_path.get(type_start..).unwrap_or("");
        let plugin_type = match rest.find(self.file_suffix.as_str()) {
            Some(end) if !self.file_suffix.is_empty() => &rest[..end],
            _ => rest,
        };

        plugin_type.to_ascii_uppercase()
    }

    /// Factory symbol expected inside the plugin at `plugin_path`.
    pub fn symbol_name(&self, plugin_path: &str) -> String {
        format!(
            "{}{}{}",
            self.symbol_prefix,
            self.plugin_type(plugin_path),
            self.symbol_suffix
        )
    }

    /// File name a plugin providing `plugin_type` is expected to carry,
    /// without the platform library suffix.
    pub fn file_stem(&self, plugin_type: &str) -> String {
        format!("{}{}{}", self.file_prefix, plugin_type, self.file_suffix)
    }
}
