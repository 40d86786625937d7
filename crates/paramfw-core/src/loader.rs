//! Plugin loading with retry passes.
//!
//! Plugins may depend on one another, so loading is iterative: every pass walks
//! the remaining worklist once, and passes repeat until the worklist is empty
//! or a pass loads nothing.

use crate::error::{ErrorLog, LoadError, Result};
use crate::library::{invoke_builder_entry, ModuleLoader, PluginModule};
use crate::log::Logger;
use crate::naming::PluginNaming;
use crate::registry::BuilderRegistry;

/// Drives plugin factories into a [`BuilderRegistry`].
///
/// Every module opened is appended to `modules` and stays there, whether or
/// not its factory could be found.
pub(crate) struct PluginLoader<'a> {
    loader: &'a dyn ModuleLoader,
    naming: &'a PluginNaming,
    registry: &'a mut BuilderRegistry,
    modules: &'a mut Vec<Box<dyn PluginModule>>,
    logger: &'a Logger<'a>,
}

impl<'a> PluginLoader<'a> {
    pub fn new(
        loader: &'a dyn ModuleLoader,
        naming: &'a PluginNaming,
        registry: &'a mut BuilderRegistry,
        modules: &'a mut Vec<Box<dyn PluginModule>>,
        logger: &'a Logger<'a>,
    ) -> Self {
        Self {
            loader,
            naming,
            registry,
            modules,
            logger,
        }
    }

    /// Walk the worklist once, removing every plugin whose factory ran.
    ///
    /// Returns true if at least one plugin was removed.
    pub fn attempt_pass(&mut self, worklist: &mut Vec<String>, errors: &mut ErrorLog) -> bool {
        let mut progressed = false;

        worklist.retain(|plugin_path| {
            let module = match self.loader.open(plugin_path) {
                Ok(module) => module,
                Err(e) => {
                    tracing::debug!(plugin = %plugin_path, error = %e, "Plugin open failed");
                    errors.push(e.to_string());
                    return true;
                }
            };

            let symbol = self.naming.symbol_name(plugin_path);
            let entry = module.builder_entry(&symbol);

            // Opened modules are never closed speculatively.
            self.modules.push(module);

            let Some(entry) = entry else {
                let e = LoadError::SymbolNotFound {
                    plugin: plugin_path.clone(),
                    symbol,
                };
                tracing::debug!(plugin = %plugin_path, "Plugin factory symbol missing");
                errors.push(e.to_string());
                return true;
            };

            invoke_builder_entry(entry, self.registry, self.logger);
            tracing::info!(plugin = %plugin_path, symbol = %symbol, "Subsystem plugin loaded");
            progressed = true;
            false
        });

        progressed
    }

    /// Run passes until the worklist drains or a pass makes no progress.
    ///
    /// On failure the residual plugins are reported in `errors` and returned
    /// in the error.
    pub fn load_all(&mut self, worklist: &mut Vec<String>, errors: &mut ErrorLog) -> Result<()> {
        let mut passes = 0usize;

        while !worklist.is_empty() {
            passes += 1;
            if !self.attempt_pass(worklist, errors) {
                break;
            }
        }

        if worklist.is_empty() {
            tracing::debug!(passes, "All subsystem plugins loaded");
            return Ok(());
        }

        let e = LoadError::NoProgress {
            remaining: worklist.clone(),
        };
        tracing::warn!(passes, remaining = worklist.len(), "Subsystem plugins left unloaded");
        errors.push(e.to_string());
        Err(e)
    }
}
