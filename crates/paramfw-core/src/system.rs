//! System class: composition root for subsystem plugins.
//!
//! Owns the opened plugin modules, the builder registry and the subsystem
//! children built from it. Native code must outlive everything that executes
//! it, so teardown always runs in this order:
//!
//! 1. subsystem children are dropped,
//! 2. registry entries are dropped (builders may live in plugin code),
//! 3. modules are closed.
//!
//! [`SystemClass::release_subsystems`] and [`SystemClass::release_modules`]
//! expose the two phases; `Drop` runs them in order.

use std::fmt;
use std::sync::Arc;

use crate::config::{plugin_worklist, PluginLocation, SystemConfig};
use crate::error::{ErrorLog, InfoLog, LoadError, Result};
use crate::library::{ModuleLoader, NativeModuleLoader, PluginModule};
use crate::loader::PluginLoader;
use crate::log::{LogSink, Logger, TracingSink};
use crate::naming::PluginNaming;
use crate::registry::BuilderRegistry;
use crate::resync;
use crate::subsystem::{
    Subsystem, SubsystemContext, SubsystemDescriptor, SyncerSet, VirtualSubsystemBuilder,
    VIRTUAL_SUBSYSTEM_TYPE,
};

/// Outcome of [`SystemClass::load_subsystems`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    success: bool,
    plugins_loaded: bool,
    errors: ErrorLog,
}

impl LoadReport {
    /// True if every plugin loaded, or the virtual fallback is in force.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// True if the plugin worklist was fully drained.
    pub fn plugins_fully_loaded(&self) -> bool {
        self.plugins_loaded
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    /// Accumulated errors joined into one string, whatever the outcome.
    pub fn error_report(&self) -> String {
        self.errors.report()
    }
}

/// Composition root owning plugin modules, builders and subsystems.
pub struct SystemClass {
    // Field order is drop order.
    subsystems: Vec<Box<dyn Subsystem>>,
    registry: BuilderRegistry,
    modules: Vec<Box<dyn PluginModule>>,
    loader: Box<dyn ModuleLoader>,
    naming: PluginNaming,
    sink: Arc<dyn LogSink>,
}

impl SystemClass {
    /// Name of this element in the configurable tree.
    pub const KIND: &'static str = "SystemClass";

    /// System class loading plugins with the platform's dynamic loader.
    pub fn new() -> Self {
        Self::with_loader(Box::new(NativeModuleLoader::default()))
    }

    pub fn with_loader(loader: Box<dyn ModuleLoader>) -> Self {
        Self {
            subsystems: Vec::new(),
            registry: BuilderRegistry::new(),
            modules: Vec::new(),
            loader,
            naming: PluginNaming::default(),
            sink: Arc::new(TracingSink),
        }
    }

    /// System class set up from `config`'s library and plugin naming.
    pub fn from_config(config: &SystemConfig) -> Self {
        Self::with_loader(Box::new(NativeModuleLoader::new(config.library_naming())))
            .with_naming(config.plugin_naming())
    }

    pub fn with_naming(mut self, naming: PluginNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn kind(&self) -> &'static str {
        Self::KIND
    }

    /// Children are created from configuration rather than fixed.
    pub fn children_are_dynamic(&self) -> bool {
        true
    }

    pub fn registry(&self) -> &BuilderRegistry {
        &self.registry
    }

    pub fn naming(&self) -> &PluginNaming {
        &self.naming
    }

    /// Populate the builder registry from the virtual builder and plugins.
    ///
    /// The registry is rebuilt from empty. Opened modules are kept even if
    /// their factory was missing. Errors are accumulated in the report.
    pub fn load_subsystems(
        &mut self,
        locations: &[PluginLocation],
        virtual_fallback: bool,
    ) -> LoadReport {
        self.registry.clear();

        self.registry
            .register_builder(VIRTUAL_SUBSYSTEM_TYPE, Box::new(VirtualSubsystemBuilder));
        if virtual_fallback {
            self.registry
                .set_fallback_builder(Box::new(VirtualSubsystemBuilder));
        }

        let mut worklist = plugin_worklist(locations);
        let mut errors = ErrorLog::new();
        let logger = Logger::new(self.sink.as_ref());

        tracing::info!(plugins = worklist.len(), virtual_fallback, "Loading subsystem plugins");

        let plugins_loaded = PluginLoader::new(
            self.loader.as_ref(),
            &self.naming,
            &mut self.registry,
            &mut self.modules,
            &logger,
        )
        .load_all(&mut worklist, &mut errors)
        .is_ok();

        let success = plugins_loaded || virtual_fallback;
        if !success {
            tracing::warn!(errors = errors.len(), "Subsystem plugins failed to load");
        }

        LoadReport {
            success,
            plugins_loaded,
            errors,
        }
    }

    /// Build one subsystem through the registry and adopt it as a child.
    pub fn add_subsystem(&mut self, descriptor: &SubsystemDescriptor) -> Result<()> {
        let logger = Logger::new(self.sink.as_ref());
        let parent_path = format!("/{}", Self::KIND);
        let context = SubsystemContext::new(descriptor, &parent_path, &logger);

        let subsystem = self.registry.build(&descriptor.type_name, &context)?;
        tracing::debug!(
            name = %descriptor.name,
            subsystem_type = %descriptor.type_name,
            built_as = %subsystem.type_name(),
            "Subsystem built"
        );
        self.subsystems.push(subsystem);
        Ok(())
    }

    /// Build every declared subsystem, stopping at the first unknown type.
    pub fn populate(&mut self, descriptors: &[SubsystemDescriptor]) -> Result<()> {
        for descriptor in descriptors {
            self.add_subsystem(descriptor)?;
        }
        Ok(())
    }

    pub fn subsystems(&self) -> &[Box<dyn Subsystem>] {
        &self.subsystems
    }

    pub fn subsystem(&self, name: &str) -> Option<&dyn Subsystem> {
        self.subsystems
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }

    pub fn subsystem_mut(&mut self, name: &str) -> Option<&mut (dyn Subsystem + 'static)> {
        self.subsystems
            .iter_mut()
            .find(|s| s.name() == name)
            .map(|s| s.as_mut())
    }

    pub fn subsystem_count(&self) -> usize {
        self.subsystems.len()
    }

    pub fn modules(&self) -> &[Box<dyn PluginModule>] {
        &self.modules
    }

    pub fn module_paths(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.path()).collect()
    }

    /// Collect syncers of subsystems needing a resync; see [`resync::collect_needing_resync`].
    pub fn check_for_subsystems_to_resync(
        &mut self,
        syncer_set: &mut SyncerSet,
        infos: &mut InfoLog,
    ) -> usize {
        resync::collect_needing_resync(&mut self.subsystems, syncer_set, infos)
    }

    /// Consume every pending resync flag.
    pub fn clean_subsystems_need_to_resync(&mut self) {
        resync::clear_all_resync_flags(&mut self.subsystems);
    }

    /// First teardown phase: drop every subsystem child.
    pub fn release_subsystems(&mut self) -> usize {
        let count = self.subsystems.len();
        // Drop in reverse creation order.
        while let Some(subsystem) = self.subsystems.pop() {
            drop(subsystem);
        }
        count
    }

    /// Second teardown phase: drop registry entries, then close every module.
    ///
    /// Refused while subsystem children are alive.
    pub fn release_modules(&mut self) -> Result<usize> {
        if !self.subsystems.is_empty() {
            return Err(LoadError::SubsystemsAlive(self.subsystems.len()));
        }

        self.registry.clear();

        let count = self.modules.len();
        self.modules.clear();
        if count > 0 {
            tracing::debug!(modules = count, "Subsystem plugin modules closed");
        }
        Ok(count)
    }
}

impl Default for SystemClass {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SystemClass {
    fn drop(&mut self) {
        self.release_subsystems();
        // Cannot fail once children are gone.
        let _ = self.release_modules();
    }
}

impl fmt::Debug for SystemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemClass")
            .field("subsystems", &self.subsystems.len())
            .field("registry", &self.registry)
            .field("modules", &self.module_paths())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoModules;

    impl ModuleLoader for NoModules {
        fn open(&self, path: &str) -> Result<Box<dyn PluginModule>> {
            Err(LoadError::OpenFailure {
                path: path.to_string(),
                reason: format!("{}: cannot open shared object file", path),
            })
        }
    }

    fn system() -> SystemClass {
        SystemClass::with_loader(Box::new(NoModules))
    }

    #[test]
    fn test_kind() {
        let system = system();
        assert_eq!(system.kind(), "SystemClass");
        assert!(system.children_are_dynamic());
    }

    #[test]
    fn test_virtual_always_registered() {
        let mut system = system();
        let report = system.load_subsystems(&[], false);

        assert!(report.is_success());
        assert!(report.plugins_fully_loaded());
        assert_eq!(report.error_report(), "");
        assert!(system.registry().contains(VIRTUAL_SUBSYSTEM_TYPE));
        assert!(!system.registry().has_fallback());
    }

    #[test]
    fn test_fallback_overrides_failed_plugins() {
        let mut system = system();
        let locations = [PluginLocation::new("p", vec!["libX-subsystem.so".to_string()])];

        let report = system.load_subsystems(&locations, true);
        assert!(report.is_success());
        assert!(!report.plugins_fully_loaded());
        assert!(report.error_report().contains("p/libX-subsystem.so"));

        system
            .add_subsystem(&SubsystemDescriptor::new("x", "X"))
            .unwrap();
        assert_eq!(system.subsystems()[0].type_name(), VIRTUAL_SUBSYSTEM_TYPE);
    }

    #[test]
    fn test_unknown_type_surfaces_to_caller() {
        let mut system = system();
        system.load_subsystems(&[], false);

        let result = system.populate(&[
            SubsystemDescriptor::new("v", VIRTUAL_SUBSYSTEM_TYPE),
            SubsystemDescriptor::new("x", "X"),
        ]);
        assert_eq!(result, Err(LoadError::UnknownType("X".to_string())));
        assert_eq!(system.subsystem_count(), 1);
        assert!(system.subsystem("v").is_some());
    }

    #[test]
    fn test_release_modules_refused_with_live_subsystems() {
        let mut system = system();
        system.load_subsystems(&[], false);
        system
            .add_subsystem(&SubsystemDescriptor::new("v", VIRTUAL_SUBSYSTEM_TYPE))
            .unwrap();

        assert_eq!(system.release_modules(), Err(LoadError::SubsystemsAlive(1)));
        assert_eq!(system.release_subsystems(), 1);
        assert_eq!(system.release_modules(), Ok(0));
        assert!(system.registry().is_empty());
    }

    #[test]
    fn test_reload_rebuilds_registry() {
        let mut system = system();
        system.load_subsystems(&[], true);
        assert!(system.registry().has_fallback());

        system.load_subsystems(&[], false);
        assert!(!system.registry().has_fallback());
        assert_eq!(system.registry().type_names(), vec![VIRTUAL_SUBSYSTEM_TYPE]);
    }
}
