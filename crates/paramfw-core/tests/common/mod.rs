//! Test doubles for the module loader.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use paramfw_core::library::{GetSubsystemBuilder, ModuleLoader, PluginModule};
use paramfw_core::{LoadError, LogSink, Result};

/// Description of one fake shared module.
#[derive(Clone, Default)]
pub struct FakeModuleSpec {
    pub symbols: HashMap<String, GetSubsystemBuilder>,
    /// Opening fails until this flag is raised.
    pub requires: Option<&'static AtomicBool>,
    /// Raised when the module is closed.
    pub closed: Option<&'static AtomicBool>,
}

impl FakeModuleSpec {
    pub fn exporting(symbol: &str, entry: GetSubsystemBuilder) -> Self {
        let mut spec = Self::default();
        spec.symbols.insert(symbol.to_string(), entry);
        spec
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn requiring(mut self, flag: &'static AtomicBool) -> Self {
        self.requires = Some(flag);
        self
    }

    pub fn closing(mut self, flag: &'static AtomicBool) -> Self {
        self.closed = Some(flag);
        self
    }
}

/// Module loader serving [`FakeModuleSpec`]s by path.
#[derive(Clone, Default)]
pub struct FakeLoader {
    modules: HashMap<String, FakeModuleSpec>,
    opens: Arc<AtomicUsize>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, path: &str, spec: FakeModuleSpec) -> Self {
        self.modules.insert(path.to_string(), spec);
        self
    }

    /// Counter of open attempts, shared with clones.
    pub fn open_counter(&self) -> Arc<AtomicUsize> {
        self.opens.clone()
    }
}

impl ModuleLoader for FakeLoader {
    fn open(&self, path: &str) -> Result<Box<dyn PluginModule>> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        let spec = self.modules.get(path).ok_or_else(|| LoadError::OpenFailure {
            path: path.to_string(),
            reason: format!("{}: cannot open shared object file: No such file or directory", path),
        })?;

        if let Some(flag) = spec.requires {
            if !flag.load(Ordering::SeqCst) {
                return Err(LoadError::OpenFailure {
                    path: path.to_string(),
                    reason: format!("{}: undefined symbol: dependency_not_loaded", path),
                });
            }
        }

        Ok(Box::new(FakeModule {
            path: path.to_string(),
            spec: spec.clone(),
        }))
    }
}

struct FakeModule {
    path: String,
    spec: FakeModuleSpec,
}

impl PluginModule for FakeModule {
    fn path(&self) -> &str {
        &self.path
    }

    fn builder_entry(&self, symbol: &str) -> Option<GetSubsystemBuilder> {
        self.spec.symbols.get(symbol).copied()
    }
}

impl Drop for FakeModule {
    fn drop(&mut self) {
        if let Some(flag) = self.spec.closed {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

/// Log sink recording every message.
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl LogSink for RecordingSink {
    fn info(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("warning: {}", message));
    }
}
