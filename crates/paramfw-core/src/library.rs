//! Shared module loading for subsystem plugins.
//!
//! This is the only place where native code is mapped, factory symbols are
//! resolved and factory entry points are called. Everything above it works on
//! [`ModuleLoader`] and [`PluginModule`] trait objects.

use std::fmt;

use libloading::Library;
use serde::{Deserialize, Serialize};

use crate::error::{LoadError, Result};
use crate::log::Logger;
use crate::registry::BuilderRegistry;

/// Factory entry point exported by a plugin as `get<TYPE>SubsystemBuilder`.
///
/// Plugins must be built against the same `paramfw-core` and toolchain as the
/// host, since Rust types cross this boundary.
pub type GetSubsystemBuilder = unsafe extern "C" fn(registry: *mut BuilderRegistry, logger: &Logger<'_>);

/// Platform library naming used to sanitize module paths.
///
/// Fields missing from a config fall back to the platform's values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryNaming {
    pub prefix: String,
    pub suffix: String,
}

impl LibraryNaming {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn posix() -> Self {
        Self::new("lib", ".so")
    }

    pub fn windows() -> Self {
        Self::new("", ".dll")
    }

    /// Naming of the platform this crate was built for.
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::windows()
        } else {
            Self::posix()
        }
    }

    /// Path handed to the OS loader for `path`.
    ///
    /// A path containing a `.` is wrapped between two copies of the prefix;
    /// anything else is passed through. The suffix is not applied.
    // TODO: confirm whether generic names (no `.`) should become prefix + name + suffix instead.
    pub fn sanitize(&self, path: &str) -> String {
        if path.contains('.') {
            format!("{}{}{}", self.prefix, path, self.prefix)
        } else {
            path.to_string()
        }
    }
}

impl Default for LibraryNaming {
    fn default() -> Self {
        Self::native()
    }
}

/// One opened shared module. Dropping it unmaps the module.
pub trait PluginModule: Send {
    /// Path the module was requested with.
    fn path(&self) -> &str;

    /// Resolve a factory entry point. Absence is not an error here.
    fn builder_entry(&self, symbol: &str) -> Option<GetSubsystemBuilder>;
}

/// Opens shared modules by path or generic name.
pub trait ModuleLoader: Send + Sync {
    fn open(&self, path: &str) -> Result<Box<dyn PluginModule>>;
}

/// [`ModuleLoader`] backed by the OS dynamic loader.
#[derive(Debug, Clone, Default)]
pub struct NativeModuleLoader {
    naming: LibraryNaming,
}

impl NativeModuleLoader {
    pub fn new(naming: LibraryNaming) -> Self {
        Self { naming }
    }

    pub fn naming(&self) -> &LibraryNaming {
        &self.naming
    }
}

impl ModuleLoader for NativeModuleLoader {
    fn open(&self, path: &str) -> Result<Box<dyn PluginModule>> {
        let sanitized = self.naming.sanitize(path);

        // SAFETY: running a module's initialisers is inherent to loading a
        // plugin; the configured plugin locations are trusted.
        let library = unsafe { Library::new(&sanitized) }.map_err(|e| LoadError::OpenFailure {
            path: path.to_string(),
            reason: open_failure_reason(&sanitized, &e),
        })?;

        tracing::debug!(plugin = %path, module = %sanitized, "Module opened");

        Ok(Box::new(NativeModule {
            path: path.to_string(),
            library,
        }))
    }
}

#[cfg(windows)]
fn open_failure_reason(sanitized: &str, _error: &libloading::Error) -> String {
    format!("{}: cannot open shared object file.", sanitized)
}

#[cfg(not(windows))]
fn open_failure_reason(_sanitized: &str, error: &libloading::Error) -> String {
    error.to_string()
}

struct NativeModule {
    path: String,
    library: Library,
}

impl PluginModule for NativeModule {
    fn path(&self) -> &str {
        &self.path
    }

    fn builder_entry(&self, symbol: &str) -> Option<GetSubsystemBuilder> {
        // SAFETY: the symbol is only ever called through `invoke_builder_entry`,
        // and the pointer is not used once this module is dropped: the owner
        // releases every subsystem and builder before closing modules.
        unsafe {
            self.library
                .get::<GetSubsystemBuilder>(symbol.as_bytes())
                .ok()
                .map(|entry| *entry)
        }
    }
}

impl Drop for NativeModule {
    fn drop(&mut self) {
        tracing::debug!(plugin = %self.path, "Module closed");
    }
}

impl fmt::Debug for NativeModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeModule").field("path", &self.path).finish()
    }
}

/// Run a plugin factory against `registry`.
pub(crate) fn invoke_builder_entry(
    entry: GetSubsystemBuilder,
    registry: &mut BuilderRegistry,
    logger: &Logger<'_>,
) {
    // SAFETY: `entry` was resolved from a module that is still open, and the
    // registry pointer is valid and exclusive for the duration of the call.
    unsafe { entry(registry as *mut BuilderRegistry, logger) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_wraps_dotted_path_in_prefix() {
        let posix = LibraryNaming::posix();
        assert_eq!(posix.sanitize("foo.so"), "libfoo.solib");
        assert_eq!(
            posix.sanitize("/opt/p/libFoo-subsystem.so"),
            "lib/opt/p/libFoo-subsystem.solib"
        );
    }

    #[test]
    fn test_sanitize_passes_generic_name_through() {
        assert_eq!(LibraryNaming::posix().sanitize("foo"), "foo");
        assert_eq!(LibraryNaming::windows().sanitize("foo"), "foo");
    }

    #[test]
    fn test_windows_prefix_is_empty() {
        let windows = LibraryNaming::windows();
        assert_eq!(windows.suffix, ".dll");
        assert_eq!(windows.sanitize("C:/plugins/foo-subsystem.dll"), "C:/plugins/foo-subsystem.dll");
    }

    #[test]
    fn test_native_naming_matches_platform() {
        let native = LibraryNaming::native();
        if cfg!(windows) {
            assert_eq!(native, LibraryNaming::windows());
        } else {
            assert_eq!(native, LibraryNaming::posix());
        }
    }

    #[test]
    fn test_open_missing_module_fails() {
        let loader = NativeModuleLoader::new(LibraryNaming::new("", ""));
        let result = loader.open("/nonexistent/libMissing-subsystem.so");

        match result {
            Err(LoadError::OpenFailure { path, reason }) => {
                assert_eq!(path, "/nonexistent/libMissing-subsystem.so");
                assert!(!reason.is_empty());
            }
            Err(other) => panic!("expected OpenFailure, got {}", other),
            Ok(_) => panic!("expected OpenFailure, module opened"),
        }
    }
}
