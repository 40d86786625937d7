//! Subsystem plugin loading and lifecycle core for the parameter framework.
//!
//! Subsystems are pluggable backends giving parameter access to one hardware
//! or domain area. They are provided by shared modules named
//! `lib<type>-subsystem.so`, each exporting a `get<TYPE>SubsystemBuilder`
//! factory that registers builders into a [`BuilderRegistry`]. The
//! [`SystemClass`] loads the plugins, builds the declared subsystems and tracks
//! which of them need resynchronization.
//!
//! # Usage
//!
//! ```rust,ignore
//! use paramfw_core::prelude::*;
//!
//! let config = SystemConfig::from_file("paramfw.toml")?.apply_env();
//! let mut system = SystemClass::from_config(&config);
//!
//! let report = system.load_subsystems(&config.plugin_locations, config.virtual_fallback);
//! if !report.is_success() {
//!     eprintln!("{}", report.error_report());
//! }
//! system.populate(&config.subsystems)?;
//! ```

pub mod config;
pub mod error;
pub mod library;
mod loader;
pub mod log;
pub mod macros;
pub mod naming;
pub mod registry;
pub mod resync;
pub mod subsystem;
pub mod system;

pub use config::{PluginLocation, SystemConfig};
pub use error::{ConfigError, ErrorLog, InfoLog, LoadError, Result};
pub use library::{GetSubsystemBuilder, LibraryNaming, ModuleLoader, NativeModuleLoader, PluginModule};
pub use log::{LogSink, Logger, TracingSink};
pub use naming::PluginNaming;
pub use registry::{BuilderRegistry, SubsystemBuilder};
pub use subsystem::{
    ResyncFlag, Subsystem, SubsystemContext, SubsystemDescriptor, SyncerSet, VirtualSubsystem,
    VirtualSubsystemBuilder, VIRTUAL_SUBSYSTEM_TYPE,
};
pub use system::{LoadReport, SystemClass};

/// Re-exports commonly used types.
pub mod prelude {
    // Configuration
    pub use crate::config::{env_vars, PluginLocation, SystemConfig};

    // Error handling
    pub use crate::error::{ConfigError, ErrorLog, InfoLog, LoadError, Result};

    // Plugin authoring
    pub use crate::log::{LogSink, Logger};
    pub use crate::registry::{BuilderRegistry, SubsystemBuilder};
    pub use crate::subsystem::{
        ResyncFlag, Subsystem, SubsystemContext, SubsystemDescriptor, SyncerSet,
    };

    // Composition
    pub use crate::system::{LoadReport, SystemClass};
}
