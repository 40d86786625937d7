//! Subsystem capability and the built-in virtual subsystem.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::log::Logger;
use crate::registry::SubsystemBuilder;

/// Type name the virtual subsystem is registered under.
pub const VIRTUAL_SUBSYSTEM_TYPE: &str = "Virtual";

/// A pluggable backend giving parameter access for one hardware or domain area.
pub trait Subsystem: Send {
    /// Instance name, as declared in configuration.
    fn name(&self) -> &str;

    /// Type name the instance was built for.
    fn type_name(&self) -> &str;

    /// Query the resync flag, clearing it when `consume` is set.
    fn need_resync(&mut self, consume: bool) -> bool;

    /// Add this subsystem's syncers to `syncer_set`.
    fn fill_syncer_set(&self, syncer_set: &mut SyncerSet);
}

/// Declaration of one subsystem instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsystemDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl SubsystemDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Construction context handed to a builder.
///
/// Gives attribute lookup and path reporting for the element being built.
pub struct SubsystemContext<'a> {
    descriptor: &'a SubsystemDescriptor,
    parent_path: &'a str,
    logger: &'a Logger<'a>,
}

impl<'a> SubsystemContext<'a> {
    pub fn new(
        descriptor: &'a SubsystemDescriptor,
        parent_path: &'a str,
        logger: &'a Logger<'a>,
    ) -> Self {
        Self {
            descriptor,
            parent_path,
            logger,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn type_name(&self) -> &str {
        &self.descriptor.type_name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.descriptor.attributes.get(key).map(String::as_str)
    }

    /// Path of the element in the configurable tree, e.g. `/SystemClass/audio`.
    pub fn path(&self) -> String {
        format!("{}/{}", self.parent_path, self.descriptor.name)
    }

    pub fn logger(&self) -> &Logger<'a> {
        self.logger
    }
}

/// Syncers collected across subsystems for one resynchronization round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncerSet {
    syncers: BTreeSet<String>,
}

impl SyncerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the syncer was already present.
    pub fn insert(&mut self, syncer: impl Into<String>) -> bool {
        self.syncers.insert(syncer.into())
    }

    pub fn contains(&self, syncer: &str) -> bool {
        self.syncers.contains(syncer)
    }

    pub fn len(&self) -> usize {
        self.syncers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syncers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.syncers.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.syncers.clear();
    }
}

/// Query-and-clear resync state for subsystem implementations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResyncFlag {
    pending: bool,
}

impl ResyncFlag {
    /// Record that the subsystem's cached values went stale.
    pub fn raise(&mut self) {
        self.pending = true;
    }

    pub fn check(&mut self, consume: bool) -> bool {
        let pending = self.pending;
        if consume {
            self.pending = false;
        }
        pending
    }
}

/// Subsystem with no backing hardware.
#[derive(Debug)]
pub struct VirtualSubsystem {
    name: String,
    path: String,
    resync: ResyncFlag,
}

impl VirtualSubsystem {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            resync: ResyncFlag::default(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mark_for_resync(&mut self) {
        self.resync.raise();
    }
}

impl Subsystem for VirtualSubsystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &str {
        VIRTUAL_SUBSYSTEM_TYPE
    }

    fn need_resync(&mut self, consume: bool) -> bool {
        self.resync.check(consume)
    }

    fn fill_syncer_set(&self, syncer_set: &mut SyncerSet) {
        syncer_set.insert(self.path.clone());
    }
}

/// Builder for [`VirtualSubsystem`], needing no plugin.
#[derive(Debug, Default, Clone, Copy)]
pub struct VirtualSubsystemBuilder;

impl SubsystemBuilder for VirtualSubsystemBuilder {
    fn build(&self, context: &SubsystemContext<'_>) -> Box<dyn Subsystem> {
        if context.type_name() != VIRTUAL_SUBSYSTEM_TYPE {
            context.logger().info(format!(
                "Subsystem {} of type {} is built as virtual",
                context.name(),
                context.type_name()
            ));
        }
        Box::new(VirtualSubsystem::new(context.name(), context.path()))
    }
}
