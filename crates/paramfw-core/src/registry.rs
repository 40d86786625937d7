//! Builder registry mapping subsystem type names to builders.
//!
//! Plugin factory entry points receive the registry and register one builder
//! per subsystem type they provide. The registry may also hold a fallback
//! builder, used for any type without an exact entry.

use std::collections::HashMap;
use std::fmt;

use crate::error::{LoadError, Result};
use crate::subsystem::{Subsystem, SubsystemContext};

/// Something able to construct a subsystem from its declaration.
pub trait SubsystemBuilder: Send + Sync {
    fn build(&self, context: &SubsystemContext<'_>) -> Box<dyn Subsystem>;
}

impl<F> SubsystemBuilder for F
where
    F: Fn(&SubsystemContext<'_>) -> Box<dyn Subsystem> + Send + Sync,
{
    fn build(&self, context: &SubsystemContext<'_>) -> Box<dyn Subsystem> {
        self(context)
    }
}

/// Table of subsystem builders keyed by type name.
#[derive(Default)]
pub struct BuilderRegistry {
    builders: HashMap<String, Box<dyn SubsystemBuilder>>,
    fallback: Option<Box<dyn SubsystemBuilder>>,
}

impl BuilderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry and the fallback.
    pub fn clear(&mut self) {
        self.builders.clear();
        self.fallback = None;
    }

    /// Insert or overwrite the builder for `type_name`.
    pub fn register_builder(
        &mut self,
        type_name: impl Into<String>,
        builder: Box<dyn SubsystemBuilder>,
    ) {
        let type_name = type_name.into();
        if self.builders.insert(type_name.clone(), builder).is_some() {
            tracing::debug!(subsystem_type = %type_name, "Subsystem builder replaced");
        } else {
            tracing::debug!(subsystem_type = %type_name, "Subsystem builder registered");
        }
    }

    /// Install the builder used for unregistered types.
    pub fn set_fallback_builder(&mut self, builder: Box<dyn SubsystemBuilder>) {
        self.fallback = Some(builder);
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// True if `type_name` has an exact entry.
    pub fn contains(&self, type_name: &str) -> bool {
        self.builders.contains_key(type_name)
    }

    /// True if building `type_name` would succeed.
    pub fn can_build(&self, type_name: &str) -> bool {
        self.contains(type_name) || self.has_fallback()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.builders.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Build a subsystem of `type_name`, using the fallback if needed.
    ///
    /// Crate-private: a subsystem built by a plugin builder runs plugin code,
    /// so only the owning [`SystemClass`](crate::system::SystemClass) may hold
    /// one. It releases subsystems before it closes modules.
    ///
    /// ```compile_fail
    /// use paramfw_core::prelude::*;
    /// use paramfw_core::TracingSink;
    ///
    /// let system = SystemClass::new();
    /// let descriptor = SubsystemDescriptor::new("v", "Virtual");
    /// let logger = Logger::new(&TracingSink);
    /// let context = SubsystemContext::new(&descriptor, "", &logger);
    /// let escaped = system.registry().build("Virtual", &context);
    /// ```
    pub(crate) fn build(
        &self,
        type_name: &str,
        context: &SubsystemContext<'_>,
    ) -> Result<Box<dyn Subsystem>> {
        let builder = self
            .builders
            .get(type_name)
            .or(self.fallback.as_ref())
            .ok_or_else(|| LoadError::UnknownType(type_name.to_string()))?;

        Ok(builder.build(context))
    }
}

impl fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderRegistry")
            .field("types", &self.type_names())
            .field("fallback", &self.has_fallback())
            .finish()
    }
}
