//! Logging sink handed to plugins and subsystem builders.
//!
//! A plugin links its own copy of `tracing`, whose global dispatcher is not the
//! host's. Plugins therefore log through a [`Logger`], which dispatches through
//! a trait object whose code lives in the host.

use std::fmt;

/// Receiver of diagnostic events raised during loading.
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
}

/// Target used for events forwarded from plugins.
pub const PLUGIN_LOG_TARGET: &str = "paramfw::plugin";

/// Forwards plugin events to the host `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!(target: PLUGIN_LOG_TARGET, "{}", message);
    }

    fn warning(&self, message: &str) {
        tracing::warn!(target: PLUGIN_LOG_TARGET, "{}", message);
    }
}

/// Handle passed by reference across the plugin boundary.
///
/// `&Logger` is a thin pointer, unlike `&dyn LogSink`.
#[repr(C)]
pub struct Logger<'a> {
    sink: &'a dyn LogSink,
}

impl<'a> Logger<'a> {
    pub fn new(sink: &'a dyn LogSink) -> Self {
        Self { sink }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.sink.info(message.as_ref());
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.sink.warning(message.as_ref());
    }
}

impl fmt::Debug for Logger<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}
