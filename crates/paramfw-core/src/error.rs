//! Error types for subsystem plugin loading.

use std::fmt;

/// Errors raised while loading plugins or building subsystems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The shared module could not be mapped. Carries the loader's message.
    #[error("{reason}")]
    OpenFailure { path: String, reason: String },

    /// The module was mapped but does not export the expected factory symbol.
    #[error("Subsystem plugin {plugin} does not contain {symbol} symbol.")]
    SymbolNotFound { plugin: String, symbol: String },

    /// No builder registered for the type and no fallback installed.
    #[error("Unknown subsystem type: {0}")]
    UnknownType(String),

    /// A load pass made no progress while plugins remained.
    #[error("Unable to load the following plugins: {}.", .remaining.join(", "))]
    NoProgress { remaining: Vec<String> },

    /// Modules cannot be released while subsystems built from them are alive.
    #[error("{0} subsystem(s) still alive, release them before closing modules")]
    SubsystemsAlive(usize),
}

/// Result type for loading operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Ordered, append-only list of diagnostic messages.
///
/// Used both for load errors and for informational records produced by the
/// resync sweep. The caller receives it as a single joined report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog {
    entries: Vec<String>,
}

/// Informational records share the error log representation.
pub type InfoLog = ErrorLog;

/// Separator used when joining log entries into a report.
pub const REPORT_SEPARATOR: &str = "\n";

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message.
    pub fn push(&mut self, message: impl Into<String>) {
        self.entries.push(message.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any entry contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.contains(needle))
    }

    /// Join all entries into one report string.
    pub fn report(&self) -> String {
        self.entries.join(REPORT_SEPARATOR)
    }
}

impl fmt::Display for ErrorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report())
    }
}

impl Extend<String> for ErrorLog {
    fn extend<T: IntoIterator<Item = String>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}
