use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// Severity of an advisory diagnostic. Diagnostics never abort a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    Debug,
    Warn,
}

impl DiagnosticLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticLevel::Debug => "debug",
            DiagnosticLevel::Warn => "warn",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    /// Package the message is attributable to, when there is one.
    pub package: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn warn(package: &str, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warn,
            package: Some(package.to_string()),
            message: message.into(),
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Debug,
            package: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package {
            Some(pkg) => write!(f, "[{}] {}: {}", self.level.as_str(), pkg, self.message),
            None => write!(f, "[{}] {}", self.level.as_str(), self.message),
        }
    }
}

/// Receives advisory messages.
pub trait DiagnosticsSink {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Drops every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiagnostics;

impl DiagnosticsSink for NullDiagnostics {
    fn emit(&self, _diagnostic: Diagnostic) {}
}

/// Resolves (never loads) a module specifier from a base directory.
pub trait PluginResolver {
    fn resolve(&self, specifier: &str, basedir: &Utf8Path) -> anyhow::Result<Utf8PathBuf>;
}
