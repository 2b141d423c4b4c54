//! Structured per-candidate and per-device diagnostics
//!
//! Diagnostics replace propagating errors inside the scan. Each one is logged
//! through `tracing` when recorded and returned to the caller in the report.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Plugin works but uses a deprecated layout
    Warning,
    /// Plugin or device was dropped
    Error,
}

/// What went wrong
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Entry point came from the conventional `devices/index.js` location
    LegacyEntryPoint { path: PathBuf },
    /// Neither the declared nor the legacy entry point exists
    Unresolvable {
        declared: Option<PathBuf>,
        legacy: PathBuf,
    },
    /// Executing the entry point failed
    LoadFailed { path: PathBuf },
    /// Declared device is itself a list
    NestedSequence { value: String },
    /// Declared device has no callable `build`
    MissingBuild { value: String },
}

/// A warning or error attached to one candidate or device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Module the diagnostic belongs to
    pub module: String,
    /// Severity
    pub severity: Severity,
    /// Structured cause
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Record a warning and log it
    pub fn warning(module: &str, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        let diagnostic = Self {
            module: module.to_string(),
            severity: Severity::Warning,
            kind,
            message: message.into(),
        };
        tracing::warn!(module = %diagnostic.module, "{}", diagnostic.message);
        diagnostic
    }

    /// Record an error and log it
    pub fn error(module: &str, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        let diagnostic = Self {
            module: module.to_string(),
            severity: Severity::Error,
            kind,
            message: message.into(),
        };
        tracing::error!(module = %diagnostic.module, "{}", diagnostic.message);
        diagnostic
    }

    /// Whether this is a warning
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Whether this is an error
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{label} [{}]: {}", self.module, self.message)
    }
}
