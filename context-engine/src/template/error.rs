//! Template error taxonomy.
//!
//! Every failure in the template layer carries its kind, a snippet of the
//! offending template, the variable involved (if any), and when it happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum characters of template text kept for diagnostics.
const SNIPPET_CHARS: usize = 80;

/// High-level error kind for template failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateErrorKind {
    /// Structured template syntax is invalid.
    Parse,
    /// Structured render failed against valid syntax.
    Execute,
    /// Required fields are missing (informational).
    Validation,
    /// Event could not be normalized into template data.
    Build,
}

impl TemplateErrorKind {
    /// Whether the dual-strategy renderer may recover by falling back to
    /// literal substitution.
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::Parse | Self::Execute)
    }
}

impl std::fmt::Display for TemplateErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse => write!(f, "parse"),
            Self::Execute => write!(f, "execute"),
            Self::Validation => write!(f, "validation"),
            Self::Build => write!(f, "build"),
        }
    }
}

/// Template error with full context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateError {
    pub kind: TemplateErrorKind,
    /// Leading snippet of the template being processed.
    pub template: String,
    /// Offending variable or function name.
    pub variable: Option<String>,
    /// Human-readable cause.
    pub cause: String,
    pub timestamp: DateTime<Utc>,
}

impl TemplateError {
    pub fn new(kind: TemplateErrorKind, cause: impl Into<String>) -> Self {
        Self {
            kind,
            template: String::new(),
            variable: None,
            cause: cause.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn parse(cause: impl Into<String>) -> Self {
        Self::new(TemplateErrorKind::Parse, cause)
    }

    pub fn execute(cause: impl Into<String>) -> Self {
        Self::new(TemplateErrorKind::Execute, cause)
    }

    pub fn validation(cause: impl Into<String>) -> Self {
        Self::new(TemplateErrorKind::Validation, cause)
    }

    pub fn build(cause: impl Into<String>) -> Self {
        Self::new(TemplateErrorKind::Build, cause)
    }

    /// Attach the template text (clipped to a short snippet).
    pub fn with_template(mut self, template: &str) -> Self {
        self.template = template.chars().take(SNIPPET_CHARS).collect();
        self
    }

    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "template {} error: {}", self.kind, self.cause)?;
        if let Some(ref var) = self.variable {
            write!(f, " (variable: {var})")?;
        }
        if !self.template.is_empty() {
            write!(f, " in {:?}", self.template)?;
        }
        Ok(())
    }
}

impl std::error::Error for TemplateError {}

/// Result type alias for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;
