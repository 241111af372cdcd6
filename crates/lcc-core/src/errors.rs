//! Structured error types shared across the LCC analysis crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`LccError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (paths, line numbers, field names).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the analysis pipeline.
///
/// Each family corresponds to one stage failure kind and maps to a distinct
/// process exit code through [`LccError::exit_code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum LccError {
    /// The input or configuration file could not be opened or read.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// A row had the wrong number of fields or a non-numeric value.
    #[error("format error: {0}")]
    Format(ErrorInfo),
    /// The input contained no records.
    #[error("degenerate input: {0}")]
    Degenerate(ErrorInfo),
    /// Run groups did not share a common length while uniformity was required.
    #[error("partition error: {0}")]
    Partition(ErrorInfo),
    /// Configuration could not be parsed or failed validation.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Statistical routine called with arguments outside its domain.
    #[error("stats error: {0}")]
    Stats(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl LccError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            LccError::Io(info)
            | LccError::Format(info)
            | LccError::Degenerate(info)
            | LccError::Partition(info)
            | LccError::Config(info)
            | LccError::Stats(info) => info,
        }
    }

    /// Process exit code reported by the command line front end.
    pub fn exit_code(&self) -> u8 {
        match self {
            LccError::Io(_) => 2,
            LccError::Format(_) => 3,
            LccError::Degenerate(_) => 4,
            LccError::Partition(_) => 5,
            LccError::Config(_) => 6,
            LccError::Stats(_) => 7,
        }
    }
}
