//! Error types for the simulator
//!
//! Only failures that abort a run are errors. Problems the evaluator can step
//! over are [`Diagnostic`](crate::diagnostic::Diagnostic)s attached to the run.

use serde::Serialize;
use thiserror::Error;

/// Source location information for error messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Main error type for the simulator
#[derive(Debug, Error)]
pub enum SimError {
    #[error("SyntaxError: {message} at {location}")]
    SyntaxError {
        message: String,
        location: SourceLocation,
    },

    #[error("ConfigError: {message}")]
    Config { message: String },

    #[error("ConfigError: {0}")]
    ConfigFormat(#[from] serde_json::Error),
}

impl SimError {
    pub fn syntax_error(message: impl Into<String>, line: u32, column: u32) -> Self {
        SimError::SyntaxError {
            message: message.into(),
            location: SourceLocation { line, column },
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        SimError::Config {
            message: message.into(),
        }
    }

    /// Location of a syntax error, if this is one
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            SimError::SyntaxError { location, .. } => Some(location),
            SimError::Config { .. } | SimError::ConfigFormat(_) => None,
        }
    }
}
