//! Simulator configuration

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Limits and output options for one simulation run.
///
/// Every field has a default, so a JSON document only needs the fields it
/// overrides: `{"max_steps": 500}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Hard cap on recorded steps. Reaching it truncates the run.
    pub max_steps: usize,
    /// Maximum number of nested user calls
    pub max_call_depth: usize,
    /// Forward `console.*` output to the console provider as well
    pub echo_console: bool,
}

impl SimConfig {
    pub const DEFAULT_MAX_STEPS: usize = 10_000;
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.max_steps == 0 {
            return Err(SimError::config_error("max_steps must be at least 1"));
        }
        if self.max_call_depth == 0 {
            return Err(SimError::config_error("max_call_depth must be at least 1"));
        }
        Ok(())
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn with_echo_console(mut self, echo_console: bool) -> Self {
        self.echo_console = echo_console;
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_steps: Self::DEFAULT_MAX_STEPS,
            max_call_depth: Self::DEFAULT_MAX_CALL_DEPTH,
            echo_console: false,
        }
    }
}
