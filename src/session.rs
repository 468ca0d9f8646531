//! Playback surface over a recorded run
//!
//! A [`Session`] holds the source text and, once run, the full trace. Commands
//! only move a cursor over the trace; nothing is re-evaluated while stepping.
//!
//! States: `Idle -> Running -> (Paused | Completed)`, and back to `Idle` on
//! [`Session::reset`].

use serde::Serialize;
use tracing::debug;

use crate::config::SimConfig;
use crate::diagnostic::Diagnostic;
use crate::error::SimError;
use crate::interpreter::{ConsoleLine, Run};
use crate::trace::{ExecutionStep, ExecutionTrace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No trace
    Idle,
    Running,
    Paused,
    /// Stepped past the last step
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    config: SimConfig,
    code: String,
    run: Option<Run>,
    step: usize,
    status: SessionStatus,
}

/// Serializable view of the session for a UI
#[derive(Debug, Clone, Serialize)]
pub struct SessionView<'a> {
    pub status: SessionStatus,
    pub running: bool,
    pub step: usize,
    pub total_steps: usize,
    pub current: Option<&'a ExecutionStep>,
    pub diagnostics: &'a [Diagnostic],
    pub console: &'a [ConsoleLine],
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        Self {
            config,
            code: String::new(),
            run: None,
            step: 0,
            status: SessionStatus::Idle,
        }
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Evaluate the stored code and start playback at step 0.
    ///
    /// On a parse or configuration error the session is left idle with no
    /// trace and the error is returned.
    pub fn run(&mut self) -> Result<&Run, SimError> {
        self.step = 0;
        match crate::simulate(&self.code, &self.config) {
            Ok(run) => {
                debug!(steps = run.trace.len(), "session running");
                self.status = SessionStatus::Running;
                let run: &Run = self.run.insert(run);
                Ok(run)
            }
            Err(err) => {
                self.run = None;
                self.status = SessionStatus::Idle;
                Err(err)
            }
        }
    }

    /// Advance one step. At the last step the session completes instead and
    /// the index stays put. Returns whether the index moved.
    pub fn step(&mut self) -> bool {
        let Some(run) = &self.run else {
            return false;
        };

        if self.step + 1 < run.trace.len() {
            self.step += 1;
            true
        } else {
            self.status = SessionStatus::Completed;
            false
        }
    }

    /// Stop playback, keeping the trace and the index
    pub fn pause(&mut self) {
        if self.status == SessionStatus::Running {
            self.status = SessionStatus::Paused;
        }
    }

    /// Discard the trace and the code; the result equals a fresh session
    pub fn reset(&mut self) {
        *self = Self::with_config(self.config.clone());
    }

    /// Jump to `index`, clamped to the trace. Returns the new index.
    pub fn seek(&mut self, index: usize) -> usize {
        if let Some(run) = &self.run {
            self.step = index.min(run.trace.len().saturating_sub(1));
        }
        self.step
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn step_index(&self) -> usize {
        self.step
    }

    pub fn current_step(&self) -> Option<&ExecutionStep> {
        self.run.as_ref().and_then(|run| run.trace.get(self.step))
    }

    pub fn last_run(&self) -> Option<&Run> {
        self.run.as_ref()
    }

    pub fn trace(&self) -> Option<&ExecutionTrace> {
        self.run.as_ref().map(|run| &run.trace)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.run
            .as_ref()
            .map(|run| run.diagnostics.as_slice())
            .unwrap_or_default()
    }

    pub fn console(&self) -> &[ConsoleLine] {
        self.run
            .as_ref()
            .map(|run| run.console.as_slice())
            .unwrap_or_default()
    }

    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            status: self.status,
            running: self.is_running(),
            step: self.step,
            total_steps: self.trace().map_or(0, ExecutionTrace::len),
            current: self.current_step(),
            diagnostics: self.diagnostics(),
            console: self.console(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
