//! Propagation of the diagnostic (logging) context map.

use super::{CapturedContext, ContextWrapper};
use crate::context::{DiagnosticContext, DiagnosticMap, TeardownGuard};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// How a wrapper leaves the worker's slot once the inner work finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownMode {
    /// Empty the slot.
    ///
    /// Context the worker held before the install is lost.
    #[default]
    Clear,
    /// Put back whatever the worker held before the install.
    RestorePrevious,
}

/// Carries a copy of the submitting thread's [`DiagnosticContext`] to the worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticContextWrapper {
    mode: TeardownMode,
}

impl DiagnosticContextWrapper {
    /// Creates a wrapper that clears the worker's context on teardown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the teardown mode.
    #[must_use]
    pub fn with_mode(mut self, mode: TeardownMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the teardown mode.
    #[must_use]
    pub fn mode(&self) -> TeardownMode {
        self.mode
    }
}

impl ContextWrapper for DiagnosticContextWrapper {
    fn name(&self) -> &str {
        "diagnostic-context"
    }

    fn capture(&self) -> Box<dyn CapturedContext> {
        Box::new(DiagnosticCapture {
            map: DiagnosticContext::snapshot(),
            mode: self.mode,
        })
    }
}

struct DiagnosticCapture {
    map: DiagnosticMap,
    mode: TeardownMode,
}

impl CapturedContext for DiagnosticCapture {
    fn install(self: Box<Self>) -> TeardownGuard {
        let Self { map, mode } = *self;
        trace!(entries = map.len(), ?mode, "Installing diagnostic context");
        let previous = DiagnosticContext::replace(map);

        match mode {
            TeardownMode::Clear => TeardownGuard::new(DiagnosticContext::clear),
            TeardownMode::RestorePrevious => TeardownGuard::new(move || {
                DiagnosticContext::replace(previous);
            }),
        }
    }
}
