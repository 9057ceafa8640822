//! Recording doubles for context wrappers.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::context::TeardownGuard;
use crate::wrappers::{CapturedContext, ContextWrapper};

/// A shared, ordered log of calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns a copy of all entries in call order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns how many times `entry` was recorded.
    #[must_use]
    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// A wrapper that records `capture:`, `install:` and `teardown:` entries.
#[derive(Debug, Clone)]
pub struct RecordingWrapper {
    name: String,
    log: CallLog,
}

impl RecordingWrapper {
    /// Creates a recording wrapper writing to `log`.
    #[must_use]
    pub fn new(name: impl Into<String>, log: CallLog) -> Self {
        Self {
            name: name.into(),
            log,
        }
    }
}

impl ContextWrapper for RecordingWrapper {
    fn name(&self) -> &str {
        &self.name
    }

    fn capture(&self) -> Box<dyn CapturedContext> {
        self.log.record(format!("capture:{}", self.name));
        Box::new(RecordingCapture {
            name: self.name.clone(),
            log: self.log.clone(),
        })
    }
}

struct RecordingCapture {
    name: String,
    log: CallLog,
}

impl CapturedContext for RecordingCapture {
    fn install(self: Box<Self>) -> TeardownGuard {
        self.log.record(format!("install:{}", self.name));
        let Self { name, log } = *self;
        TeardownGuard::new(move || log.record(format!("teardown:{name}")))
    }
}

/// A wrapper that captures nothing and installs nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughWrapper;

impl ContextWrapper for PassThroughWrapper {
    fn name(&self) -> &str {
        "pass-through"
    }

    fn capture(&self) -> Box<dyn CapturedContext> {
        Box::new(NothingCaptured)
    }
}

struct NothingCaptured;

impl CapturedContext for NothingCaptured {
    fn install(self: Box<Self>) -> TeardownGuard {
        TeardownGuard::noop()
    }
}
